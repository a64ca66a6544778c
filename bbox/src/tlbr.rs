use super::Rect;
use crate::{common::*, Transform};

/// Bounding box in TLBR format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TLBR<T> {
    pub(crate) t: T,
    pub(crate) l: T,
    pub(crate) b: T,
    pub(crate) r: T,
}

impl<T> TLBR<T>
where
    T: Copy + Num + PartialOrd,
{
    /// Build from corners in `[x0, y0, x1, y1]` order.
    pub fn try_from_xyxy(xyxy: [T; 4]) -> Result<Self> {
        let [x0, y0, x1, y1] = xyxy;
        Self::try_from_tlbr([y0, x0, y1, x1])
    }

    /// The tightest box enclosing a set of `[x, y]` points.
    ///
    /// It returns `None` if `points` is empty.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = [T; 2]>,
    {
        let mut points = points.into_iter();
        let [x, y] = points.next()?;
        let init = Self {
            t: y,
            l: x,
            b: y,
            r: x,
        };

        let rect = points.fold(init, |rect, [x, y]| Self {
            t: partial_min(rect.t, y),
            l: partial_min(rect.l, x),
            b: partial_max(rect.b, y),
            r: partial_max(rect.r, x),
        });
        Some(rect)
    }

    /// Apply the transform on the four corners and take the enclosing box.
    ///
    /// The result stays well-formed under negative scaling, e.g., flipping.
    pub fn transform(&self, transform: &Transform<T>) -> Self {
        let [t, l] = transform.apply_yx([self.t, self.l]);
        let [b, r] = transform.apply_yx([self.b, self.r]);
        Self {
            t: partial_min(t, b),
            l: partial_min(l, r),
            b: partial_max(t, b),
            r: partial_max(l, r),
        }
    }
}

impl<T> Rect for TLBR<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn t(&self) -> Self::Type {
        self.t
    }

    fn l(&self) -> Self::Type {
        self.l
    }

    fn b(&self) -> Self::Type {
        self.b
    }

    fn r(&self) -> Self::Type {
        self.r
    }

    fn h(&self) -> Self::Type {
        self.b - self.t
    }

    fn w(&self) -> Self::Type {
        self.r - self.l
    }

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self> {
        let [t, l, b, r] = tlbr;
        ensure!(b >= t && r >= l, "b >= t and r >= l must hold");

        Ok(Self { t, l, b, r })
    }

    fn try_from_tlhw(tlhw: [Self::Type; 4]) -> Result<Self> {
        let [t, l, h, w] = tlhw;
        let b = t + h;
        let r = l + w;
        Self::try_from_tlbr([t, l, b, r])
    }
}

fn partial_min<T: PartialOrd>(lhs: T, rhs: T) -> T {
    if rhs < lhs {
        rhs
    } else {
        lhs
    }
}

fn partial_max<T: PartialOrd>(lhs: T, rhs: T) -> T {
    if rhs > lhs {
        rhs
    } else {
        lhs
    }
}
