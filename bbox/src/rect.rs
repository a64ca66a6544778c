use super::TLBR;
use crate::common::*;

/// The generic rectangle.
pub trait Rect {
    type Type;

    fn t(&self) -> Self::Type;
    fn l(&self) -> Self::Type;
    fn b(&self) -> Self::Type;
    fn r(&self) -> Self::Type;
    fn h(&self) -> Self::Type;
    fn w(&self) -> Self::Type;

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;

    fn try_from_tlhw(tlhw: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;
}

pub trait RectNum: Rect
where
    Self::Type: Num + PartialOrd,
{
    fn from_tlbr(tlbr: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        Self::try_from_tlbr(tlbr).unwrap()
    }

    fn from_tlhw(tlhw: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        Self::try_from_tlhw(tlhw).unwrap()
    }

    /// Corners in `[x0, y0, x1, y1]` order.
    fn xyxy(&self) -> [Self::Type; 4] {
        [self.l(), self.t(), self.r(), self.b()]
    }
}

pub trait RectFloat: RectNum
where
    Self::Type: Float,
{
    /// Clamp the rectangle into the `[0, h] x [0, w]` region.
    fn clip_to(&self, h: Self::Type, w: Self::Type) -> TLBR<Self::Type> {
        let zero = Self::Type::zero();
        let clamp = |val: Self::Type, max: Self::Type| val.max(zero).min(max);
        TLBR {
            t: clamp(self.t(), h),
            l: clamp(self.l(), w),
            b: clamp(self.b(), h),
            r: clamp(self.r(), w),
        }
    }

    /// Check if both sides are strictly longer than `threshold`.
    fn is_nonempty(&self, threshold: Self::Type) -> bool {
        self.h() > threshold && self.w() > threshold
    }
}

impl<T> RectNum for T
where
    T: Rect,
    T::Type: Num + PartialOrd,
{
}

impl<T> RectFloat for T
where
    T: Rect,
    T::Type: Float,
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_clip_and_nonempty() {
        let rect = TLBR::from_tlbr([-5.0, 2.0, 30.0, 12.0]);
        let clipped = rect.clip_to(20.0, 10.0);
        assert_eq!(clipped.xyxy(), [2.0, 0.0, 10.0, 20.0]);
        assert!(clipped.is_nonempty(1e-5));

        let flat = TLBR::from_tlbr([3.0, 3.0, 3.0, 9.0]);
        assert!(!flat.is_nonempty(0.0));
    }
}
