use crate::common::*;

/// Axis-aligned affine transform on the image plane.
///
/// A point `(y, x)` maps to `(y * sy + ty, x * sx + tx)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transform<T> {
    pub sy: T,
    pub sx: T,
    pub ty: T,
    pub tx: T,
}

impl<T> Transform<T>
where
    T: Copy + Num,
{
    pub fn identity() -> Self {
        Self {
            sy: T::one(),
            sx: T::one(),
            ty: T::zero(),
            tx: T::zero(),
        }
    }

    pub fn scale(sy: T, sx: T) -> Self {
        Self {
            sy,
            sx,
            ty: T::zero(),
            tx: T::zero(),
        }
    }

    pub fn translate(ty: T, tx: T) -> Self {
        Self {
            sy: T::one(),
            sx: T::one(),
            ty,
            tx,
        }
    }

    /// Mirror along the vertical axis of an image with width `width`.
    pub fn hflip(width: T) -> Self {
        Self {
            sy: T::one(),
            sx: T::zero() - T::one(),
            ty: T::zero(),
            tx: width,
        }
    }

    /// Mirror along the horizontal axis of an image with height `height`.
    pub fn vflip(height: T) -> Self {
        Self {
            sy: T::zero() - T::one(),
            sx: T::one(),
            ty: height,
            tx: T::zero(),
        }
    }

    pub fn apply_yx(&self, [y, x]: [T; 2]) -> [T; 2] {
        [y * self.sy + self.ty, x * self.sx + self.tx]
    }

    pub fn apply_xy(&self, [x, y]: [T; 2]) -> [T; 2] {
        [x * self.sx + self.tx, y * self.sy + self.ty]
    }
}

/// Composition. `&lhs * &rhs` applies `rhs` first.
impl<T> Mul<&Transform<T>> for &Transform<T>
where
    T: Copy + Num,
{
    type Output = Transform<T>;

    fn mul(self, rhs: &Transform<T>) -> Self::Output {
        Transform {
            sx: self.sx * rhs.sx,
            sy: self.sy * rhs.sy,
            tx: rhs.tx * self.sx + self.tx,
            ty: rhs.ty * self.sy + self.ty,
        }
    }
}
