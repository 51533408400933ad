//! Integer points.

use std::ops::{Add, AddAssign, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::transform::{TransformMut, Transformation, TranslateMut};

/// A location in database units.
///
/// Points order lexicographically by `x`, then `y`.
#[derive(
    Debug, Copy, Clone, Default, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: i64,
    /// Vertical coordinate.
    pub y: i64,
}

impl Point {
    /// Creates a point at `(x, y)`.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The origin.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// assert_eq!(Point::zero(), Point::new(0, 0));
    /// ```
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    /// Multiplies both coordinates by `k`.
    #[inline]
    pub const fn scale(&self, k: i64) -> Self {
        Self::new(self.x * k, self.y * k)
    }
}

impl TranslateMut for Point {
    fn translate_mut(&mut self, p: Point) {
        *self += p;
    }
}

impl TransformMut for Point {
    fn transform_mut(&mut self, trans: Transformation) {
        *self = trans.mat * *self + trans.b;
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn arithmetic() {
        let a = Point::new(3, -4);
        let b = Point::new(-1, 2);
        assert_eq!(a + b, Point::new(2, -2));
        assert_eq!(a - b, Point::new(4, -6));
        assert_eq!(-a, Point::new(-3, 4));
        assert_eq!(b.scale(3), Point::new(-3, 6));
        assert_eq!(a.translate(b), a + b);
    }

    #[test]
    fn ordering_is_x_major() {
        let mut pts = vec![Point::new(1, 0), Point::new(0, 5), Point::new(0, -5)];
        pts.sort();
        assert_eq!(
            pts,
            vec![Point::new(0, -5), Point::new(0, 5), Point::new(1, 0)]
        );
    }
}
