//! Transformation types and traits.

use serde::{Deserialize, Serialize};

use super::orientation::Orientation;
use crate::point::Point;

/// A Manhattan placement: an [`Orientation`] followed by a translation.
///
/// Applying a transformation to a point `p` yields `mat * p + b`. There is no scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transformation {
    pub(crate) mat: TransformationMatrix,
    pub(crate) b: Point,
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

/// A Manhattan rotation: 0, 90, 180, or 270 degrees counterclockwise.
#[derive(
    Debug, Clone, Copy, Default, Eq, Hash, Ord, PartialOrd, PartialEq, Serialize, Deserialize,
)]
pub enum Rotation {
    /// 0 degrees; no rotation.
    #[default]
    R0,
    /// 90 degrees counterclockwise.
    R90,
    /// 180 degrees counterclockwise.
    R180,
    /// 270 degrees counterclockwise.
    R270,
}

impl Rotation {
    /// The number of counterclockwise quarter turns.
    const fn quarter_turns(self) -> u8 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 1,
            Rotation::R180 => 2,
            Rotation::R270 => 3,
        }
    }

    const fn from_quarter_turns(turns: u8) -> Self {
        match turns % 4 {
            0 => Rotation::R0,
            1 => Rotation::R90,
            2 => Rotation::R180,
            _ => Rotation::R270,
        }
    }

    /// The transformation matrix representing this rotation.
    #[inline]
    pub fn transformation_matrix(&self) -> TransformationMatrix {
        TransformationMatrix::from(*self)
    }

    /// The angle of this rotation, in degrees.
    pub fn degrees(&self) -> f64 {
        match self {
            Rotation::R0 => 0.,
            Rotation::R90 => 90.,
            Rotation::R180 => 180.,
            Rotation::R270 => 270.,
        }
    }
}

impl std::ops::Add<Rotation> for Rotation {
    type Output = Rotation;
    fn add(self, rhs: Rotation) -> Self::Output {
        Self::from_quarter_turns(self.quarter_turns() + rhs.quarter_turns())
    }
}

impl std::ops::AddAssign for Rotation {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub<Rotation> for Rotation {
    type Output = Rotation;
    fn sub(self, rhs: Rotation) -> Self::Output {
        Self::from_quarter_turns(self.quarter_turns() + 4 - rhs.quarter_turns())
    }
}

impl std::ops::SubAssign for Rotation {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

/// Indicates that an angle was not a valid Manhattan angle.
///
/// Manhattan angles (in degrees) are 0, 90, 180, 270,
/// or any equivalent angle modulo 360 degrees.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("angle {0} is not a multiple of 90 degrees")]
pub struct NonManhattanAngleError(pub f64);

impl TryFrom<f64> for Rotation {
    type Error = NonManhattanAngleError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let wrapped = ((value % 360.) + 360.) % 360.;
        let rounded = wrapped.round();
        if (wrapped - rounded).abs() > 1e-9 {
            return Err(NonManhattanAngleError(value));
        }
        match rounded as i64 {
            0 | 360 => Ok(Rotation::R0),
            90 => Ok(Rotation::R90),
            180 => Ok(Rotation::R180),
            270 => Ok(Rotation::R270),
            _ => Err(NonManhattanAngleError(value)),
        }
    }
}

/// An orthogonal 2x2 matrix with entries in `{-1, 0, 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformationMatrix([[i8; 2]; 2]);

impl TransformationMatrix {
    const REFLECT_VERT: Self = Self([[1, 0], [0, -1]]);

    /// The identity matrix.
    #[inline]
    pub fn identity() -> Self {
        Self([[1, 0], [0, 1]])
    }

    /// The matrix that reflects about the x-axis if requested, then rotates.
    pub fn from_orientation(orientation: Orientation) -> Self {
        let rotation = Self::from(orientation.angle());
        if orientation.reflect_vert() {
            rotation * Self::REFLECT_VERT
        } else {
            rotation
        }
    }

    /// The inverse, which is the transpose.
    pub fn inverse(&self) -> Self {
        let [[a, b], [c, d]] = self.0;
        Self([[a, c], [b, d]])
    }

    /// `-1` if the matrix reflects, `1` otherwise.
    pub fn det(&self) -> i8 {
        let [[a, b], [c, d]] = self.0;
        a * d - b * c
    }

    /// The entry at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> i8 {
        self.0[row][col]
    }
}

impl Default for TransformationMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Rotation> for TransformationMatrix {
    fn from(value: Rotation) -> Self {
        Self(match value {
            Rotation::R0 => [[1, 0], [0, 1]],
            Rotation::R90 => [[0, -1], [1, 0]],
            Rotation::R180 => [[-1, 0], [0, -1]],
            Rotation::R270 => [[0, 1], [-1, 0]],
        })
    }
}

impl std::ops::Mul for TransformationMatrix {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let (a, b) = (self.0, rhs.0);
        Self(std::array::from_fn(|i| {
            std::array::from_fn(|j| a[i][0] * b[0][j] + a[i][1] * b[1][j])
        }))
    }
}

impl std::ops::Mul<Point> for TransformationMatrix {
    type Output = Point;
    fn mul(self, p: Point) -> Point {
        let [[a, b], [c, d]] = self.0.map(|row| row.map(i64::from));
        Point::new(a * p.x + b * p.y, c * p.x + d * p.y)
    }
}

impl Transformation {
    /// The transformation that leaves geometry unchanged.
    pub fn identity() -> Self {
        Self::from_offset(Point::zero())
    }

    /// A translation by `(x, y)`.
    pub fn translate(x: i64, y: i64) -> Self {
        Self::from_offset(Point::new(x, y))
    }

    /// A counter-clockwise rotation about the origin.
    pub fn rotate(angle: Rotation) -> Self {
        Self {
            mat: angle.into(),
            b: Point::zero(),
        }
    }

    /// A reflection about the x-axis.
    pub fn reflect_vert() -> Self {
        Self {
            mat: TransformationMatrix::REFLECT_VERT,
            b: Point::zero(),
        }
    }

    /// A translation by `offset`.
    pub fn from_offset(offset: Point) -> Self {
        Self {
            mat: TransformationMatrix::identity(),
            b: offset,
        }
    }

    /// Orients geometry about the origin, then moves the origin to `offset`.
    pub fn from_offset_and_orientation(offset: Point, orientation: impl Into<Orientation>) -> Self {
        Self {
            mat: TransformationMatrix::from_orientation(orientation.into()),
            b: offset,
        }
    }

    /// The transformation that applies `child`, then `parent`.
    ///
    /// In an instance hierarchy, `parent` places a cell whose instance is placed by `child`.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let t = Transformation::cascade(
    ///     Transformation::translate(1, 1),
    ///     Transformation::reflect_vert(),
    /// );
    /// assert_eq!(Point::new(1, 1).transform(t), Point::new(2, 0));
    /// ```
    pub fn cascade(parent: Transformation, child: Transformation) -> Transformation {
        Self {
            mat: parent.mat * child.mat,
            b: parent.mat * child.b + parent.b,
        }
    }

    /// The translation, which is where the origin lands.
    pub fn offset_point(&self) -> Point {
        self.b
    }

    /// The rotation and reflection part.
    pub fn matrix(&self) -> TransformationMatrix {
        self.mat
    }

    /// Whether x and y extents are exchanged, as for quarter-turn rotations.
    pub fn swaps_axes(&self) -> bool {
        self.mat.get(0, 0) == 0
    }

    /// Whether this transformation leaves geometry unchanged.
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// The rotation and reflection part as an [`Orientation`].
    pub fn orientation(&self) -> Orientation {
        // Reflection only negates the second column; the first holds (cos, sin).
        let angle = match (self.mat.get(0, 0), self.mat.get(1, 0)) {
            (0, 1) => Rotation::R90,
            (-1, 0) => Rotation::R180,
            (0, -1) => Rotation::R270,
            _ => Rotation::R0,
        };
        Orientation::from_reflect_and_angle(self.mat.det() < 0, angle)
    }

    /// The transformation that undoes `self`.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let t = Transformation::from_offset_and_orientation(Point::new(5, 10), NamedOrientation::R90);
    /// assert!(Transformation::cascade(t.inv(), t).is_identity());
    /// ```
    pub fn inv(&self) -> Transformation {
        let mat = self.mat.inverse();
        Self { mat, b: -(mat * self.b) }
    }
}

impl<T> From<T> for Transformation
where
    T: Into<Orientation>,
{
    fn from(value: T) -> Self {
        Self::from_offset_and_orientation(Point::zero(), value)
    }
}

/// Geometry that can be moved by a [`Transformation`] in place.
pub trait TransformMut {
    /// Applies `trans` in place.
    fn transform_mut(&mut self, trans: Transformation);
}

impl<T: TransformMut> TransformMut for [T] {
    fn transform_mut(&mut self, trans: Transformation) {
        self.iter_mut().for_each(|x| x.transform_mut(trans));
    }
}

impl<T: TransformMut> TransformMut for Vec<T> {
    fn transform_mut(&mut self, trans: Transformation) {
        self.as_mut_slice().transform_mut(trans);
    }
}

/// By-value counterpart of [`TransformMut`].
pub trait Transform: TransformMut + Sized {
    /// Returns a copy moved by `trans`.
    #[inline]
    fn transform(mut self, trans: Transformation) -> Self {
        self.transform_mut(trans);
        self
    }
}

impl<T: TransformMut + Sized> Transform for T {}

/// Geometry that can be moved by an offset in place.
pub trait TranslateMut {
    /// Moves by `p` in place.
    fn translate_mut(&mut self, p: Point);
}

impl<T: TranslateMut> TranslateMut for [T] {
    fn translate_mut(&mut self, p: Point) {
        self.iter_mut().for_each(|x| x.translate_mut(p));
    }
}

impl<T: TranslateMut> TranslateMut for Vec<T> {
    fn translate_mut(&mut self, p: Point) {
        self.as_mut_slice().translate_mut(p);
    }
}

/// By-value counterpart of [`TranslateMut`].
pub trait Translate: TranslateMut + Sized {
    /// Returns a copy moved by `p`.
    #[inline]
    fn translate(mut self, p: Point) -> Self {
        self.translate_mut(p);
        self
    }
}

impl<T: TranslateMut + Sized> Translate for T {}
