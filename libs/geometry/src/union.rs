//! Bounding unions of geometric objects.

use crate::rect::Rect;

/// Trait for computing the smallest box enclosing two geometric objects.
pub trait BoundingUnion<T: ?Sized> {
    /// The type of the enclosing box.
    type Output;
    /// Computes the bounding union of this object with `other`.
    fn bounding_union(&self, other: &T) -> Self::Output;
}

impl BoundingUnion<Rect> for Rect {
    type Output = Rect;
    fn bounding_union(&self, other: &Rect) -> Self::Output {
        self.union(*other)
    }
}

impl BoundingUnion<Rect> for Option<Rect> {
    type Output = Rect;
    fn bounding_union(&self, other: &Rect) -> Self::Output {
        match self {
            Some(r) => r.union(*other),
            None => *other,
        }
    }
}

impl BoundingUnion<Option<Rect>> for Option<Rect> {
    type Output = Option<Rect>;
    fn bounding_union(&self, other: &Option<Rect>) -> Self::Output {
        match (self, other) {
            (Some(a), Some(b)) => Some(a.union(*b)),
            (Some(r), None) | (None, Some(r)) => Some(*r),
            (None, None) => None,
        }
    }
}
