//! Vertex storage with a small inline buffer.
//!
//! Most layout polygons have four vertices, so [`PointVec`] keeps up to
//! [`INLINE_CAPACITY`] points inline and only allocates once a polygon grows past that.

use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::point::Point;

/// The number of points stored without a heap allocation.
pub const INLINE_CAPACITY: usize = 4;

/// An ordered sequence of points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<Point>", into = "Vec<Point>")]
pub enum PointVec {
    /// Up to [`INLINE_CAPACITY`] points stored in place.
    ///
    /// Only the first `len` entries of `buf` are meaningful.
    Inline {
        /// The number of occupied slots.
        len: u8,
        /// The backing buffer.
        buf: [Point; INLINE_CAPACITY],
    },
    /// Points stored on the heap.
    Heap(Vec<Point>),
}

impl Default for PointVec {
    fn default() -> Self {
        Self::new()
    }
}

impl PointVec {
    /// Creates an empty point sequence.
    pub const fn new() -> Self {
        Self::Inline {
            len: 0,
            buf: [Point::zero(); INLINE_CAPACITY],
        }
    }

    /// Returns `true` if the points live on the heap.
    pub fn spilled(&self) -> bool {
        matches!(self, Self::Heap(_))
    }

    /// Appends a point, moving the storage to the heap if the inline buffer is full.
    pub fn push(&mut self, p: Point) {
        match self {
            Self::Inline { len, buf } => {
                let n = *len as usize;
                if n < INLINE_CAPACITY {
                    buf[n] = p;
                    *len += 1;
                } else {
                    let mut v = Vec::with_capacity(INLINE_CAPACITY * 2);
                    v.extend_from_slice(&buf[..n]);
                    v.push(p);
                    *self = Self::Heap(v);
                }
            }
            Self::Heap(v) => v.push(p),
        }
    }

    /// Returns the points as a slice.
    pub fn as_slice(&self) -> &[Point] {
        match self {
            Self::Inline { len, buf } => &buf[..*len as usize],
            Self::Heap(v) => v,
        }
    }

    /// Returns the points as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [Point] {
        match self {
            Self::Inline { len, buf } => &mut buf[..*len as usize],
            Self::Heap(v) => v,
        }
    }

    /// Consumes the sequence, returning a vector of its points.
    pub fn into_vec(self) -> Vec<Point> {
        match self {
            Self::Inline { len, buf } => buf[..len as usize].to_vec(),
            Self::Heap(v) => v,
        }
    }
}

impl Deref for PointVec {
    type Target = [Point];
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl DerefMut for PointVec {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl PartialEq for PointVec {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for PointVec {}

impl Hash for PointVec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl From<Vec<Point>> for PointVec {
    fn from(value: Vec<Point>) -> Self {
        if value.len() <= INLINE_CAPACITY {
            value.into_iter().collect()
        } else {
            Self::Heap(value)
        }
    }
}

impl From<&[Point]> for PointVec {
    fn from(value: &[Point]) -> Self {
        value.iter().copied().collect()
    }
}

impl<const N: usize> From<[Point; N]> for PointVec {
    fn from(value: [Point; N]) -> Self {
        value.into_iter().collect()
    }
}

impl From<PointVec> for Vec<Point> {
    fn from(value: PointVec) -> Self {
        value.into_vec()
    }
}

impl FromIterator<Point> for PointVec {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        let mut out = Self::new();
        for p in iter {
            out.push(p);
        }
        out
    }
}

impl<'a> IntoIterator for &'a PointVec {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;
    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_inline_up_to_capacity() {
        let mut pts = PointVec::new();
        for i in 0..INLINE_CAPACITY as i64 {
            pts.push(Point::new(i, -i));
        }
        assert!(!pts.spilled());
        assert_eq!(pts.len(), INLINE_CAPACITY);
        assert_eq!(pts[3], Point::new(3, -3));
    }

    #[test]
    fn spills_to_heap_and_preserves_order() {
        let pts: PointVec = (0..7).map(|i| Point::new(i, 2 * i)).collect();
        assert!(pts.spilled());
        assert_eq!(
            pts.into_vec(),
            (0..7).map(|i| Point::new(i, 2 * i)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn equality_ignores_representation() {
        let inline = PointVec::from([Point::new(1, 2), Point::new(3, 4)]);
        let heap = PointVec::Heap(vec![Point::new(1, 2), Point::new(3, 4)]);
        assert_eq!(inline, heap);
    }
}
