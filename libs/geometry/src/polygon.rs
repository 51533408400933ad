//! Integer coordinate polygons.
//!
//! Three polygon flavors share one representation:
//! [`Polygon90`] (edges parallel to the axes), [`Polygon45`] (edges at multiples of 45 degrees)
//! and the unrestricted [`Polygon`]. Constructors do not check the edge restrictions;
//! use [`is_manhattan`] and [`is_octilinear`] when the input is untrusted.
//!
//! The winding direction is derived from the signed area on first request and cached
//! until the vertices change.

use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::bbox::Bbox;
use crate::point::Point;
use crate::points::PointVec;
use crate::rect::Rect;
use crate::transform::{TransformMut, Transformation, TranslateMut};

/// The traversal direction of a polygon's vertices.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Winding {
    /// Vertices run clockwise; the signed area is negative.
    Clockwise,
    /// Vertices run counter-clockwise; the signed area is positive.
    CounterClockwise,
    /// The signed area is zero (degenerate or self-cancelling polygon).
    Unknown,
}

impl Winding {
    /// Classifies a signed area.
    pub fn from_signed_area(area: i128) -> Self {
        match area.signum() {
            1 => Self::CounterClockwise,
            -1 => Self::Clockwise,
            _ => Self::Unknown,
        }
    }
}

/// Twice the signed area enclosed by `points`, treating the sequence as closed.
///
/// ```
/// # use geometry::polygon::signed_area2;
/// # use geometry::prelude::*;
/// let square = [Point::new(0, 0), Point::new(2, 0), Point::new(2, 2), Point::new(0, 2)];
/// assert_eq!(signed_area2(&square), 8);
/// ```
pub fn signed_area2(points: &[Point]) -> i128 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x as i128 * b.y as i128 - b.x as i128 * a.y as i128
        })
        .sum()
}

fn closed_edges(points: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = points.len();
    (0..n).map(move |i| (points[i], points[(i + 1) % n]))
}

/// Returns `true` if every edge of the closed vertex loop is horizontal or vertical.
pub fn is_manhattan(points: &[Point]) -> bool {
    closed_edges(points).all(|(a, b)| a.x == b.x || a.y == b.y)
}

/// Returns `true` if every edge of the closed vertex loop is horizontal, vertical or diagonal.
pub fn is_octilinear(points: &[Point]) -> bool {
    closed_edges(points).all(|(a, b)| {
        let d = b - a;
        d.x == 0 || d.y == 0 || d.x.abs() == d.y.abs()
    })
}

fn points_bbox(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let (mut xl, mut yl, mut xh, mut yh) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        xl = xl.min(p.x);
        yl = yl.min(p.y);
        xh = xh.max(p.x);
        yh = yh.max(p.y);
    }
    Some(Rect::from_sides(xl, yl, xh, yh))
}

macro_rules! polygon_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, Serialize, Deserialize)]
        pub struct $name {
            points: PointVec,
            #[serde(skip)]
            winding: OnceLock<Winding>,
        }

        impl $name {
            /// Creates a polygon with given vertices.
            pub fn from_verts(verts: impl Into<PointVec>) -> Self {
                Self {
                    points: verts.into(),
                    winding: OnceLock::new(),
                }
            }

            /// Returns the vertices of the polygon.
            #[inline]
            pub fn points(&self) -> &[Point] {
                self.points.as_slice()
            }

            /// The number of vertices.
            #[inline]
            pub fn len(&self) -> usize {
                self.points.len()
            }

            /// Returns `true` if the polygon has no vertices.
            #[inline]
            pub fn is_empty(&self) -> bool {
                self.points.is_empty()
            }

            /// Appends a vertex.
            pub fn push(&mut self, p: Point) {
                self.points.push(p);
                self.invalidate();
            }

            /// Replaces all vertices.
            pub fn set_points(&mut self, verts: impl Into<PointVec>) {
                self.points = verts.into();
                self.invalidate();
            }

            /// Twice the signed area of the polygon.
            #[inline]
            pub fn signed_area2(&self) -> i128 {
                signed_area2(self.points())
            }

            /// The winding direction of the vertices.
            ///
            /// Computed from the signed area on first use and cached until the next mutation.
            pub fn winding(&self) -> Winding {
                *self
                    .winding
                    .get_or_init(|| Winding::from_signed_area(self.signed_area2()))
            }

            /// Returns `true` if the winding direction is currently cached.
            pub fn has_cached_winding(&self) -> bool {
                self.winding.get().is_some()
            }

            fn invalidate(&mut self) {
                self.winding = OnceLock::new();
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.points == other.points
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.points.hash(state);
            }
        }

        impl Bbox for $name {
            fn bbox(&self) -> Option<Rect> {
                points_bbox(self.points())
            }
        }

        impl TranslateMut for $name {
            fn translate_mut(&mut self, p: Point) {
                self.points.as_mut_slice().translate_mut(p);
                self.invalidate();
            }
        }

        impl TransformMut for $name {
            fn transform_mut(&mut self, trans: Transformation) {
                self.points.as_mut_slice().transform_mut(trans);
                self.invalidate();
            }
        }
    };
}

polygon_type! {
    /// A polygon whose edges are all horizontal or vertical.
    Polygon90
}

polygon_type! {
    /// A polygon whose edges are all at multiples of 45 degrees.
    Polygon45
}

polygon_type! {
    /// A polygon with arbitrary edges.
    Polygon
}

impl Polygon90 {
    /// Returns `true` if every edge is horizontal or vertical.
    pub fn is_manhattan(&self) -> bool {
        is_manhattan(self.points())
    }
}

impl Polygon45 {
    /// Returns `true` if every edge is at a multiple of 45 degrees.
    pub fn is_octilinear(&self) -> bool {
        is_octilinear(self.points())
    }
}

impl From<Rect> for Polygon90 {
    fn from(value: Rect) -> Self {
        Self::from_verts(value.corners())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::NamedOrientation;
    use crate::transform::Transform;

    fn triangle() -> Polygon {
        Polygon::from_verts(vec![
            Point::new(-10, 25),
            Point::new(0, 16),
            Point::new(40, -20),
        ])
    }

    #[test]
    fn bbox_works_for_polygon() {
        assert_eq!(triangle().bbox(), Some(Rect::from_sides(-10, -20, 40, 25)));
        assert_eq!(Polygon::default().bbox(), None);
    }

    #[test]
    fn winding_follows_signed_area() {
        let ccw = Polygon90::from(Rect::from_sides(0, 0, 4, 2));
        assert_eq!(ccw.signed_area2(), 16);
        assert_eq!(ccw.winding(), Winding::CounterClockwise);

        let cw = Polygon90::from_verts(ccw.points().iter().rev().copied().collect::<Vec<_>>());
        assert_eq!(cw.winding(), Winding::Clockwise);

        let line = Polygon::from_verts([Point::new(0, 0), Point::new(5, 5)]);
        assert_eq!(line.winding(), Winding::Unknown);
    }

    #[test]
    fn mutation_invalidates_cached_winding() {
        let mut poly = Polygon45::from_verts([Point::new(0, 0), Point::new(4, 0), Point::new(4, 4)]);
        assert!(!poly.has_cached_winding());
        assert_eq!(poly.winding(), Winding::CounterClockwise);
        assert!(poly.has_cached_winding());

        poly.push(Point::new(0, 0));
        assert!(!poly.has_cached_winding());
        assert_eq!(poly.winding(), Winding::CounterClockwise);

        let mirrored = poly.transform(Transformation::from(NamedOrientation::ReflectVert));
        assert!(!mirrored.has_cached_winding());
        assert_eq!(mirrored.winding(), Winding::Clockwise);
    }

    #[test]
    fn equality_ignores_cache() {
        let a = triangle();
        let b = triangle();
        let _ = a.winding();
        assert_eq!(a, b);
    }

    #[test]
    fn edge_predicates() {
        let l_shape = Polygon90::from_verts(vec![
            Point::new(0, 0),
            Point::new(20, 0),
            Point::new(20, 10),
            Point::new(10, 10),
            Point::new(10, 20),
            Point::new(0, 20),
        ]);
        assert!(l_shape.is_manhattan());

        let chamfer = Polygon45::from_verts(vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(20, 10),
            Point::new(0, 10),
        ]);
        assert!(chamfer.is_octilinear());
        assert!(!is_manhattan(chamfer.points()));
        assert!(!is_octilinear(triangle().points()));
    }
}
