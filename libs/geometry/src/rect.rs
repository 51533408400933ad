//! Axis-aligned rectangles.

use serde::{Deserialize, Serialize};

use crate::bbox::Bbox;
use crate::point::Point;
use crate::transform::{TransformMut, Transformation, TranslateMut};

/// A closed axis-aligned box, stored as its lower-left and upper-right corners.
///
/// A rectangle is *valid* if `left <= right` and `bot <= top`, and *physical*
/// if both inequalities are strict. Only [`Rect::from_sides_raw`] and
/// [`Rect::expand`] can produce invalid rectangles.
#[derive(
    Debug, Default, Copy, Clone, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct Rect {
    p0: Point,
    p1: Point,
}

impl Rect {
    /// A zero-area rectangle at `(x, y)`.
    pub const fn from_xy(x: i64, y: i64) -> Self {
        let p = Point::new(x, y);
        Self { p0: p, p1: p }
    }

    /// Creates a rectangle from its left, bottom, right and top edges.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let rect = Rect::from_sides(15, 20, 30, 40);
    /// assert_eq!((rect.left(), rect.bot(), rect.right(), rect.top()), (15, 20, 30, 40));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `left > right` or `bot > top`. [`Rect::new`] sorts the coordinates instead.
    #[inline]
    pub fn from_sides(left: i64, bot: i64, right: i64, top: i64) -> Self {
        assert!(
            left <= right && bot <= top,
            "inverted rectangle: ({left}, {bot}, {right}, {top})"
        );
        Self::from_sides_raw(left, bot, right, top)
    }

    /// Creates a rectangle from its edges exactly as given.
    ///
    /// The result may be invalid; check it with [`Rect::is_valid`].
    #[inline]
    pub const fn from_sides_raw(left: i64, bot: i64, right: i64, top: i64) -> Self {
        Self {
            p0: Point::new(left, bot),
            p1: Point::new(right, top),
        }
    }

    /// Like [`Rect::from_sides`], but returns `None` for inverted edges.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// assert_eq!(Rect::from_sides_option(0, 0, 0, 5), Some(Rect::from_sides(0, 0, 0, 5)));
    /// assert_eq!(Rect::from_sides_option(10, 20, 0, 40), None);
    /// ```
    #[inline]
    pub fn from_sides_option(left: i64, bot: i64, right: i64, top: i64) -> Option<Self> {
        let rect = Self::from_sides_raw(left, bot, right, top);
        rect.is_valid().then_some(rect)
    }

    /// The rectangle spanned by two opposite corners, in either order.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let rect = Rect::new(Point::new(30, 20), Point::new(15, 40));
    /// assert_eq!(rect, Rect::from_sides(15, 20, 30, 40));
    /// ```
    #[inline]
    pub fn new(a: Point, b: Point) -> Self {
        Self::from_sides_raw(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    /// The bottom edge.
    #[inline]
    pub const fn bot(&self) -> i64 {
        self.p0.y
    }

    /// The top edge.
    #[inline]
    pub const fn top(&self) -> i64 {
        self.p1.y
    }

    /// The left edge.
    #[inline]
    pub const fn left(&self) -> i64 {
        self.p0.x
    }

    /// The right edge.
    #[inline]
    pub const fn right(&self) -> i64 {
        self.p1.x
    }

    /// `right - left`.
    #[inline]
    pub const fn width(&self) -> i64 {
        self.p1.x - self.p0.x
    }

    /// `top - bot`.
    #[inline]
    pub const fn height(&self) -> i64 {
        self.p1.y - self.p0.y
    }

    /// The lower-left corner.
    #[inline]
    pub const fn lower_left(&self) -> Point {
        self.p0
    }

    /// The upper-right corner.
    #[inline]
    pub const fn upper_right(&self) -> Point {
        self.p1
    }

    /// The corners counter-clockwise from the lower left.
    pub const fn corners(&self) -> [Point; 4] {
        [
            self.p0,
            Point::new(self.p1.x, self.p0.y),
            self.p1,
            Point::new(self.p0.x, self.p1.y),
        ]
    }

    /// Whether `left <= right` and `bot <= top`.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.p0.x <= self.p1.x && self.p0.y <= self.p1.y
    }

    /// Whether the rectangle has positive width and height.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// assert!(Rect::from_sides(0, 0, 1, 1).is_physical());
    /// assert!(!Rect::from_sides(0, 0, 0, 1).is_physical());
    /// ```
    #[inline]
    pub const fn is_physical(&self) -> bool {
        self.p0.x < self.p1.x && self.p0.y < self.p1.y
    }

    /// The smallest rectangle containing both rectangles.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let r1 = Rect::from_sides(0, 0, 100, 200);
    /// let r2 = Rect::from_sides(-50, 20, 120, 160);
    /// assert_eq!(r1.union(r2), Rect::from_sides(-50, 0, 120, 200));
    /// ```
    pub fn union(self, other: Self) -> Self {
        Self::from_sides_raw(
            self.p0.x.min(other.p0.x),
            self.p0.y.min(other.p0.y),
            self.p1.x.max(other.p1.x),
            self.p1.y.max(other.p1.y),
        )
    }

    /// The union of every `Some` rectangle, or `None` if there are none.
    pub fn union_all_option<T>(rects: impl Iterator<Item = T>) -> Option<Self>
    where
        T: Into<Option<Self>>,
    {
        rects
            .filter_map(Into::into)
            .reduce(|acc, r| acc.union(r))
    }

    /// The common part of both rectangles, or `None` if they are disjoint.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let r1 = Rect::from_sides(0, 0, 100, 200);
    /// assert_eq!(
    ///     r1.intersection(Rect::from_sides(-50, 20, 120, 160)),
    ///     Some(Rect::from_sides(0, 20, 100, 160)),
    /// );
    /// assert_eq!(r1.intersection(Rect::from_sides(120, -60, 240, 800)), None);
    /// ```
    pub fn intersection(self, other: Self) -> Option<Self> {
        Self::from_sides_option(
            self.p0.x.max(other.p0.x),
            self.p0.y.max(other.p0.y),
            self.p1.x.min(other.p1.x),
            self.p1.y.min(other.p1.y),
        )
    }

    /// Whether the rectangles share a point. Touching edges and corners count.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let r1 = Rect::from_sides(0, 0, 10, 10);
    /// assert!(r1.intersects(&Rect::from_sides(10, 10, 20, 20)));
    /// assert!(!r1.intersects(&Rect::from_sides(11, 0, 20, 10)));
    /// ```
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.p0.x <= other.p1.x
            && other.p0.x <= self.p1.x
            && self.p0.y <= other.p1.y
            && other.p0.y <= self.p1.y
    }

    /// Moves the left and right edges out by `dx` and the bottom and top edges out by `dy`.
    ///
    /// Negative amounts shrink the rectangle and may invert it.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let rect = Rect::from_sides(0, 0, 100, 200);
    /// assert_eq!(rect.expand(5, 10), Rect::from_sides(-5, -10, 105, 210));
    /// ```
    #[inline]
    pub const fn expand(&self, dx: i64, dy: i64) -> Self {
        Self::from_sides_raw(
            self.p0.x - dx,
            self.p0.y - dy,
            self.p1.x + dx,
            self.p1.y + dy,
        )
    }
}

impl Bbox for Rect {
    fn bbox(&self) -> Option<Rect> {
        Some(*self)
    }
}

impl TranslateMut for Rect {
    fn translate_mut(&mut self, p: Point) {
        self.p0 += p;
        self.p1 += p;
    }
}

impl TransformMut for Rect {
    fn transform_mut(&mut self, trans: Transformation) {
        let [a, b] = [self.p0, self.p1].map(|p| trans.mat * p + trans.b);
        *self = Self::new(a, b);
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn validity_predicates() {
        let line = Rect::from_sides(0, 0, 0, 10);
        assert!(line.is_valid());
        assert!(!line.is_physical());
        assert!(!Rect::from_sides_raw(5, 0, 4, 10).is_valid());
        assert!(!Rect::from_sides_raw(0, 5, 4, 4).is_valid());
        assert!(!Rect::from_sides(0, 0, 4, 4).expand(-3, 0).is_valid());
    }

    #[test]
    #[should_panic]
    fn from_sides_rejects_inverted_edges() {
        Rect::from_sides(5, 0, 4, 10);
    }

    #[test]
    fn transform_keeps_corners_sorted() {
        let rect = Rect::from_sides(0, 0, 100, 200);
        for orientation in NamedOrientation::all_rectangular() {
            let t = Transformation::from_offset_and_orientation(Point::new(7, -3), orientation);
            let out = rect.transform(t);
            assert!(out.is_valid());
            assert_eq!(out.width() * out.height(), 100 * 200);
        }
    }

    #[test]
    fn union_all_option_skips_none() {
        let rects = [
            Some(Rect::from_sides(10, 20, 30, 40)),
            None,
            Some(Rect::from_sides(-10, 25, 20, 35)),
        ];
        assert_eq!(
            Rect::union_all_option(rects.into_iter()),
            Some(Rect::from_sides(-10, 20, 30, 40))
        );
        assert_eq!(Rect::union_all_option(std::iter::empty::<Rect>()), None);
    }
}
