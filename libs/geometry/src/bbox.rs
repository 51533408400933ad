//! Axis-aligned bounding boxes.

use crate::{rect::Rect, union::BoundingUnion};

/// Geometry with an axis-aligned bounding box.
///
/// ```
/// # use geometry::prelude::*;
/// let rect = Rect::from_sides(0, 0, 100, 200);
/// assert_eq!(rect.bbox(), Some(rect));
/// assert_eq!(Rect::from_xy(50, 70).bbox(), Some(Rect::from_sides(50, 70, 50, 70)));
/// ```
pub trait Bbox {
    /// The smallest rectangle containing every point, or `None` if there are no points.
    ///
    /// Points and zero-area rectangles are not empty.
    fn bbox(&self) -> Option<Rect>;
}

impl<T: Bbox + ?Sized> Bbox for &T {
    fn bbox(&self) -> Option<Rect> {
        T::bbox(*self)
    }
}

impl<T: Bbox> Bbox for [T] {
    fn bbox(&self) -> Option<Rect> {
        self.iter()
            .fold(None, |acc, item| acc.bounding_union(&item.bbox()))
    }
}

impl<T: Bbox> Bbox for Vec<T> {
    fn bbox(&self) -> Option<Rect> {
        self.as_slice().bbox()
    }
}

impl Bbox for Option<Rect> {
    fn bbox(&self) -> Option<Rect> {
        *self
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn bbox_of_slices() {
        let v = vec![
            Rect::from_sides(0, 0, 100, 200),
            Rect::from_sides(-50, 20, 90, 250),
        ];
        assert_eq!(v.bbox(), Some(Rect::from_sides(-50, 0, 100, 250)));
        assert_eq!(Vec::<Rect>::new().bbox(), None);
    }

    #[test]
    fn bbox_skips_empty_items() {
        let triangle = Polygon::from_verts(vec![
            Point::new(-10, 25),
            Point::new(0, 16),
            Point::new(40, -20),
        ]);
        let items = [triangle, Polygon::default()];
        assert_eq!(items.bbox(), Some(Rect::from_sides(-10, -20, 40, 25)));
    }
}
