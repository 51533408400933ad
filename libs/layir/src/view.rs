//! Borrowed, non-materializing views over a layer's shape sets.
//!
//! Each view type composes the sets at or below its complexity.
//! Iteration always yields rectangles, then Manhattan polygons,
//! then 45-degree polygons, then general polygons.

use std::iter::FusedIterator;

use geometry::prelude::*;

use crate::layer::GeometryMode;

/// A borrowed shape produced by a view.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShapeRef<'a> {
    /// A rectangle.
    Rect(&'a Rect),
    /// A Manhattan polygon.
    Polygon90(&'a Polygon90),
    /// A 45-degree polygon.
    Polygon45(&'a Polygon45),
    /// A general polygon.
    Polygon(&'a Polygon),
}

impl ShapeRef<'_> {
    /// Clones the referenced shape.
    pub fn to_shape(self) -> Shape {
        match self {
            ShapeRef::Rect(r) => Shape::Rect(*r),
            ShapeRef::Polygon90(p) => Shape::Polygon90(p.clone()),
            ShapeRef::Polygon45(p) => Shape::Polygon45(p.clone()),
            ShapeRef::Polygon(p) => Shape::Polygon(p.clone()),
        }
    }

    /// The vertices of the shape's outline.
    pub fn vertices(self) -> Vec<Point> {
        match self {
            ShapeRef::Rect(r) => r.corners().to_vec(),
            ShapeRef::Polygon90(p) => p.points().to_vec(),
            ShapeRef::Polygon45(p) => p.points().to_vec(),
            ShapeRef::Polygon(p) => p.points().to_vec(),
        }
    }
}

impl Bbox for ShapeRef<'_> {
    fn bbox(&self) -> Option<Rect> {
        match self {
            ShapeRef::Rect(r) => r.bbox(),
            ShapeRef::Polygon90(p) => p.bbox(),
            ShapeRef::Polygon45(p) => p.bbox(),
            ShapeRef::Polygon(p) => p.bbox(),
        }
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct ShapeSets<'a> {
    pub(crate) rects: &'a [Rect],
    pub(crate) poly90s: &'a [Polygon90],
    pub(crate) poly45s: &'a [Polygon45],
    pub(crate) polys: &'a [Polygon],
}

impl<'a> ShapeSets<'a> {
    /// Restricts the sets to those representable at `mode`.
    fn up_to(self, mode: GeometryMode) -> Self {
        Self {
            rects: self.rects,
            poly90s: if mode >= GeometryMode::Polygon90 {
                self.poly90s
            } else {
                &[]
            },
            poly45s: if mode >= GeometryMode::Polygon45 {
                self.poly45s
            } else {
                &[]
            },
            polys: if mode >= GeometryMode::Polygon {
                self.polys
            } else {
                &[]
            },
        }
    }

    fn iter(self) -> ViewIter<'a> {
        ViewIter {
            rects: self.rects.iter(),
            poly90s: self.poly90s.iter(),
            poly45s: self.poly45s.iter(),
            polys: self.polys.iter(),
        }
    }
}

/// Iterates over the shapes of a view in set order.
#[derive(Debug, Clone)]
pub struct ViewIter<'a> {
    rects: std::slice::Iter<'a, Rect>,
    poly90s: std::slice::Iter<'a, Polygon90>,
    poly45s: std::slice::Iter<'a, Polygon45>,
    polys: std::slice::Iter<'a, Polygon>,
}

impl<'a> Iterator for ViewIter<'a> {
    type Item = ShapeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rects
            .next()
            .map(ShapeRef::Rect)
            .or_else(|| self.poly90s.next().map(ShapeRef::Polygon90))
            .or_else(|| self.poly45s.next().map(ShapeRef::Polygon45))
            .or_else(|| self.polys.next().map(ShapeRef::Polygon))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.len();
        (n, Some(n))
    }
}

impl ExactSizeIterator for ViewIter<'_> {
    fn len(&self) -> usize {
        self.rects.len() + self.poly90s.len() + self.poly45s.len() + self.polys.len()
    }
}

impl FusedIterator for ViewIter<'_> {}

macro_rules! shape_view {
    ($(#[$meta:meta])* $name:ident, $mode:expr) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Default)]
        pub struct $name<'a>(pub(crate) ShapeSets<'a>);

        impl<'a> $name<'a> {
            /// The mode this view represents.
            pub const MODE: GeometryMode = $mode;

            /// Iterates over the shapes in set order.
            pub fn iter(&self) -> ViewIter<'a> {
                self.0.up_to(Self::MODE).iter()
            }

            /// The number of shapes in the view.
            pub fn len(&self) -> usize {
                self.iter().len()
            }

            /// Returns `true` if the view contains no shapes.
            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// The bounding box of every shape, or a zero rectangle at the origin if empty.
            pub fn extents(&self) -> Rect {
                self.bbox().unwrap_or_default()
            }
        }

        impl Bbox for $name<'_> {
            fn bbox(&self) -> Option<Rect> {
                Rect::union_all_option(self.iter().map(|s| s.bbox()))
            }
        }

        impl<'a> IntoIterator for $name<'a> {
            type Item = ShapeRef<'a>;
            type IntoIter = ViewIter<'a>;
            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }
    };
}

shape_view! {
    /// A view of a layer's rectangles.
    RectangleView, GeometryMode::Rect
}

shape_view! {
    /// A view of a layer's rectangles and Manhattan polygons.
    Polygon90View, GeometryMode::Polygon90
}

shape_view! {
    /// A view of a layer's rectangles, Manhattan polygons and 45-degree polygons.
    Polygon45View, GeometryMode::Polygon45
}

shape_view! {
    /// A view of every shape on a layer.
    PolygonView, GeometryMode::Polygon
}

impl<'a> From<RectangleView<'a>> for Polygon90View<'a> {
    fn from(value: RectangleView<'a>) -> Self {
        Self(value.0.up_to(RectangleView::MODE))
    }
}

impl<'a> From<Polygon90View<'a>> for Polygon45View<'a> {
    fn from(value: Polygon90View<'a>) -> Self {
        Self(value.0.up_to(Polygon90View::MODE))
    }
}

impl<'a> From<Polygon45View<'a>> for PolygonView<'a> {
    fn from(value: Polygon45View<'a>) -> Self {
        Self(value.0.up_to(Polygon45View::MODE))
    }
}

/// The view of a layer, selected by the layer's mode.
#[derive(Debug, Copy, Clone)]
pub enum UnionView<'a> {
    /// Rectangles only.
    Rectangle(RectangleView<'a>),
    /// Rectangles and Manhattan polygons.
    Polygon90(Polygon90View<'a>),
    /// Rectangles, Manhattan and 45-degree polygons.
    Polygon45(Polygon45View<'a>),
    /// Every shape class.
    Polygon(PolygonView<'a>),
}

impl<'a> UnionView<'a> {
    /// The mode of the selected view.
    pub fn mode(&self) -> GeometryMode {
        match self {
            UnionView::Rectangle(_) => RectangleView::MODE,
            UnionView::Polygon90(_) => Polygon90View::MODE,
            UnionView::Polygon45(_) => Polygon45View::MODE,
            UnionView::Polygon(_) => PolygonView::MODE,
        }
    }

    /// Iterates over the shapes in set order.
    pub fn iter(&self) -> ViewIter<'a> {
        match self {
            UnionView::Rectangle(v) => v.iter(),
            UnionView::Polygon90(v) => v.iter(),
            UnionView::Polygon45(v) => v.iter(),
            UnionView::Polygon(v) => v.iter(),
        }
    }

    /// The number of shapes in the view.
    pub fn len(&self) -> usize {
        self.iter().len()
    }

    /// Returns `true` if the view contains no shapes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The bounding box of every shape, or a zero rectangle at the origin if empty.
    pub fn extents(&self) -> Rect {
        self.bbox().unwrap_or_default()
    }

    /// Widens the view to cover every shape class.
    pub fn into_polygon_view(self) -> PolygonView<'a> {
        match self {
            UnionView::Rectangle(v) => Polygon45View::from(Polygon90View::from(v)).into(),
            UnionView::Polygon90(v) => Polygon45View::from(v).into(),
            UnionView::Polygon45(v) => v.into(),
            UnionView::Polygon(v) => v,
        }
    }
}

impl Bbox for UnionView<'_> {
    fn bbox(&self) -> Option<Rect> {
        Rect::union_all_option(self.iter().map(|s| s.bbox()))
    }
}

impl<'a> IntoIterator for UnionView<'a> {
    type Item = ShapeRef<'a>;
    type IntoIter = ViewIter<'a>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
