//! Shapes that can be drawn on a layer.

use serde::{Deserialize, Serialize};

use crate::{
    bbox::Bbox,
    point::Point,
    polygon::{Polygon, Polygon45, Polygon90},
    rect::Rect,
    transform::{TransformMut, Transformation, TranslateMut},
};

/// A rectangle or one of the three polygon classes.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Shape {
    /// An axis-aligned rectangle.
    Rect(Rect),
    /// A polygon whose edges are all horizontal or vertical.
    Polygon90(Polygon90),
    /// A polygon whose edges run at multiples of 45 degrees.
    Polygon45(Polygon45),
    /// Any simple polygon.
    Polygon(Polygon),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Shape::Rect($s) => $body,
            Shape::Polygon90($s) => $body,
            Shape::Polygon45($s) => $body,
            Shape::Polygon($s) => $body,
        }
    };
}

impl Shape {
    /// The outline of the shape.
    ///
    /// Rectangles report their corners counter-clockwise from the lower left.
    pub fn vertices(&self) -> Vec<Point> {
        match self {
            Shape::Rect(r) => r.corners().to_vec(),
            Shape::Polygon90(p) => p.points().to_vec(),
            Shape::Polygon45(p) => p.points().to_vec(),
            Shape::Polygon(p) => p.points().to_vec(),
        }
    }
}

impl TranslateMut for Shape {
    fn translate_mut(&mut self, p: Point) {
        dispatch!(self, s => s.translate_mut(p))
    }
}

impl TransformMut for Shape {
    fn transform_mut(&mut self, trans: Transformation) {
        dispatch!(self, s => s.transform_mut(trans))
    }
}

impl Bbox for Shape {
    fn bbox(&self) -> Option<Rect> {
        dispatch!(self, s => s.bbox())
    }
}

impl From<Rect> for Shape {
    fn from(value: Rect) -> Self {
        Self::Rect(value)
    }
}

impl From<Polygon90> for Shape {
    fn from(value: Polygon90) -> Self {
        Self::Polygon90(value)
    }
}

impl From<Polygon45> for Shape {
    fn from(value: Polygon45) -> Self {
        Self::Polygon45(value)
    }
}

impl From<Polygon> for Shape {
    fn from(value: Polygon) -> Self {
        Self::Polygon(value)
    }
}
