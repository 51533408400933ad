//! Per-layer shape containers.

use geometry::prelude::*;
use serde::{Deserialize, Serialize};

use crate::view::{Polygon45View, Polygon90View, PolygonView, RectangleView, ShapeSets, UnionView};

/// The least complex shape class able to represent every shape on a layer.
///
/// Modes are ordered by complexity; a layer's mode only ever increases.
#[derive(
    Debug, Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum GeometryMode {
    /// Rectangles only.
    #[default]
    Rect = 0,
    /// Rectangles and Manhattan polygons.
    Polygon90 = 1,
    /// Adds 45-degree polygons.
    Polygon45 = 2,
    /// Adds general polygons.
    Polygon = 3,
}

impl GeometryMode {
    /// The numeric complexity rank, from 0 to 3.
    #[inline]
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// The mode required to hold the given shape.
    pub fn of(shape: &Shape) -> Self {
        match shape {
            Shape::Rect(_) => Self::Rect,
            Shape::Polygon90(_) => Self::Polygon90,
            Shape::Polygon45(_) => Self::Polygon45,
            Shape::Polygon(_) => Self::Polygon,
        }
    }
}

/// The shapes drawn on a single layer of a cell.
///
/// Shapes are kept in four append-only sets, one per shape class.
/// Validity of polygons (simplicity, edge angles) is the caller's responsibility.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerGeometry {
    mode: GeometryMode,
    rects: Vec<Rect>,
    poly90s: Vec<Polygon90>,
    poly45s: Vec<Polygon45>,
    polys: Vec<Polygon>,
}

impl LayerGeometry {
    /// Creates an empty layer in [`GeometryMode::Rect`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty layer whose mode starts at `mode`.
    pub fn with_mode(mode: GeometryMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// The current mode.
    #[inline]
    pub fn mode(&self) -> GeometryMode {
        self.mode
    }

    /// Raises the mode to at least `mode`. Never lowers it.
    #[inline]
    pub fn raise_mode(&mut self, mode: GeometryMode) {
        self.mode = self.mode.max(mode);
    }

    /// Appends a rectangle, returning its index among the layer's rectangles.
    pub fn add_rect(&mut self, rect: Rect) -> usize {
        self.rects.push(rect);
        self.rects.len() - 1
    }

    /// Appends a Manhattan polygon, returning its index among the layer's Manhattan polygons.
    pub fn add_poly90(&mut self, poly: Polygon90) -> usize {
        self.raise_mode(GeometryMode::Polygon90);
        self.poly90s.push(poly);
        self.poly90s.len() - 1
    }

    /// Appends a 45-degree polygon, returning its index among the layer's 45-degree polygons.
    pub fn add_poly45(&mut self, poly: Polygon45) -> usize {
        self.raise_mode(GeometryMode::Polygon45);
        self.poly45s.push(poly);
        self.poly45s.len() - 1
    }

    /// Appends a general polygon, returning its index among the layer's general polygons.
    pub fn add_poly(&mut self, poly: Polygon) -> usize {
        self.raise_mode(GeometryMode::Polygon);
        self.polys.push(poly);
        self.polys.len() - 1
    }

    /// Appends a shape to the set matching its class.
    pub fn add_shape(&mut self, shape: impl Into<Shape>) -> usize {
        match shape.into() {
            Shape::Rect(r) => self.add_rect(r),
            Shape::Polygon90(p) => self.add_poly90(p),
            Shape::Polygon45(p) => self.add_poly45(p),
            Shape::Polygon(p) => self.add_poly(p),
        }
    }

    /// The rectangles on this layer.
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// The Manhattan polygons on this layer.
    pub fn poly90s(&self) -> &[Polygon90] {
        &self.poly90s
    }

    /// The 45-degree polygons on this layer.
    pub fn poly45s(&self) -> &[Polygon45] {
        &self.poly45s
    }

    /// The general polygons on this layer.
    pub fn polys(&self) -> &[Polygon] {
        &self.polys
    }

    /// The total number of shapes.
    pub fn len(&self) -> usize {
        self.rects.len() + self.poly90s.len() + self.poly45s.len() + self.polys.len()
    }

    /// Returns `true` if the layer holds no shapes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A read-only view of every shape, typed by the current mode.
    ///
    /// The view borrows the layer's sets; nothing is copied.
    pub fn view(&self) -> UnionView<'_> {
        let sets = ShapeSets {
            rects: &self.rects,
            poly90s: &self.poly90s,
            poly45s: &self.poly45s,
            polys: &self.polys,
        };
        match self.mode {
            GeometryMode::Rect => UnionView::Rectangle(RectangleView(sets)),
            GeometryMode::Polygon90 => UnionView::Polygon90(Polygon90View(sets)),
            GeometryMode::Polygon45 => UnionView::Polygon45(Polygon45View(sets)),
            GeometryMode::Polygon => UnionView::Polygon(PolygonView(sets)),
        }
    }
}

impl Bbox for LayerGeometry {
    fn bbox(&self) -> Option<Rect> {
        self.view().bbox()
    }
}
