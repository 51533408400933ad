//! Hierarchical spatial indexing of layout geometry.
//!
//! A [`GeoIndex`] stores shapes and instances of other indices in an R-tree.
//! Child indices are shared through [`Arc`] and are immutable once shared,
//! so an instance can never (transitively) refer back to the index holding it.

use std::sync::Arc;

use geometry::prelude::*;
use rstar::{RTree, RTreeObject, AABB};

use crate::error::{LayirError, Result};
use crate::iter::GeoIter;
use crate::layer::LayerGeometry;

/// A placement of a shared child index.
#[derive(Debug, Clone)]
pub struct GeoInstance {
    master: Arc<GeoIndex>,
    xform: Transformation,
}

impl GeoInstance {
    /// The instantiated index.
    #[inline]
    pub fn master(&self) -> &Arc<GeoIndex> {
        &self.master
    }

    /// The transformation from the master's coordinates to the parent's.
    #[inline]
    pub fn transformation(&self) -> Transformation {
        self.xform
    }
}

/// The payload of a [`GeoObject`].
#[derive(Debug, Clone)]
pub enum GeoValue {
    /// A rectangle.
    Rect(Rect),
    /// A Manhattan polygon.
    Polygon90(Polygon90),
    /// A 45-degree polygon.
    Polygon45(Polygon45),
    /// A general polygon.
    Polygon(Polygon),
    /// A placed child index.
    Instance(GeoInstance),
}

impl From<Shape> for GeoValue {
    fn from(value: Shape) -> Self {
        match value {
            Shape::Rect(r) => GeoValue::Rect(r),
            Shape::Polygon90(p) => GeoValue::Polygon90(p),
            Shape::Polygon45(p) => GeoValue::Polygon45(p),
            Shape::Polygon(p) => GeoValue::Polygon(p),
        }
    }
}

/// An entry of a [`GeoIndex`].
///
/// The bounding box is computed on insertion from the payload's extents
/// and the spacing margins, and never changes afterwards.
#[derive(Debug, Clone)]
pub struct GeoObject {
    value: GeoValue,
    bbox: Rect,
    spx: i64,
    spy: i64,
}

impl GeoObject {
    /// The stored payload.
    #[inline]
    pub fn value(&self) -> &GeoValue {
        &self.value
    }

    /// The payload extents inflated by the spacing margins.
    #[inline]
    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    /// The horizontal and vertical spacing margins given on insertion.
    #[inline]
    pub fn spacing(&self) -> (i64, i64) {
        (self.spx, self.spy)
    }

    /// Returns the payload as a shape, or `None` for instances.
    pub fn shape(&self) -> Option<Shape> {
        Some(match &self.value {
            GeoValue::Rect(r) => Shape::Rect(*r),
            GeoValue::Polygon90(p) => Shape::Polygon90(p.clone()),
            GeoValue::Polygon45(p) => Shape::Polygon45(p.clone()),
            GeoValue::Polygon(p) => Shape::Polygon(p.clone()),
            GeoValue::Instance(_) => return None,
        })
    }
}

// R-tree envelopes use `f64` so that area heuristics cannot overflow.
// The conversion is monotonic, so no intersecting pair is lost;
// callers re-check candidates against the exact integer box.
pub(crate) fn envelope(rect: Rect) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [rect.left() as f64, rect.bot() as f64],
        [rect.right() as f64, rect.top() as f64],
    )
}

impl RTreeObject for GeoObject {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        envelope(self.bbox)
    }
}

/// An R-tree of shapes and child-index instances.
#[derive(Debug, Default)]
pub struct GeoIndex {
    tree: RTree<GeoObject>,
    bbox: Option<Rect>,
}

impl GeoIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of objects stored directly in this index.
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns `true` if the index holds no objects.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the objects stored directly in this index, in no particular order.
    pub fn objects(&self) -> impl Iterator<Item = &GeoObject> {
        self.tree.iter()
    }

    fn push(&mut self, value: GeoValue, extents: Rect, spx: i64, spy: i64) -> Result<()> {
        if !extents.is_valid() {
            return Err(LayirError::invalid_box(extents));
        }
        let bbox = extents.expand(spx, spy);
        if !bbox.is_valid() {
            return Err(LayirError::invalid_box(bbox));
        }
        self.bbox = Some(self.bbox.bounding_union(&bbox));
        self.tree.insert(GeoObject {
            value,
            bbox,
            spx,
            spy,
        });
        Ok(())
    }

    /// Inserts a shape whose box is inflated by `spx` horizontally and `spy` vertically.
    ///
    /// Fails with [`LayirError::InvalidGeometry`] if the shape's box (or the inflated box) is
    /// inverted, and with [`LayirError::EmptyShape`] for polygons without vertices.
    pub fn insert_shape(&mut self, shape: impl Into<Shape>, spx: i64, spy: i64) -> Result<()> {
        let shape = shape.into();
        let extents = match &shape {
            Shape::Rect(r) => *r,
            other => other.bbox().ok_or(LayirError::EmptyShape)?,
        };
        self.push(shape.into(), extents, spx, spy)
    }

    /// Inserts a placement of `master` under the transformation `xform`.
    ///
    /// The instance's box is the transformed extents of `master` inflated by the margins.
    /// Placing an empty index is a no-op.
    pub fn insert_instance(
        &mut self,
        master: Arc<GeoIndex>,
        xform: Transformation,
        spx: i64,
        spy: i64,
    ) -> Result<()> {
        let Some(extents) = master.bbox() else {
            tracing::trace!("skipping instance of empty index");
            return Ok(());
        };
        let extents = extents.transform(xform);
        self.push(
            GeoValue::Instance(GeoInstance { master, xform }),
            extents,
            spx,
            spy,
        )
    }

    /// Inserts every shape of a layer with the same margins.
    pub fn insert_layer(&mut self, layer: &LayerGeometry, spx: i64, spy: i64) -> Result<()> {
        for shape in layer.view() {
            self.insert_shape(shape.to_shape(), spx, spy)?;
        }
        Ok(())
    }

    /// Returns the flattened shapes near `region`.
    ///
    /// A shape is returned if its inflated box intersects `region` inflated by
    /// `mx` horizontally and `my` vertically. Instances are expanded lazily as the
    /// iterator advances; shapes are yielded in this index's coordinates, in no
    /// particular order.
    pub fn query(&self, region: Rect, mx: i64, my: i64) -> GeoIter<'_> {
        GeoIter::new(self, region, mx, my)
    }

    pub(crate) fn candidates(&self, search: Rect) -> impl Iterator<Item = &GeoObject> + '_ {
        self.tree
            .locate_in_envelope_intersecting(&envelope(search))
            .filter(move |obj| obj.bbox.intersects(&search))
    }
}

impl Bbox for GeoIndex {
    /// The union of every object's inflated box.
    fn bbox(&self) -> Option<Rect> {
        self.bbox
    }
}
