//! Lazy hierarchical queries over a [`GeoIndex`].

use std::iter::FusedIterator;

use geometry::prelude::*;

use crate::index::{GeoIndex, GeoObject, GeoValue};

type Candidates<'a> = Box<dyn Iterator<Item = &'a GeoObject> + 'a>;

/// One level of the instance hierarchy being searched.
struct Frame<'a> {
    candidates: Candidates<'a>,
    /// The margin-inflated query box in this level's coordinates. Always valid.
    search: Rect,
    /// Maps this level's coordinates to the root index's coordinates.
    xform: Transformation,
}

impl<'a> Frame<'a> {
    fn new(index: &'a GeoIndex, search: Rect, xform: Transformation) -> Self {
        Self {
            candidates: Box::new(index.candidates(search)),
            search,
            xform,
        }
    }
}

/// A cursor over the flattened shapes returned by [`GeoIndex::query`].
///
/// The cursor keeps a stack of partially searched levels. Reaching an instance
/// pushes a level for the instance's master, with the query region mapped into the
/// master's coordinates after inflating it by the instance's spacing. Shapes
/// found at any level are transformed back into root coordinates before they are
/// yielded.
///
/// Iteration is single pass. Once exhausted the cursor stays exhausted;
/// call [`GeoIndex::query`] again to restart.
pub struct GeoIter<'a> {
    stack: Vec<Frame<'a>>,
}

impl<'a> GeoIter<'a> {
    pub(crate) fn new(index: &'a GeoIndex, region: Rect, mx: i64, my: i64) -> Self {
        // An inverted search box matches nothing at any level.
        let search = region.expand(mx, my);
        let stack = if search.is_valid() {
            vec![Frame::new(index, search, Transformation::identity())]
        } else {
            Vec::new()
        };
        Self { stack }
    }

    /// The number of hierarchy levels currently being searched.
    ///
    /// Zero once the cursor is exhausted.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns `true` if no further shapes will be yielded.
    pub fn is_exhausted(&self) -> bool {
        self.stack.is_empty()
    }
}

impl Iterator for GeoIter<'_> {
    type Item = Shape;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let Some(obj) = frame.candidates.next() else {
                self.stack.pop();
                continue;
            };
            match obj.value() {
                GeoValue::Instance(inst) => {
                    let local = inst.transformation();
                    let (spx, spy) = obj.spacing();
                    // Negative spacing can shrink the box until it inverts.
                    let search = frame.search.expand(spx, spy);
                    if search.is_valid() {
                        let xform = Transformation::cascade(frame.xform, local);
                        let search = search.transform(local.inv());
                        self.stack.push(Frame::new(inst.master(), search, xform));
                    }
                }
                _ => {
                    let xform = frame.xform;
                    return obj.shape().map(|shape| shape.transform(xform));
                }
            }
        }
    }
}

impl FusedIterator for GeoIter<'_> {}

impl std::fmt::Debug for GeoIter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoIter")
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}
