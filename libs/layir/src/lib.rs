//! Layout intermediate representation.
//!
//! A [`Library`] holds named [`Cell`]s. Each cell owns per-layer [`LayerGeometry`],
//! text labels and [`Instance`]s of other cells. [`GeoIndex`] provides hierarchical
//! spatial queries over a cell and everything it instantiates.

pub mod error;
pub mod id;
pub mod index;
pub mod iter;
pub mod layer;
pub mod view;


use std::{
    collections::{HashMap, HashSet, VecDeque},
    hash::Hash,
    ops::Deref,
    sync::Arc,
};

use arcstr::ArcStr;
use geometry::prelude::*;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

pub use crate::error::{BuildError, LayirError};
use crate::id::Id;
pub use crate::index::{GeoIndex, GeoInstance, GeoObject, GeoValue};
pub use crate::iter::GeoIter;
pub use crate::layer::{GeometryMode, LayerGeometry};
pub use crate::view::{
    Polygon45View, Polygon90View, PolygonView, RectangleView, ShapeRef, UnionView,
};

pub struct Cells;

// The reason this uses [`Cells`] instead of [`Cell`]
// is because `Cell` has a generic type parameter.
pub type CellId = Id<Cells>;
pub type InstanceId = Id<Instance>;

#[derive(Debug, Clone)]
pub struct LibraryBuilder<L> {
    cell_id: CellId,
    cells: IndexMap<CellId, Cell<L>>,
    name_map: HashMap<ArcStr, CellId>,
}

/// A validated [`LibraryBuilder`].
///
/// Every instance refers to a cell in the library, cell names are unique,
/// and no cell instantiates itself, directly or transitively.
#[derive(Debug, Clone)]
pub struct Library<L>(LibraryBuilder<L>);

#[derive(Debug, Clone)]
pub struct Cell<L> {
    name: ArcStr,
    instance_id: InstanceId,
    instances: IndexMap<InstanceId, Instance>,
    instance_name_map: HashMap<ArcStr, InstanceId>,
    layers: IndexMap<L, LayerGeometry>,
    texts: Vec<Text<L>>,
}

/// A primitive text annotation consisting of a layer, string, and location.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Text<L> {
    layer: L,
    text: ArcStr,
    trans: Transformation,
}

/// A regular grid of placements.
///
/// Element `(col, row)` is placed at the instance's offset plus
/// `col * col_step + row * row_step`, with the instance's orientation.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ArrayParams {
    /// The number of columns.
    pub cols: u32,
    /// The number of rows.
    pub rows: u32,
    /// The offset between adjacent columns, in the parent's coordinates.
    pub col_step: Point,
    /// The offset between adjacent rows, in the parent's coordinates.
    pub row_step: Point,
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    child: CellId,
    name: ArcStr,
    trans: Transformation,
    array: Option<ArrayParams>,
}

impl<L> Default for LibraryBuilder<L> {
    fn default() -> Self {
        Self {
            cell_id: Id::new(),
            name_map: Default::default(),
            cells: Default::default(),
        }
    }
}

impl<L> LibraryBuilder<L> {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a cell to the library.
    ///
    /// Name clashes are reported by [`LibraryBuilder::build`];
    /// lookups by name return the most recently added cell.
    pub fn add_cell(&mut self, cell: Cell<L>) -> CellId {
        let id = self.cell_id.alloc();
        self.name_map.insert(cell.name.clone(), id);
        self.cells.insert(id, cell);
        id
    }

    /// Gets the cell with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no cell has the given ID.
    pub fn cell(&self, id: CellId) -> &Cell<L> {
        match self.cells.get(&id) {
            Some(cell) => cell,
            None => {
                tracing::error!("no cell with ID {:?}", id);
                panic!("no cell with ID {:?}", id);
            }
        }
    }

    pub fn try_cell(&self, id: CellId) -> Option<&Cell<L>> {
        self.cells.get(&id)
    }

    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell<L>> {
        self.cells.get_mut(&id)
    }

    /// Gets the cell with the given name.
    ///
    /// # Panics
    ///
    /// Panics if no cell has the given name.
    pub fn cell_named(&self, name: &str) -> &Cell<L> {
        self.cell(self.cell_id_named(name))
    }

    pub fn try_cell_named(&self, name: &str) -> Option<&Cell<L>> {
        self.try_cell(*self.name_map.get(name)?)
    }

    /// Gets the cell ID corresponding to the given name.
    ///
    /// # Panics
    ///
    /// Panics if no cell has the given name.
    /// For a non-panicking alternative, see [`try_cell_id_named`](LibraryBuilder::try_cell_id_named).
    pub fn cell_id_named(&self, name: &str) -> CellId {
        match self.name_map.get(name) {
            Some(&cell) => cell,
            None => {
                tracing::error!("no cell named `{}`", name);
                panic!("no cell named `{}`", name);
            }
        }
    }

    /// Gets the cell ID corresponding to the given name.
    pub fn try_cell_id_named(&self, name: &str) -> Option<CellId> {
        self.name_map.get(name).copied()
    }

    /// Iterates over the `(id, cell)` pairs in this library.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &Cell<L>)> {
        self.cells.iter().map(|(id, cell)| (*id, cell))
    }

    /// The number of cells in the library.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the library has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns cell IDs in topological order.
    ///
    /// Every cell appears after all of the cells it instantiates.
    pub fn topological_order(&self) -> Vec<CellId> {
        let mut state = IndexSet::new();
        for (cell, _) in self.cells() {
            self.dfs_postorder(cell, &mut state);
        }
        state.into_iter().collect()
    }

    fn dfs_postorder(&self, id: CellId, state: &mut IndexSet<CellId>) {
        if state.contains(&id) {
            return;
        }

        let cell = self.cell(id);
        for (_, inst) in cell.instances() {
            self.dfs_postorder(inst.child(), state);
        }
        state.insert(id);
    }

    /// The list of cell IDs instantiated by the given root cells.
    ///
    /// The list returned will include the root cell IDs.
    pub fn cells_used_by(&self, roots: impl IntoIterator<Item = CellId>) -> Vec<CellId> {
        let mut stack = VecDeque::new();
        let mut visited = HashSet::new();
        for root in roots {
            stack.push_back(root);
        }

        while let Some(id) = stack.pop_front() {
            if visited.contains(&id) {
                continue;
            }
            visited.insert(id);
            let cell = self.cell(id);
            for (_, inst) in cell.instances() {
                stack.push_back(inst.child);
            }
        }

        visited.drain().collect()
    }

    /// Validates the library.
    pub fn build(self) -> Result<Library<L>, BuildError> {
        let mut seen = HashSet::new();
        for (_, cell) in self.cells() {
            if !seen.insert(cell.name()) {
                return Err(BuildError::DuplicateName(cell.name().clone()));
            }
            for (_, inst) in cell.instances() {
                if !self.cells.contains_key(&inst.child) {
                    return Err(BuildError::MissingChild {
                        cell: cell.name().clone(),
                        child: inst.child,
                    });
                }
            }
        }

        // Iterative three-color DFS; a gray child means a back edge.
        #[derive(Copy, Clone, PartialEq)]
        enum Mark {
            Gray,
            Black,
        }
        let mut marks: HashMap<CellId, Mark> = HashMap::new();
        for (root, _) in self.cells() {
            if marks.contains_key(&root) {
                continue;
            }
            let mut stack = vec![(root, 0usize)];
            marks.insert(root, Mark::Gray);
            while let Some((id, next)) = stack.pop() {
                let cell = &self.cells[&id];
                match cell.instances.get_index(next) {
                    Some((_, inst)) => {
                        stack.push((id, next + 1));
                        match marks.get(&inst.child) {
                            Some(Mark::Gray) => {
                                return Err(BuildError::Cycle(
                                    self.cells[&inst.child].name.clone(),
                                ));
                            }
                            Some(Mark::Black) => {}
                            None => {
                                marks.insert(inst.child, Mark::Gray);
                                stack.push((inst.child, 0));
                            }
                        }
                    }
                    None => {
                        marks.insert(id, Mark::Black);
                    }
                }
            }
        }

        Ok(Library(self))
    }
}

impl<L> Deref for Library<L> {
    type Target = LibraryBuilder<L>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<L: Hash + Eq> Library<L> {
    /// Builds a spatial index of the shapes on `layer` in `root` and every cell below it.
    ///
    /// Each cell's index is built once and shared by all of its placements,
    /// including every element of arrayed instances. Shape boxes are inflated
    /// by `spx` and `spy`.
    pub fn geo_index(
        &self,
        root: CellId,
        layer: &L,
        spx: i64,
        spy: i64,
    ) -> error::Result<Arc<GeoIndex>> {
        self.try_cell(root).ok_or(LayirError::MissingCell(root))?;
        let used: HashSet<CellId> = self.cells_used_by([root]).into_iter().collect();
        let mut built: HashMap<CellId, Arc<GeoIndex>> = HashMap::new();
        for id in self.topological_order() {
            if !used.contains(&id) {
                continue;
            }
            let cell = self.cell(id);
            let mut index = GeoIndex::new();
            if let Some(geometry) = cell.layer(layer) {
                index.insert_layer(geometry, spx, spy)?;
            }
            for (_, inst) in cell.instances() {
                let master = built
                    .get(&inst.child)
                    .ok_or(LayirError::MissingCell(inst.child))?;
                for xform in inst.placements() {
                    index.insert_instance(master.clone(), xform, 0, 0)?;
                }
            }
            built.insert(id, Arc::new(index));
        }
        built.remove(&root).ok_or(LayirError::MissingCell(root))
    }
}

impl<L> Cell<L> {
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            instance_id: Id::new(),
            instances: Default::default(),
            instance_name_map: Default::default(),
            layers: Default::default(),
            texts: Default::default(),
        }
    }

    /// The name of the cell.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// Get the instance associated with the given ID.
    #[inline]
    pub fn try_instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(&id)
    }

    /// Gets the instance with the given name.
    pub fn try_instance_named(&self, name: &str) -> Option<&Instance> {
        self.try_instance(*self.instance_name_map.get(name)?)
    }

    /// Add the given instance to the cell.
    #[inline]
    pub fn add_instance(&mut self, instance: Instance) -> InstanceId {
        let id = self.instance_id.alloc();
        self.instance_name_map.insert(instance.name.clone(), id);
        self.instances.insert(id, instance);
        id
    }

    /// Iterate over the instances of this cell.
    #[inline]
    pub fn instances(&self) -> impl Iterator<Item = (InstanceId, &Instance)> {
        self.instances.iter().map(|x| (*x.0, x.1))
    }

    /// Iterates over the layers of this cell, in the order they were first drawn on.
    pub fn layers(&self) -> impl Iterator<Item = (&L, &LayerGeometry)> {
        self.layers.iter()
    }

    pub fn add_text(&mut self, text: Text<L>) {
        self.texts.push(text);
    }

    pub fn texts(&self) -> impl Iterator<Item = &Text<L>> {
        self.texts.iter()
    }
}

impl<L: Hash + Eq> Cell<L> {
    /// Draws a shape on the given layer, creating the layer's geometry if needed.
    pub fn add_shape(&mut self, layer: L, shape: impl Into<Shape>) {
        self.layers.entry(layer).or_default().add_shape(shape);
    }

    /// The geometry drawn on `layer`, if any.
    pub fn layer(&self, layer: &L) -> Option<&LayerGeometry> {
        self.layers.get(layer)
    }
}

impl<L> Text<L> {
    #[inline]
    pub fn new(layer: L, text: impl Into<ArcStr>) -> Self {
        Self {
            layer,
            text: text.into(),
            trans: Default::default(),
        }
    }

    #[inline]
    pub fn with_transformation(
        layer: L,
        text: impl Into<ArcStr>,
        trans: impl Into<Transformation>,
    ) -> Self {
        Self {
            layer,
            text: text.into(),
            trans: trans.into(),
        }
    }

    #[inline]
    pub fn layer(&self) -> &L {
        &self.layer
    }

    #[inline]
    pub fn text(&self) -> &ArcStr {
        &self.text
    }

    #[inline]
    pub fn transformation(&self) -> Transformation {
        self.trans
    }
}

impl Instance {
    pub fn new(child: CellId, name: impl Into<ArcStr>) -> Self {
        Self {
            child,
            name: name.into(),
            trans: Default::default(),
            array: None,
        }
    }

    pub fn with_transformation(
        child: CellId,
        name: impl Into<ArcStr>,
        transformation: impl Into<Transformation>,
    ) -> Self {
        Self {
            child,
            name: name.into(),
            trans: transformation.into(),
            array: None,
        }
    }

    /// Turns this instance into a `cols` by `rows` array.
    pub fn with_array(mut self, array: ArrayParams) -> Self {
        self.array = Some(array);
        self
    }

    #[inline]
    pub fn child(&self) -> CellId {
        self.child
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    #[inline]
    pub fn transformation(&self) -> Transformation {
        self.trans
    }

    #[inline]
    pub fn array(&self) -> Option<&ArrayParams> {
        self.array.as_ref()
    }

    /// The transformation of every placed copy, row by row.
    ///
    /// A plain instance yields its own transformation once.
    pub fn placements(&self) -> impl Iterator<Item = Transformation> + '_ {
        let (cols, rows, col_step, row_step) = match self.array {
            Some(a) => (a.cols, a.rows, a.col_step, a.row_step),
            None => (1, 1, Point::zero(), Point::zero()),
        };
        (0..rows).flat_map(move |r| {
            (0..cols).map(move |c| {
                let offset = col_step.scale(c as i64) + row_step.scale(r as i64);
                Transformation::cascade(
                    Transformation::from_offset(offset),
                    self.trans,
                )
            })
        })
    }
}
