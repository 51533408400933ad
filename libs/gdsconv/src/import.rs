//! Import of GDSII libraries.

use std::collections::{HashMap, HashSet};

use arcstr::ArcStr;
use gds::{GdsLibrary, GdsUnits};
use geometry::polygon::{is_manhattan, is_octilinear};
use geometry::prelude::*;
use layir::{ArrayParams, BuildError, Cell, CellId, Instance, Library, LibraryBuilder, Text};
use serde::{Deserialize, Serialize};
use tracing::{span, Level};

use crate::GdsLayer;

/// The property attribute that carries an instance's name on SREF and AREF elements.
pub const INSTANCE_NAME_ATTR: i16 = 61;

/// Options for [`import_gds`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GdsImportOpts {
    /// The expected units. If set, a library whose database unit
    /// differs by more than one part in a thousand is rejected.
    pub units: Option<GdsUnits>,
}

/// An error encountered while converting a GDS library to a layout library.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GdsImportError {
    /// The library's database unit differs from the expected one.
    #[error("database unit mismatch: expected {expected} m, found {found} m")]
    UnitsMismatch {
        /// The expected database unit in meters.
        expected: f64,
        /// The library's database unit in meters.
        found: f64,
    },
    /// Two structures share a name.
    #[error("duplicate cell name `{0}`")]
    DuplicateCell(ArcStr),
    /// A reference to a structure that is not defined.
    #[error("cell not found: `{0}`")]
    MissingCell(ArcStr),
    /// A boundary whose last point differs from its first.
    #[error("boundary in cell `{cell}` is not closed")]
    OpenBoundary {
        /// The cell containing the boundary.
        cell: ArcStr,
    },
    /// A boundary or path without enough points.
    #[error("element in cell `{cell}` has too few points")]
    EmptyElement {
        /// The cell containing the element.
        cell: ArcStr,
    },
    /// A path that cannot be represented as rectangles.
    #[error("unsupported path in cell `{cell}`: {reason}")]
    UnsupportedPath {
        /// The cell containing the path.
        cell: ArcStr,
        /// Why the path is unsupported.
        reason: &'static str,
    },
    /// A transformation that is not a Manhattan orientation.
    #[error("unsupported transformation in cell `{cell}`: {reason}")]
    UnsupportedStrans {
        /// The cell containing the element.
        cell: ArcStr,
        /// Why the transformation is unsupported.
        reason: &'static str,
    },
    /// An array reference that is not a regular grid.
    #[error("invalid array of `{name}` in cell `{cell}`: {reason}")]
    InvalidArray {
        /// The cell containing the array.
        cell: ArcStr,
        /// The arrayed structure.
        name: ArcStr,
        /// What is wrong with the array.
        reason: &'static str,
    },
    /// A negative layer or datatype number.
    #[error("invalid layer ({layer}, {xtype}) in cell `{cell}`")]
    InvalidLayer {
        /// The cell containing the element.
        cell: ArcStr,
        /// The layer number.
        layer: i16,
        /// The datatype, text type or box type.
        xtype: i16,
    },
    /// The imported library failed validation.
    #[error(transparent)]
    Build(#[from] BuildError),
}

type Result<T> = std::result::Result<T, GdsImportError>;

/// Imports every structure of a [`GdsLibrary`].
pub fn import_gds(lib: &GdsLibrary, opts: GdsImportOpts) -> Result<Library<GdsLayer>> {
    GdsImporter::new(lib, opts).import()
}

/// Logs an import error before it is returned.
fn fail(err: GdsImportError) -> GdsImportError {
    tracing::event!(Level::ERROR, error = %err, "GDS import failed");
    err
}

/// An importer for GDS files.
pub struct GdsImporter<'a> {
    lib: LibraryBuilder<GdsLayer>,
    gds: &'a GdsLibrary,
    opts: GdsImportOpts,
}

impl<'a> GdsImporter<'a> {
    /// Creates a new GDS importer.
    pub fn new(gds: &'a GdsLibrary, opts: GdsImportOpts) -> Self {
        Self {
            lib: LibraryBuilder::new(),
            gds,
            opts,
        }
    }

    /// Imports every structure, children before parents.
    pub fn import(mut self) -> Result<Library<GdsLayer>> {
        self.check_units()?;
        for strukt in GdsDepOrder::new(self.gds)?.total_order()? {
            self.import_and_add(strukt)?;
        }
        self.lib.build().map_err(|e| fail(e.into()))
    }

    /// Imports a single structure and everything it instantiates.
    pub fn import_cell(mut self, name: impl Into<ArcStr>) -> Result<Library<GdsLayer>> {
        let name = name.into();
        self.check_units()?;
        for strukt in GdsDepOrder::new(self.gds)?.cell_order(&name)? {
            self.import_and_add(strukt)?;
        }
        self.lib.build().map_err(|e| fail(e.into()))
    }

    /// Checks the library's database unit against the expected units.
    fn check_units(&self) -> Result<()> {
        let Some(expected) = &self.opts.units else {
            return Ok(());
        };
        let found = self.gds.units.db_unit();
        let expected = expected.db_unit();
        if ((found - expected) / expected).abs() > 1e-3 {
            return Err(fail(GdsImportError::UnitsMismatch { expected, found }));
        }
        Ok(())
    }

    fn import_and_add(&mut self, strukt: &gds::GdsStruct) -> Result<CellId> {
        let name = &strukt.name;
        if self.lib.try_cell_id_named(name).is_some() {
            return Err(fail(GdsImportError::DuplicateCell(name.clone())));
        }
        let mut cell = Cell::new(name.clone());
        self.import_gds_struct(strukt, &mut cell)?;
        Ok(self.lib.add_cell(cell))
    }

    fn import_gds_struct(&self, strukt: &gds::GdsStruct, cell: &mut Cell<GdsLayer>) -> Result<()> {
        let span = span!(Level::INFO, "cell", name = %strukt.name);
        let _guard = span.enter();

        let name = &strukt.name;
        let mut n_insts = 0;
        for elem in &strukt.elems {
            use gds::GdsElement::*;
            match elem {
                GdsBoundary(x) => {
                    let layer = import_layer(name, x)?;
                    cell.add_shape(layer, import_boundary(name, x)?);
                }
                GdsBox(x) => {
                    let layer = import_layer(name, x)?;
                    cell.add_shape(layer, import_box(x));
                }
                GdsPath(x) => {
                    let layer = import_layer(name, x)?;
                    for rect in import_path(name, x)? {
                        cell.add_shape(layer, rect);
                    }
                }
                GdsTextElem(x) => cell.add_text(import_text(name, x)?),
                GdsStructRef(x) => {
                    cell.add_instance(self.import_instance(name, x, n_insts)?);
                    n_insts += 1;
                }
                GdsArrayRef(x) => {
                    cell.add_instance(self.import_instance_array(name, x, n_insts)?);
                    n_insts += 1;
                }
            }
        }
        tracing::debug!(elements = strukt.elems.len(), "imported cell");
        Ok(())
    }

    fn child(&self, name: &ArcStr) -> Result<CellId> {
        self.lib
            .try_cell_id_named(name)
            .ok_or_else(|| fail(GdsImportError::MissingCell(name.clone())))
    }

    fn import_instance(&self, cell: &ArcStr, sref: &gds::GdsStructRef, n: usize) -> Result<Instance> {
        let span = span!(Level::INFO, "instance", name = %sref.name, loc = %sref.xy);
        let _guard = span.enter();

        let child = self.child(&sref.name)?;
        let orientation = import_strans(cell, sref.strans.as_ref(), false)?;
        Ok(Instance::with_transformation(
            child,
            instance_name(&sref.properties, &sref.name, n),
            Transformation::from_offset_and_orientation(import_point(&sref.xy), orientation),
        ))
    }

    /// Imports a [`gds::GdsArrayRef`] as a single arrayed [`Instance`].
    ///
    /// The three reference points are the origin, the origin displaced by
    /// every column, and the origin displaced by every row. Both
    /// displacements must divide evenly by the column and row counts.
    fn import_instance_array(
        &self,
        cell: &ArcStr,
        aref: &gds::GdsArrayRef,
        n: usize,
    ) -> Result<Instance> {
        let span = span!(Level::INFO, "instance array", name = %aref.name);
        let _guard = span.enter();

        let child = self.child(&aref.name)?;
        let invalid = |reason| {
            fail(GdsImportError::InvalidArray {
                cell: cell.clone(),
                name: aref.name.clone(),
                reason,
            })
        };
        let (Ok(cols), Ok(rows)) = (u32::try_from(aref.cols), u32::try_from(aref.rows)) else {
            return Err(invalid("negative row or column count"));
        };
        if cols == 0 || rows == 0 {
            return Err(invalid("zero rows or columns"));
        }

        let [p0, p1, p2] = aref.xy.each_ref().map(import_point);
        let pitch = |d: Point, count: u32| {
            let count = i64::from(count);
            (d.x % count == 0 && d.y % count == 0).then(|| Point::new(d.x / count, d.y / count))
        };
        let col_step = pitch(p1 - p0, cols).ok_or_else(|| invalid("non-integral column pitch"))?;
        let row_step = pitch(p2 - p0, rows).ok_or_else(|| invalid("non-integral row pitch"))?;

        let orientation = import_strans(cell, aref.strans.as_ref(), false)?;
        Ok(Instance::with_transformation(
            child,
            instance_name(&aref.properties, &aref.name, n),
            Transformation::from_offset_and_orientation(p0, orientation),
        )
        .with_array(ArrayParams {
            cols,
            rows,
            col_step,
            row_step,
        }))
    }
}

/// The name stored in the instance-name property, or `<child>_<n>` if there is none.
fn instance_name(props: &[gds::GdsProperty], child: &ArcStr, n: usize) -> ArcStr {
    props
        .iter()
        .find(|p| p.attr == INSTANCE_NAME_ATTR)
        .map(|p| p.value.clone())
        .unwrap_or_else(|| arcstr::format!("{}_{}", child, n))
}

fn import_point(pt: &gds::GdsPoint) -> Point {
    Point::new(pt.x.into(), pt.y.into())
}

fn import_layer(cell: &ArcStr, elem: &impl gds::HasLayer) -> Result<GdsLayer> {
    let spec = elem.layerspec();
    match (u16::try_from(spec.layer), u16::try_from(spec.xtype)) {
        (Ok(layer), Ok(xtype)) => Ok(GdsLayer(layer, xtype)),
        _ => Err(fail(GdsImportError::InvalidLayer {
            cell: cell.clone(),
            layer: spec.layer,
            xtype: spec.xtype,
        })),
    }
}

/// Imports a boundary as the simplest shape that represents it.
fn import_boundary(cell: &ArcStr, x: &gds::GdsBoundary) -> Result<Shape> {
    let span = span!(Level::INFO, "boundary", layer = x.layer, datatype = x.datatype);
    let _guard = span.enter();

    let mut pts: Vec<Point> = x.xy.iter().map(import_point).collect();
    let (Some(first), Some(last)) = (pts.first(), pts.last()) else {
        return Err(fail(GdsImportError::EmptyElement { cell: cell.clone() }));
    };
    if first != last {
        return Err(fail(GdsImportError::OpenBoundary { cell: cell.clone() }));
    }
    pts.pop();
    if pts.len() < 3 {
        return Err(fail(GdsImportError::EmptyElement { cell: cell.clone() }));
    }

    let is_rect = pts.len() == 4
        && ((pts[0].x == pts[1].x
            && pts[1].y == pts[2].y
            && pts[2].x == pts[3].x
            && pts[3].y == pts[0].y)
            || (pts[0].y == pts[1].y
                && pts[1].x == pts[2].x
                && pts[2].y == pts[3].y
                && pts[3].x == pts[0].x));
    Ok(if is_rect {
        Shape::Rect(Rect::new(pts[0], pts[2]))
    } else if is_manhattan(&pts) {
        Shape::Polygon90(Polygon90::from_verts(pts))
    } else if is_octilinear(&pts) {
        Shape::Polygon45(Polygon45::from_verts(pts))
    } else {
        Shape::Polygon(Polygon::from_verts(pts))
    })
}

/// Imports a box from two of its opposite corners.
fn import_box(x: &gds::GdsBox) -> Rect {
    Rect::new(import_point(&x.xy[0]), import_point(&x.xy[2]))
}

/// Imports a Manhattan path as one rectangle per segment.
///
/// Interior vertices extend each adjoining segment by half the width so that
/// corners are covered; the path's ends are extended according to its path type.
fn import_path(cell: &ArcStr, x: &gds::GdsPath) -> Result<Vec<Rect>> {
    let span = span!(Level::INFO, "path", layer = x.layer, datatype = x.datatype);
    let _guard = span.enter();

    let unsupported = |reason| {
        fail(GdsImportError::UnsupportedPath {
            cell: cell.clone(),
            reason,
        })
    };
    let width = match x.width {
        Some(w) if w > 0 && w % 2 == 0 => i64::from(w),
        Some(_) => return Err(unsupported("width must be positive and even")),
        None => return Err(unsupported("path width must be specified")),
    };
    let half = width / 2;
    let (begin_extn, end_extn) = match x.path_type {
        None | Some(0) => (0, 0),
        Some(2) => (half, half),
        Some(4) => (
            x.begin_extn.map_or(0, i64::from),
            x.end_extn.map_or(0, i64::from),
        ),
        Some(_) => return Err(unsupported("only flush and extended path ends are supported")),
    };

    let pts: Vec<Point> = x.xy.iter().map(import_point).collect();
    if pts.len() < 2 {
        return Err(fail(GdsImportError::EmptyElement { cell: cell.clone() }));
    }
    // Ends are decided by the outermost segments of nonzero length.
    let segments: Vec<(Point, Point)> = pts
        .windows(2)
        .map(|seg| (seg[0], seg[1]))
        .filter(|(a, b)| a != b)
        .collect();
    let last = segments.len().saturating_sub(1);
    let mut rects = Vec::with_capacity(segments.len());
    for (i, (a, b)) in segments.into_iter().enumerate() {
        let ea = if i == 0 { begin_extn } else { half };
        let eb = if i == last { end_extn } else { half };
        // Extends the span from `a` to `b` outward by `ea` and `eb`.
        let extend = |a: i64, b: i64| {
            if a < b {
                (a - ea, b + eb)
            } else {
                (b - eb, a + ea)
            }
        };
        let rect = if a.y == b.y {
            let (l, r) = extend(a.x, b.x);
            Rect::from_sides_option(l, a.y - half, r, a.y + half)
        } else if a.x == b.x {
            let (bot, top) = extend(a.y, b.y);
            Rect::from_sides_option(a.x - half, bot, a.x + half, top)
        } else {
            return Err(unsupported("non-Manhattan path segment"));
        };
        rects.push(rect.ok_or_else(|| unsupported("end extensions collapse a segment"))?);
    }
    Ok(rects)
}

fn import_text(cell: &ArcStr, x: &gds::GdsTextElem) -> Result<Text<GdsLayer>> {
    let span = span!(Level::INFO, "text element", text = %x.string);
    let _guard = span.enter();

    let layer = import_layer(cell, x)?;
    let orientation = import_strans(cell, x.strans.as_ref(), true)?;
    Ok(Text::with_transformation(
        layer,
        x.string.clone(),
        Transformation::from_offset_and_orientation(import_point(&x.xy), orientation),
    ))
}

/// Imports a STRANS as an orientation.
///
/// Absolute magnification and angle flags are ignored. Magnification other than
/// one is rejected unless `allow_mag` is set, as for text, where it only scales the font.
fn import_strans(cell: &ArcStr, strans: Option<&gds::GdsStrans>, allow_mag: bool) -> Result<Orientation> {
    let Some(strans) = strans else {
        return Ok(Orientation::default());
    };
    let unsupported = |reason| {
        fail(GdsImportError::UnsupportedStrans {
            cell: cell.clone(),
            reason,
        })
    };

    if strans.abs_mag || strans.abs_angle {
        tracing::warn!(
            abs_mag = strans.abs_mag,
            abs_angle = strans.abs_angle,
            "ignoring absolute magnification/angle flags"
        );
    }
    if !allow_mag && strans.mag.is_some_and(|mag| mag != 1.0) {
        return Err(unsupported("magnification is not supported"));
    }
    let rotation = Rotation::try_from(strans.angle.unwrap_or_default())
        .map_err(|_| unsupported("rotations must be multiples of 90 degrees"))?;
    Ok(Orientation::from_reflect_and_angle(strans.reflected, rotation))
}

/// Orders GDS structures so that every structure comes after the structures it instantiates.
#[derive(Debug)]
pub struct GdsDepOrder<'a> {
    gds: &'a GdsLibrary,
    strukts: HashMap<ArcStr, &'a gds::GdsStruct>,
    stack: Vec<&'a gds::GdsStruct>,
    visiting: HashSet<ArcStr>,
    seen: HashSet<ArcStr>,
}

impl<'a> GdsDepOrder<'a> {
    /// Indexes the structures of `gds` by name.
    ///
    /// Fails if two structures share a name.
    pub fn new(gds: &'a GdsLibrary) -> Result<Self> {
        let mut strukts = HashMap::new();
        for s in &gds.structs {
            if strukts.insert(s.name.clone(), s).is_some() {
                return Err(fail(GdsImportError::DuplicateCell(s.name.clone())));
            }
        }
        Ok(Self {
            gds,
            strukts,
            stack: Vec::new(),
            visiting: HashSet::new(),
            seen: HashSet::new(),
        })
    }

    /// Every structure, dependencies first, otherwise in file order.
    pub fn total_order(mut self) -> Result<Vec<&'a gds::GdsStruct>> {
        for s in &self.gds.structs {
            self.push(s)?;
        }
        Ok(self.stack)
    }

    /// The named structure and its dependencies, dependencies first.
    pub fn cell_order(mut self, name: &ArcStr) -> Result<Vec<&'a gds::GdsStruct>> {
        let strukt = self.lookup(name)?;
        self.push(strukt)?;
        Ok(self.stack)
    }

    fn lookup(&self, name: &ArcStr) -> Result<&'a gds::GdsStruct> {
        self.strukts
            .get(name)
            .copied()
            .ok_or_else(|| fail(GdsImportError::MissingCell(name.clone())))
    }

    fn push(&mut self, strukt: &'a gds::GdsStruct) -> Result<()> {
        if self.seen.contains(&strukt.name) {
            return Ok(());
        }
        if !self.visiting.insert(strukt.name.clone()) {
            return Err(fail(BuildError::Cycle(strukt.name.clone()).into()));
        }
        for elem in &strukt.elems {
            let child = match elem {
                gds::GdsElement::GdsStructRef(x) => &x.name,
                gds::GdsElement::GdsArrayRef(x) => &x.name,
                _ => continue,
            };
            let child = self.lookup(child)?;
            self.push(child)?;
        }
        self.visiting.remove(&strukt.name);
        self.seen.insert(strukt.name.clone());
        self.stack.push(strukt);
        Ok(())
    }
}
