//! Export of layout libraries to GDSII.

use arcstr::ArcStr;
use gds::{
    GdsArrayRef, GdsBoundary, GdsElement, GdsLibrary, GdsPoint, GdsStrans, GdsStruct,
    GdsStructRef, GdsTextElem, GdsUnits, DEFAULT_PRESENTATION,
};
use geometry::prelude::*;
use layir::{Cell, Instance, Library, ShapeRef, Text};
use serde::{Deserialize, Serialize};
use tracing::{span, Level};

use crate::GdsLayer;

/// Options for [`export_gds`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GdsExportOpts {
    /// Name of the GDS library.
    pub name: ArcStr,
    /// Library units. Defaults to nanometer database units and micron user units.
    pub units: Option<GdsUnits>,
}

/// An error encountered while converting a library to GDS.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GdsExportError {
    /// A coordinate that does not fit in a 32-bit GDS coordinate.
    #[error("coordinate {value} in cell `{cell}` does not fit in 32 bits")]
    CoordinateOverflow {
        /// The cell being exported.
        cell: ArcStr,
        /// The offending coordinate.
        value: i64,
    },
    /// A layer or datatype number above `i16::MAX`.
    #[error("layer {layer:?} in cell `{cell}` does not fit in 16 bits")]
    LayerOverflow {
        /// The cell being exported.
        cell: ArcStr,
        /// The offending layer.
        layer: GdsLayer,
    },
    /// An instance array with more than `i16::MAX` rows or columns.
    #[error("instance `{instance}` in cell `{cell}` has too many rows or columns")]
    ArrayTooLarge {
        /// The cell being exported.
        cell: ArcStr,
        /// The arrayed instance.
        instance: ArcStr,
    },
    /// A polygon with fewer than three vertices.
    #[error("polygon on layer {layer:?} in cell `{cell}` has fewer than three vertices")]
    DegeneratePolygon {
        /// The cell being exported.
        cell: ArcStr,
        /// The layer the polygon is drawn on.
        layer: GdsLayer,
    },
    /// An instance of a cell that is not in the library.
    #[error("cell `{0}` instantiates a cell that is not in the library")]
    MissingCell(ArcStr),
}

type Result<T> = std::result::Result<T, GdsExportError>;

/// Converts `lib` to a [`GdsLibrary`].
///
/// Cells are written children first. Shapes become closed boundaries in each
/// layer's view order, labels become text elements, and instances become
/// structure references, or array references for arrayed instances.
pub fn export_gds(lib: &Library<GdsLayer>, opts: GdsExportOpts) -> Result<GdsLibrary> {
    GdsExporter { opts, lib }.export()
}

struct GdsExporter<'a> {
    opts: GdsExportOpts,
    lib: &'a Library<GdsLayer>,
}

impl GdsExporter<'_> {
    fn export(self) -> Result<GdsLibrary> {
        let units = self.opts.units.unwrap_or_default();
        let mut gds = GdsLibrary::with_units(self.opts.name.clone(), units);
        for id in self.lib.topological_order() {
            let cell = self.lib.cell(id);
            gds.structs.push(self.export_cell(cell)?);
        }
        Ok(gds)
    }

    fn export_cell(&self, cell: &Cell<GdsLayer>) -> Result<GdsStruct> {
        let span = span!(Level::INFO, "cell", name = %cell.name());
        let _guard = span.enter();

        let ctx = Ctx { cell: cell.name() };
        let mut gcell = GdsStruct::new(cell.name().clone());
        for (&glayer, geometry) in cell.layers() {
            let (layer, datatype) = ctx.layer(glayer)?;
            for shape in geometry.view() {
                gcell.elems.push(
                    GdsBoundary {
                        layer,
                        datatype,
                        xy: ctx.boundary(glayer, shape)?,
                        ..Default::default()
                    }
                    .into(),
                );
            }
        }
        for text in cell.texts() {
            gcell.elems.push(ctx.text(text)?);
        }
        for (_, inst) in cell.instances() {
            gcell.elems.push(self.export_instance(&ctx, inst)?);
        }
        tracing::debug!(elements = gcell.elems.len(), "exported cell");
        Ok(gcell)
    }

    fn export_instance(&self, ctx: &Ctx<'_>, inst: &Instance) -> Result<GdsElement> {
        let child = self
            .lib
            .try_cell(inst.child())
            .ok_or_else(|| GdsExportError::MissingCell(ctx.cell.clone()))?;
        let trans = inst.transformation();
        let origin = trans.offset_point();
        let strans = export_orientation(trans.orientation());

        let Some(array) = inst.array() else {
            return Ok(GdsStructRef {
                name: child.name().clone(),
                xy: ctx.point(origin)?,
                strans,
                ..Default::default()
            }
            .into());
        };

        let too_large = || GdsExportError::ArrayTooLarge {
            cell: ctx.cell.clone(),
            instance: inst.name().clone(),
        };
        let cols = i16::try_from(array.cols).map_err(|_| too_large())?;
        let rows = i16::try_from(array.rows).map_err(|_| too_large())?;
        let col_end = origin + array.col_step.scale(i64::from(cols));
        let row_end = origin + array.row_step.scale(i64::from(rows));
        Ok(GdsArrayRef {
            name: child.name().clone(),
            xy: [ctx.point(origin)?, ctx.point(col_end)?, ctx.point(row_end)?],
            cols,
            rows,
            strans,
            ..Default::default()
        }
        .into())
    }
}

/// Per-cell conversion helpers; errors name the cell.
struct Ctx<'a> {
    cell: &'a ArcStr,
}

impl Ctx<'_> {
    fn coord(&self, value: i64) -> Result<i32> {
        i32::try_from(value).map_err(|_| GdsExportError::CoordinateOverflow {
            cell: self.cell.clone(),
            value,
        })
    }

    fn point(&self, p: Point) -> Result<GdsPoint> {
        Ok(GdsPoint::new(self.coord(p.x)?, self.coord(p.y)?))
    }

    fn layer(&self, layer: GdsLayer) -> Result<(i16, i16)> {
        let overflow = || GdsExportError::LayerOverflow {
            cell: self.cell.clone(),
            layer,
        };
        Ok((
            i16::try_from(layer.0).map_err(|_| overflow())?,
            i16::try_from(layer.1).map_err(|_| overflow())?,
        ))
    }

    /// The shape's outline, closed by repeating the first vertex.
    fn boundary(&self, layer: GdsLayer, shape: ShapeRef<'_>) -> Result<Vec<GdsPoint>> {
        let vertices = shape.vertices();
        if vertices.len() < 3 {
            return Err(GdsExportError::DegeneratePolygon {
                cell: self.cell.clone(),
                layer,
            });
        }
        let mut xy = vertices
            .iter()
            .map(|&p| self.point(p))
            .collect::<Result<Vec<_>>>()?;
        xy.push(xy[0]);
        Ok(xy)
    }

    fn text(&self, text: &Text<GdsLayer>) -> Result<GdsElement> {
        let (layer, texttype) = self.layer(*text.layer())?;
        let trans = text.transformation();
        Ok(GdsTextElem {
            string: text.text().clone(),
            layer,
            texttype,
            xy: self.point(trans.offset_point())?,
            presentation: Some(DEFAULT_PRESENTATION),
            strans: export_orientation(trans.orientation()),
            ..Default::default()
        }
        .into())
    }
}

/// The STRANS for an orientation; `None` for the identity.
fn export_orientation(orientation: Orientation) -> Option<GdsStrans> {
    if orientation == Orientation::identity() {
        return None;
    }
    let angle = orientation.angle();
    Some(GdsStrans {
        reflected: orientation.reflect_vert(),
        angle: (angle != Rotation::R0).then(|| angle.degrees()),
        ..Default::default()
    })
}
