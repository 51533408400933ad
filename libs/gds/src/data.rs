//! The GDSII library data model.

use arcstr::ArcStr;
use chrono::{NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Bit flags of the STRANS record.
pub mod strans_flags {
    /// Reflect about the x-axis before rotating.
    pub const REFLECT: u16 = 1 << 15;
    /// The magnification is absolute.
    pub const ABS_MAG: u16 = 1 << 14;
    /// The angle is absolute.
    pub const ABS_ANGLE: u16 = 1 << 13;
}

/// The stream version written by this crate.
pub const DEFAULT_VERSION: i16 = 5;

/// The PRESENTATION word written for text elements:
/// default font, centered and middle justified.
pub const DEFAULT_PRESENTATION: u16 = 0xA000;

/// A point in database units.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[display("({x}, {y})")]
pub struct GdsPoint {
    pub x: i32,
    pub y: i32,
}

impl GdsPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A (layer, datatype) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GdsLayerSpec {
    pub layer: i16,
    pub xtype: i16,
}

/// Elements that live on a layer.
pub trait HasLayer {
    fn layerspec(&self) -> GdsLayerSpec;
}

/// Library units.
///
/// The first value is the size of a database unit in user units,
/// the second the size of a database unit in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GdsUnits(f64, f64);

impl GdsUnits {
    pub fn new(user_unit: f64, db_unit: f64) -> Self {
        Self(user_unit, db_unit)
    }

    /// The size of a database unit in user units.
    pub fn user_unit(&self) -> f64 {
        self.0
    }

    /// The size of a database unit in meters.
    pub fn db_unit(&self) -> f64 {
        self.1
    }
}

impl Default for GdsUnits {
    /// Nanometer database units and micron user units.
    fn default() -> Self {
        Self(1e-3, 1e-9)
    }
}

/// Modification and access times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GdsDateTimes {
    pub modified: NaiveDateTime,
    pub accessed: NaiveDateTime,
}

impl GdsDateTimes {
    /// The current UTC time, to the second.
    pub fn now() -> Self {
        let now = Utc::now().naive_utc();
        let now = now.with_nanosecond(0).unwrap_or(now);
        Self {
            modified: now,
            accessed: now,
        }
    }
}

impl Default for GdsDateTimes {
    fn default() -> Self {
        Self::now()
    }
}

/// A property attached to an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GdsProperty {
    pub attr: i16,
    pub value: ArcStr,
}

/// Reflection, magnification and rotation of a reference or text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GdsStrans {
    pub reflected: bool,
    pub abs_mag: bool,
    pub abs_angle: bool,
    pub mag: Option<f64>,
    /// Counter-clockwise rotation in degrees.
    pub angle: Option<f64>,
}

impl GdsStrans {
    /// The STRANS flag word.
    pub fn flags(&self) -> u16 {
        use strans_flags::*;
        let mut flags = 0;
        if self.reflected {
            flags |= REFLECT;
        }
        if self.abs_mag {
            flags |= ABS_MAG;
        }
        if self.abs_angle {
            flags |= ABS_ANGLE;
        }
        flags
    }

    /// Builds a [`GdsStrans`] from a STRANS flag word, without magnification or angle.
    pub fn from_flags(flags: u16) -> Self {
        use strans_flags::*;
        Self {
            reflected: flags & REFLECT != 0,
            abs_mag: flags & ABS_MAG != 0,
            abs_angle: flags & ABS_ANGLE != 0,
            mag: None,
            angle: None,
        }
    }
}

/// A closed polygon. The last point repeats the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GdsBoundary {
    pub layer: i16,
    pub datatype: i16,
    pub xy: Vec<GdsPoint>,
    pub properties: Vec<GdsProperty>,
}

/// A wire of some width along a sequence of points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GdsPath {
    pub layer: i16,
    pub datatype: i16,
    pub xy: Vec<GdsPoint>,
    pub width: Option<i32>,
    /// End style: 0 flush, 1 round, 2 half-width extension, 4 explicit extensions.
    pub path_type: Option<i16>,
    pub begin_extn: Option<i32>,
    pub end_extn: Option<i32>,
    pub properties: Vec<GdsProperty>,
}

/// A single placement of another structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GdsStructRef {
    pub name: ArcStr,
    pub xy: GdsPoint,
    pub strans: Option<GdsStrans>,
    pub properties: Vec<GdsProperty>,
}

/// A grid of placements of another structure.
///
/// `xy` holds the origin, the origin displaced by `cols` column pitches,
/// and the origin displaced by `rows` row pitches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GdsArrayRef {
    pub name: ArcStr,
    pub xy: [GdsPoint; 3],
    pub cols: i16,
    pub rows: i16,
    pub strans: Option<GdsStrans>,
    pub properties: Vec<GdsProperty>,
}

/// A text label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GdsTextElem {
    pub string: ArcStr,
    pub layer: i16,
    pub texttype: i16,
    pub xy: GdsPoint,
    pub presentation: Option<u16>,
    pub path_type: Option<i16>,
    pub width: Option<i32>,
    pub strans: Option<GdsStrans>,
    pub properties: Vec<GdsProperty>,
}

/// A box outline of five points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GdsBox {
    pub layer: i16,
    pub boxtype: i16,
    pub xy: [GdsPoint; 5],
    pub properties: Vec<GdsProperty>,
}

macro_rules! impl_has_layer {
    ($($ty:ident => $xtype:ident),* $(,)?) => {
        $(
            impl HasLayer for $ty {
                fn layerspec(&self) -> GdsLayerSpec {
                    GdsLayerSpec {
                        layer: self.layer,
                        xtype: self.$xtype,
                    }
                }
            }
        )*
    };
}

impl_has_layer! {
    GdsBoundary => datatype,
    GdsPath => datatype,
    GdsTextElem => texttype,
    GdsBox => boxtype,
}

/// An element of a structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::From)]
pub enum GdsElement {
    GdsBoundary(GdsBoundary),
    GdsPath(GdsPath),
    GdsStructRef(GdsStructRef),
    GdsArrayRef(GdsArrayRef),
    GdsTextElem(GdsTextElem),
    GdsBox(GdsBox),
}

/// A named structure (cell) definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GdsStruct {
    pub name: ArcStr,
    pub dates: GdsDateTimes,
    pub elems: Vec<GdsElement>,
}

impl GdsStruct {
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            dates: GdsDateTimes::now(),
            elems: Vec::new(),
        }
    }
}

/// A GDSII library: named, with units, holding an ordered list of structures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GdsLibrary {
    pub name: ArcStr,
    pub version: i16,
    pub dates: GdsDateTimes,
    pub units: GdsUnits,
    pub structs: Vec<GdsStruct>,
}

impl GdsLibrary {
    /// Creates an empty library with default units.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self::with_units(name, GdsUnits::default())
    }

    pub fn with_units(name: impl Into<ArcStr>, units: GdsUnits) -> Self {
        Self {
            name: name.into(),
            version: DEFAULT_VERSION,
            dates: GdsDateTimes::now(),
            units,
            structs: Vec::new(),
        }
    }
}
