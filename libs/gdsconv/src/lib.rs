//! Conversion between GDSII libraries and layout libraries.
//!
//! [`export_gds`] writes a [`layir::Library`] as a [`gds::GdsLibrary`], and
//! [`import_gds`] reads one back. Layers are identified by their GDS
//! layer and datatype numbers.

use serde::{Deserialize, Serialize};

pub mod export;
pub mod import;

#[cfg(test)]
mod tests;

pub use export::{export_gds, GdsExportError, GdsExportOpts};
pub use import::{import_gds, GdsImportError, GdsImportOpts, GdsImporter, INSTANCE_NAME_ATTR};

/// A GDS layer specification: a layer number and a datatype.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct GdsLayer(pub u16, pub u16);
