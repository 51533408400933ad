//! Reading and writing GDSII stream files.
//!
//! The crate is layered: [`real8`] converts the format's eight-byte reals,
//! [`record`] frames typed records, and [`GdsLibrary`] parses and serializes
//! whole libraries on top of those records.
//!
//! ```
//! use gds::{GdsBoundary, GdsLibrary, GdsPoint, GdsStruct};
//!
//! let mut lib = GdsLibrary::new("lib");
//! let mut cell = GdsStruct::new("cell");
//! cell.elems.push(
//!     GdsBoundary {
//!         layer: 1,
//!         datatype: 0,
//!         xy: vec![
//!             GdsPoint::new(0, 0),
//!             GdsPoint::new(10, 0),
//!             GdsPoint::new(10, 10),
//!             GdsPoint::new(0, 0),
//!         ],
//!         ..Default::default()
//!     }
//!     .into(),
//! );
//! lib.structs.push(cell);
//!
//! let bytes = lib.to_bytes()?;
//! assert_eq!(GdsLibrary::from_bytes(&bytes)?, lib);
//! # Ok::<(), gds::GdsError>(())
//! ```

pub mod data;
pub mod error;
pub mod real8;
pub mod record;
mod read;
mod write;


pub use data::*;
pub use error::{GdsError, GdsResult};
pub use record::{
    GdsData, GdsDataType, GdsReaderOptions, GdsRecord, GdsRecordReader, GdsRecordType,
    GdsRecordWriter,
};
