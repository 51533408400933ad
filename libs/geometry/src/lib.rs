//! 2-D geometric primitives for integrated circuit layout.
//!
//! All coordinates are integers in database units.
//!
//! # Examples
//!
//! Create a [rectangle](crate::rect::Rect):
//!
//! ```
//! # use geometry::prelude::*;
//! let rect = Rect::from_sides(10, 20, 30, 40);
//! assert!(rect.is_physical());
//! ```
#![warn(missing_docs)]

pub mod bbox;
pub mod orientation;
pub mod point;
pub mod points;
pub mod polygon;
pub mod prelude;
pub mod rect;
pub mod shape;
pub mod transform;
pub mod union;
