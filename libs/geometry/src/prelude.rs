//! An import prelude that re-exports commonly used items.

pub use crate::bbox::Bbox;
pub use crate::orientation::{NamedOrientation, Orientation};
pub use crate::point::Point;
pub use crate::points::PointVec;
pub use crate::polygon::{Polygon, Polygon45, Polygon90, Winding};
pub use crate::rect::Rect;
pub use crate::shape::Shape;
pub use crate::transform::{
    Rotation, Transform, TransformMut, Transformation, Translate, TranslateMut,
};
pub use crate::union::BoundingUnion;
