//! Error types.

use arcstr::ArcStr;
use geometry::rect::Rect;

use crate::CellId;

/// The result type returned by fallible geometry operations.
pub type Result<T> = std::result::Result<T, LayirError>;

/// An error raised while inserting into or querying layout geometry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayirError {
    /// A box with `xl > xh` or `yl > yh`.
    #[error("invalid geometry: box ({xl}, {yl}, {xh}, {yh}) is inverted")]
    InvalidGeometry {
        /// Left edge.
        xl: i64,
        /// Bottom edge.
        yl: i64,
        /// Right edge.
        xh: i64,
        /// Top edge.
        yh: i64,
    },
    /// A shape with no vertices.
    #[error("invalid geometry: shape has no vertices")]
    EmptyShape,
    /// A cell ID that does not belong to the library.
    #[error("no cell with ID {0:?}")]
    MissingCell(CellId),
}

impl LayirError {
    pub(crate) fn invalid_box(rect: Rect) -> Self {
        Self::InvalidGeometry {
            xl: rect.left(),
            yl: rect.bot(),
            xh: rect.right(),
            yh: rect.top(),
        }
    }
}

/// An error validating a [`LibraryBuilder`](crate::LibraryBuilder).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Two cells share a name.
    #[error("duplicate cell name `{0}`")]
    DuplicateName(ArcStr),
    /// An instance refers to a cell that is not in the library.
    #[error("cell `{cell}` instantiates missing cell {child:?}")]
    MissingChild {
        /// The parent cell.
        cell: ArcStr,
        /// The missing child.
        child: CellId,
    },
    /// The instance graph contains a cycle through the named cell.
    #[error("cell `{0}` (transitively) instantiates itself")]
    Cycle(ArcStr),
}
