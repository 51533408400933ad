//! Error types.

use crate::record::GdsRecordType;

/// The result type returned by stream operations.
pub type GdsResult<T> = Result<T, GdsError>;

/// An error reading or writing a GDSII stream.
///
/// Offsets are byte offsets of the offending record's header within the stream.
#[derive(Debug, thiserror::Error)]
pub enum GdsError {
    /// A record whose framing or payload is inconsistent.
    #[error("malformed record {rtype:#06x} at offset {offset}: {reason}")]
    MalformedRecord {
        /// Offset of the record header.
        offset: u64,
        /// The record's type word (record type in the high byte, datatype in the low byte).
        rtype: u16,
        /// What is wrong with the record.
        reason: &'static str,
    },
    /// The stream ended in the middle of a record.
    #[error("stream truncated in record at offset {offset}")]
    TruncatedStream {
        /// Offset of the incomplete record header.
        offset: u64,
    },
    /// A record type or datatype this crate does not handle.
    #[error("unsupported record type {rtype:#04x} (datatype {dtype}) at offset {offset}")]
    UnsupportedRecord {
        /// Offset of the record header.
        offset: u64,
        /// The record type byte.
        rtype: u8,
        /// The datatype byte.
        dtype: u8,
    },
    /// A well-formed record in a position where it is not allowed.
    #[error("unexpected {found} record at offset {offset}; expected {expected}")]
    UnexpectedRecord {
        /// Offset of the record header.
        offset: u64,
        /// The record that was found.
        found: GdsRecordType,
        /// A description of what was expected instead.
        expected: &'static str,
    },
    /// A value outside the range of the Real8 encoding.
    #[error("{value} cannot be represented as a Real8")]
    Real8OutOfRange {
        /// The value being encoded.
        value: f64,
    },
    /// A payload too large for a single record.
    #[error("record payload of {len} bytes exceeds the 65531 byte limit")]
    RecordTooLong {
        /// The payload length in bytes.
        len: usize,
    },
    /// A string containing non-ASCII characters, or a NUL when writing.
    #[error("invalid string at offset {offset}: GDSII strings must be ASCII without NULs")]
    InvalidString {
        /// Offset of the record header.
        offset: u64,
    },
    /// An underlying I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
