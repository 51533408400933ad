//! Record framing.
//!
//! Every record is a big-endian `u16` total length, a record type byte,
//! a datatype byte, and `length - 4` payload bytes.

use std::fmt;
use std::io::{Read, Write};

use arcstr::ArcStr;
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{GdsError, GdsResult};
use crate::real8;

/// The largest payload a single record can carry.
pub const MAX_PAYLOAD: usize = u16::MAX as usize - 4;

/// The record types understood by this crate.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    FromPrimitive,
    derive_more::Display,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum GdsRecordType {
    #[display("HEADER")]
    Header = 0x00,
    #[display("BGNLIB")]
    BgnLib = 0x01,
    #[display("LIBNAME")]
    LibName = 0x02,
    #[display("UNITS")]
    Units = 0x03,
    #[display("ENDLIB")]
    EndLib = 0x04,
    #[display("BGNSTR")]
    BgnStruct = 0x05,
    #[display("STRNAME")]
    StructName = 0x06,
    #[display("ENDSTR")]
    EndStruct = 0x07,
    #[display("BOUNDARY")]
    Boundary = 0x08,
    #[display("PATH")]
    Path = 0x09,
    #[display("SREF")]
    StructRef = 0x0a,
    #[display("AREF")]
    ArrayRef = 0x0b,
    #[display("TEXT")]
    Text = 0x0c,
    #[display("LAYER")]
    Layer = 0x0d,
    #[display("DATATYPE")]
    DataType = 0x0e,
    #[display("WIDTH")]
    Width = 0x0f,
    #[display("XY")]
    Xy = 0x10,
    #[display("ENDEL")]
    EndElement = 0x11,
    #[display("SNAME")]
    StructRefName = 0x12,
    #[display("COLROW")]
    ColRow = 0x13,
    #[display("TEXTTYPE")]
    TextType = 0x16,
    #[display("PRESENTATION")]
    Presentation = 0x17,
    #[display("STRING")]
    String = 0x19,
    #[display("STRANS")]
    Strans = 0x1a,
    #[display("MAG")]
    Mag = 0x1b,
    #[display("ANGLE")]
    Angle = 0x1c,
    #[display("PATHTYPE")]
    PathType = 0x21,
    #[display("PROPATTR")]
    PropAttr = 0x2b,
    #[display("PROPVALUE")]
    PropValue = 0x2c,
    #[display("BOX")]
    Box = 0x2d,
    #[display("BOXTYPE")]
    BoxType = 0x2e,
    #[display("BGNEXTN")]
    BeginExtn = 0x30,
    #[display("ENDEXTN")]
    EndExtn = 0x31,
}

impl GdsRecordType {
    /// The datatype every record of this type carries.
    pub fn datatype(self) -> GdsDataType {
        use GdsRecordType::*;
        match self {
            EndLib | EndStruct | Boundary | Path | StructRef | ArrayRef | Text | EndElement
            | Box => GdsDataType::NoData,
            Presentation | Strans => GdsDataType::BitArray,
            Header | BgnLib | BgnStruct | Layer | DataType | ColRow | TextType | PathType
            | PropAttr | BoxType => GdsDataType::I16,
            Width | Xy | BeginExtn | EndExtn => GdsDataType::I32,
            Units | Mag | Angle => GdsDataType::F64,
            LibName | StructName | StructRefName | String | PropValue => GdsDataType::Str,
        }
    }
}

/// Payload encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, Serialize, Deserialize)]
#[repr(u8)]
pub enum GdsDataType {
    NoData = 0,
    BitArray = 1,
    I16 = 2,
    I32 = 3,
    /// Four-byte reals. Never used by valid streams.
    F32 = 4,
    /// Eight-byte reals in the [`real8`] encoding.
    F64 = 5,
    Str = 6,
}

impl GdsDataType {
    /// The size of one payload item in bytes.
    fn unit_size(self) -> usize {
        match self {
            GdsDataType::NoData => 0,
            GdsDataType::BitArray | GdsDataType::I16 => 2,
            GdsDataType::I32 | GdsDataType::F32 => 4,
            GdsDataType::F64 => 8,
            GdsDataType::Str => 1,
        }
    }
}

/// A decoded record payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GdsData {
    NoData,
    BitArray(u16),
    I16(Vec<i16>),
    I32(Vec<i32>),
    F64(Vec<f64>),
    Str(ArcStr),
}

impl GdsData {
    /// The datatype of this payload.
    pub fn datatype(&self) -> GdsDataType {
        match self {
            GdsData::NoData => GdsDataType::NoData,
            GdsData::BitArray(_) => GdsDataType::BitArray,
            GdsData::I16(_) => GdsDataType::I16,
            GdsData::I32(_) => GdsDataType::I32,
            GdsData::F64(_) => GdsDataType::F64,
            GdsData::Str(_) => GdsDataType::Str,
        }
    }
}

/// A single typed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GdsRecord {
    pub rtype: GdsRecordType,
    pub data: GdsData,
}

impl GdsRecord {
    pub fn new(rtype: GdsRecordType, data: GdsData) -> Self {
        Self { rtype, data }
    }

    /// A record without payload.
    pub fn empty(rtype: GdsRecordType) -> Self {
        Self::new(rtype, GdsData::NoData)
    }

    /// The record's type word: record type in the high byte, datatype in the low byte.
    pub fn type_word(&self) -> u16 {
        ((self.rtype as u16) << 8) | self.data.datatype() as u16
    }
}

impl fmt::Display for GdsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rtype)?;
        match &self.data {
            GdsData::NoData => Ok(()),
            GdsData::BitArray(bits) => write!(f, " {bits:#018b}"),
            GdsData::I16(values) => write_list(f, values),
            GdsData::I32(values) => write_list(f, values),
            GdsData::F64(values) => write_list(f, values),
            GdsData::Str(s) => write!(f, " {s:?}"),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
    for value in values {
        write!(f, " {value}")?;
    }
    Ok(())
}

/// Options controlling how streams are read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GdsReaderOptions {
    /// Skip records with unknown types or unsupported datatypes
    /// instead of failing.
    pub lenient: bool,
}

/// Reads [`GdsRecord`]s from a byte stream.
pub struct GdsRecordReader<R> {
    inner: R,
    offset: u64,
    record_offset: u64,
    opts: GdsReaderOptions,
}

impl<R: Read> GdsRecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_options(inner, GdsReaderOptions::default())
    }

    pub fn with_options(inner: R, opts: GdsReaderOptions) -> Self {
        Self {
            inner,
            offset: 0,
            record_offset: 0,
            opts,
        }
    }

    /// The number of bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The offset of the header of the most recently returned record.
    pub fn record_offset(&self) -> u64 {
        self.record_offset
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads as many bytes as are available, up to `buf.len()`.
    fn fill(&mut self, buf: &mut [u8]) -> GdsResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.offset += filled as u64;
        Ok(filled)
    }

    /// Reads the next record.
    ///
    /// Returns `Ok(None)` if the stream ends exactly on a record boundary.
    pub fn read_record(&mut self) -> GdsResult<Option<GdsRecord>> {
        loop {
            let offset = self.offset;
            let mut header = [0u8; 4];
            match self.fill(&mut header)? {
                0 => return Ok(None),
                4 => {}
                _ => return Err(GdsError::TruncatedStream { offset }),
            }
            let len = BigEndian::read_u16(&header[..2]) as usize;
            let (rbyte, dbyte) = (header[2], header[3]);
            let word = BigEndian::read_u16(&header[2..]);
            if len < 4 || len % 2 != 0 {
                return Err(GdsError::MalformedRecord {
                    offset,
                    rtype: word,
                    reason: "record length must be even and at least 4",
                });
            }
            let mut payload = vec![0u8; len - 4];
            if self.fill(&mut payload)? != payload.len() {
                return Err(GdsError::TruncatedStream { offset });
            }

            // Unknown record types are unsupported whatever their datatype byte says.
            let rtype = GdsRecordType::from_u8(rbyte);
            let dtype = match (rtype, GdsDataType::from_u8(dbyte)) {
                (Some(_), None) => {
                    return Err(GdsError::MalformedRecord {
                        offset,
                        rtype: word,
                        reason: "unknown datatype",
                    })
                }
                (_, Some(GdsDataType::F32)) => None,
                (_, dtype) => dtype,
            };
            let (Some(rtype), Some(dtype)) = (rtype, dtype) else {
                if self.opts.lenient {
                    tracing::debug!(
                        offset,
                        rtype = rbyte,
                        dtype = dbyte,
                        len,
                        "skipping unsupported record"
                    );
                    continue;
                }
                return Err(GdsError::UnsupportedRecord {
                    offset,
                    rtype: rbyte,
                    dtype: dbyte,
                });
            };
            if rtype.datatype() != dtype {
                return Err(GdsError::MalformedRecord {
                    offset,
                    rtype: word,
                    reason: "datatype does not match record type",
                });
            }

            let data = decode_payload(dtype, &payload).map_err(|reason| match reason {
                PayloadError::Malformed(reason) => GdsError::MalformedRecord {
                    offset,
                    rtype: word,
                    reason,
                },
                PayloadError::NotAscii => GdsError::InvalidString { offset },
            })?;
            self.record_offset = offset;
            return Ok(Some(GdsRecord { rtype, data }));
        }
    }
}

impl<R: Read> Iterator for GdsRecordReader<R> {
    type Item = GdsResult<GdsRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

enum PayloadError {
    Malformed(&'static str),
    NotAscii,
}

fn decode_payload(dtype: GdsDataType, payload: &[u8]) -> Result<GdsData, PayloadError> {
    let unit = dtype.unit_size();
    if unit > 0 && payload.len() % unit != 0 {
        return Err(PayloadError::Malformed(
            "payload length is not a multiple of the datatype size",
        ));
    }
    Ok(match dtype {
        GdsDataType::NoData if payload.is_empty() => GdsData::NoData,
        GdsDataType::NoData => return Err(PayloadError::Malformed("record takes no payload")),
        GdsDataType::BitArray => {
            if payload.len() != 2 {
                return Err(PayloadError::Malformed("bit array must be two bytes"));
            }
            GdsData::BitArray(BigEndian::read_u16(payload))
        }
        GdsDataType::I16 => GdsData::I16(payload.chunks_exact(2).map(BigEndian::read_i16).collect()),
        GdsDataType::I32 => GdsData::I32(payload.chunks_exact(4).map(BigEndian::read_i32).collect()),
        GdsDataType::F32 => return Err(PayloadError::Malformed("four-byte reals are not supported")),
        GdsDataType::F64 => GdsData::F64(
            payload
                .chunks_exact(8)
                .map(|c| real8::decode(BigEndian::read_u64(c)))
                .collect(),
        ),
        GdsDataType::Str => {
            let end = payload
                .iter()
                .rposition(|&b| b != 0)
                .map_or(0, |i| i + 1);
            let bytes = &payload[..end];
            if !bytes.is_ascii() {
                return Err(PayloadError::NotAscii);
            }
            let s = std::str::from_utf8(bytes).map_err(|_| PayloadError::NotAscii)?;
            GdsData::Str(ArcStr::from(s))
        }
    })
}

/// Appends [`GdsRecord`]s to a byte stream.
///
/// Each record's length is computed from its payload before anything is written,
/// so the writer never seeks.
pub struct GdsRecordWriter<W> {
    inner: W,
    offset: u64,
}

impl<W: Write> GdsRecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, offset: 0 }
    }

    /// The number of bytes written so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn flush(&mut self) -> GdsResult<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Writes one record.
    pub fn write_record(&mut self, record: &GdsRecord) -> GdsResult<()> {
        let offset = self.offset;
        if record.rtype.datatype() != record.data.datatype() {
            return Err(GdsError::MalformedRecord {
                offset,
                rtype: record.type_word(),
                reason: "datatype does not match record type",
            });
        }
        let payload = encode_payload(&record.data, offset)?;
        if payload.len() > MAX_PAYLOAD {
            return Err(GdsError::RecordTooLong { len: payload.len() });
        }
        self.inner.write_u16::<BigEndian>((payload.len() + 4) as u16)?;
        self.inner.write_u16::<BigEndian>(record.type_word())?;
        self.inner.write_all(&payload)?;
        self.offset += payload.len() as u64 + 4;
        Ok(())
    }
}

fn encode_payload(data: &GdsData, offset: u64) -> GdsResult<Vec<u8>> {
    let mut buf = Vec::new();
    match data {
        GdsData::NoData => {}
        GdsData::BitArray(bits) => buf.write_u16::<BigEndian>(*bits)?,
        GdsData::I16(values) => {
            for &v in values {
                buf.write_i16::<BigEndian>(v)?;
            }
        }
        GdsData::I32(values) => {
            for &v in values {
                buf.write_i32::<BigEndian>(v)?;
            }
        }
        GdsData::F64(values) => {
            for &v in values {
                buf.write_u64::<BigEndian>(real8::encode(v)?)?;
            }
        }
        GdsData::Str(s) => {
            // NUL is reserved for padding and would be stripped on read.
            if !s.is_ascii() || s.contains('\0') {
                return Err(GdsError::InvalidString { offset });
            }
            buf.extend_from_slice(s.as_bytes());
            if buf.len() % 2 != 0 {
                buf.push(0);
            }
        }
    }
    Ok(buf)
}
