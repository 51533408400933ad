//! Parsing records into a [`GdsLibrary`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use arcstr::ArcStr;
use chrono::{NaiveDate, NaiveDateTime};

use crate::data::*;
use crate::error::{GdsError, GdsResult};
use crate::record::{GdsData, GdsReaderOptions, GdsRecord, GdsRecordReader, GdsRecordType};

impl GdsLibrary {
    /// Reads a library from a stream.
    pub fn read(reader: impl Read) -> GdsResult<Self> {
        Self::read_with_options(reader, GdsReaderOptions::default())
    }

    /// Reads a library from a stream with the given options.
    pub fn read_with_options(reader: impl Read, opts: GdsReaderOptions) -> GdsResult<Self> {
        GdsParser::new(GdsRecordReader::with_options(reader, opts)).parse_lib()
    }

    /// Reads a library from an in-memory buffer.
    pub fn from_bytes(bytes: &[u8]) -> GdsResult<Self> {
        Self::read(bytes)
    }

    /// Reads a library from a file.
    pub fn load(path: impl AsRef<Path>) -> GdsResult<Self> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }
}

/// A record along with the offset of its header.
struct Rec {
    offset: u64,
    record: GdsRecord,
}

impl Rec {
    fn rtype(&self) -> GdsRecordType {
        self.record.rtype
    }

    fn malformed(&self, reason: &'static str) -> GdsError {
        GdsError::MalformedRecord {
            offset: self.offset,
            rtype: self.record.type_word(),
            reason,
        }
    }

    fn unexpected(&self, expected: &'static str) -> GdsError {
        GdsError::UnexpectedRecord {
            offset: self.offset,
            found: self.record.rtype,
            expected,
        }
    }

    fn i16s(&self, n: usize) -> GdsResult<&[i16]> {
        match &self.record.data {
            GdsData::I16(v) if v.len() == n => Ok(v),
            _ => Err(self.malformed("wrong number of 16-bit integers")),
        }
    }

    fn i16(&self) -> GdsResult<i16> {
        Ok(self.i16s(1)?[0])
    }

    fn i32s(&self) -> GdsResult<&[i32]> {
        match &self.record.data {
            GdsData::I32(v) => Ok(v),
            _ => Err(self.malformed("expected 32-bit integers")),
        }
    }

    fn i32(&self) -> GdsResult<i32> {
        match self.i32s()? {
            [v] => Ok(*v),
            _ => Err(self.malformed("wrong number of 32-bit integers")),
        }
    }

    fn f64s(&self, n: usize) -> GdsResult<&[f64]> {
        match &self.record.data {
            GdsData::F64(v) if v.len() == n => Ok(v),
            _ => Err(self.malformed("wrong number of reals")),
        }
    }

    fn bits(&self) -> GdsResult<u16> {
        match &self.record.data {
            GdsData::BitArray(bits) => Ok(*bits),
            _ => Err(self.malformed("expected a bit array")),
        }
    }

    fn string(&self) -> GdsResult<ArcStr> {
        match &self.record.data {
            GdsData::Str(s) => Ok(s.clone()),
            _ => Err(self.malformed("expected a string")),
        }
    }

    fn points(&self) -> GdsResult<Vec<GdsPoint>> {
        let values = self.i32s()?;
        if values.len() % 2 != 0 {
            return Err(self.malformed("odd number of coordinates"));
        }
        Ok(values
            .chunks_exact(2)
            .map(|c| GdsPoint::new(c[0], c[1]))
            .collect())
    }

    fn dates(&self) -> GdsResult<GdsDateTimes> {
        let v = self.i16s(12)?;
        let parse = |v: &[i16]| -> Option<NaiveDateTime> {
            let year = i32::from(v[0]);
            let year = if year < 1900 { year + 1900 } else { year };
            NaiveDate::from_ymd_opt(year, u32::try_from(v[1]).ok()?, u32::try_from(v[2]).ok()?)?
                .and_hms_opt(
                    u32::try_from(v[3]).ok()?,
                    u32::try_from(v[4]).ok()?,
                    u32::try_from(v[5]).ok()?,
                )
        };
        match (parse(&v[..6]), parse(&v[6..])) {
            (Some(modified), Some(accessed)) => Ok(GdsDateTimes { modified, accessed }),
            _ => Err(self.malformed("invalid timestamp")),
        }
    }
}

/// The element kinds, with the body records each one accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElemKind {
    Boundary,
    Path,
    StructRef,
    ArrayRef,
    Text,
    Box,
}

impl ElemKind {
    fn from_record(rtype: GdsRecordType) -> Option<Self> {
        Some(match rtype {
            GdsRecordType::Boundary => ElemKind::Boundary,
            GdsRecordType::Path => ElemKind::Path,
            GdsRecordType::StructRef => ElemKind::StructRef,
            GdsRecordType::ArrayRef => ElemKind::ArrayRef,
            GdsRecordType::Text => ElemKind::Text,
            GdsRecordType::Box => ElemKind::Box,
            _ => return None,
        })
    }

    fn accepts(self, rtype: GdsRecordType) -> bool {
        use GdsRecordType as T;
        match rtype {
            T::Xy | T::PropAttr | T::PropValue => true,
            T::Layer => !matches!(self, ElemKind::StructRef | ElemKind::ArrayRef),
            T::DataType => matches!(self, ElemKind::Boundary | ElemKind::Path),
            T::TextType | T::Presentation | T::String => self == ElemKind::Text,
            T::BoxType => self == ElemKind::Box,
            T::Width | T::PathType => matches!(self, ElemKind::Path | ElemKind::Text),
            T::BeginExtn | T::EndExtn => self == ElemKind::Path,
            T::StructRefName => matches!(self, ElemKind::StructRef | ElemKind::ArrayRef),
            T::ColRow => self == ElemKind::ArrayRef,
            T::Strans | T::Mag | T::Angle => matches!(
                self,
                ElemKind::StructRef | ElemKind::ArrayRef | ElemKind::Text
            ),
            _ => false,
        }
    }
}

/// Element fields gathered before the element is assembled.
#[derive(Default)]
struct ElemFields {
    layer: Option<i16>,
    xtype: Option<i16>,
    xy: Option<Vec<GdsPoint>>,
    width: Option<i32>,
    path_type: Option<i16>,
    begin_extn: Option<i32>,
    end_extn: Option<i32>,
    name: Option<ArcStr>,
    colrow: Option<(i16, i16)>,
    strans: Option<GdsStrans>,
    presentation: Option<u16>,
    string: Option<ArcStr>,
    properties: Vec<GdsProperty>,
}

struct GdsParser<R> {
    reader: GdsRecordReader<R>,
}

impl<R: Read> GdsParser<R> {
    fn new(reader: GdsRecordReader<R>) -> Self {
        Self { reader }
    }

    /// Reads the next record, treating the end of the stream as truncation.
    fn next(&mut self) -> GdsResult<Rec> {
        match self.reader.read_record()? {
            Some(record) => Ok(Rec {
                offset: self.reader.record_offset(),
                record,
            }),
            None => Err(GdsError::TruncatedStream {
                offset: self.reader.offset(),
            }),
        }
    }

    fn expect(&mut self, rtype: GdsRecordType, expected: &'static str) -> GdsResult<Rec> {
        let rec = self.next()?;
        if rec.rtype() != rtype {
            return Err(rec.unexpected(expected));
        }
        Ok(rec)
    }

    fn parse_lib(&mut self) -> GdsResult<GdsLibrary> {
        let version = self.expect(GdsRecordType::Header, "HEADER")?.i16()?;
        let dates = self.expect(GdsRecordType::BgnLib, "BGNLIB")?.dates()?;
        let name = self.expect(GdsRecordType::LibName, "LIBNAME")?.string()?;
        let units = self.expect(GdsRecordType::Units, "UNITS")?;
        let units = match units.f64s(2)? {
            [user, db] => GdsUnits::new(*user, *db),
            _ => return Err(units.malformed("UNITS takes two reals")),
        };
        tracing::debug!(%name, version, "reading library");

        let mut structs = Vec::new();
        loop {
            let rec = self.next()?;
            match rec.rtype() {
                GdsRecordType::BgnStruct => structs.push(self.parse_struct(rec.dates()?)?),
                GdsRecordType::EndLib => break,
                _ => return Err(rec.unexpected("BGNSTR or ENDLIB")),
            }
        }

        Ok(GdsLibrary {
            name,
            version,
            dates,
            units,
            structs,
        })
    }

    fn parse_struct(&mut self, dates: GdsDateTimes) -> GdsResult<GdsStruct> {
        let name = self.expect(GdsRecordType::StructName, "STRNAME")?.string()?;
        let mut elems = Vec::new();
        loop {
            let rec = self.next()?;
            if rec.rtype() == GdsRecordType::EndStruct {
                break;
            }
            let Some(kind) = ElemKind::from_record(rec.rtype()) else {
                return Err(rec.unexpected("an element or ENDSTR"));
            };
            elems.push(self.parse_element(kind, &rec)?);
        }
        Ok(GdsStruct { name, dates, elems })
    }

    fn parse_element(&mut self, kind: ElemKind, header: &Rec) -> GdsResult<GdsElement> {
        let mut f = ElemFields::default();
        let mut pending_attr = None;
        loop {
            let rec = self.next()?;
            let rtype = rec.rtype();
            if rtype == GdsRecordType::EndElement {
                break;
            }
            if !kind.accepts(rtype) {
                return Err(rec.unexpected("an element field or ENDEL"));
            }
            match rtype {
                GdsRecordType::Layer => f.layer = Some(rec.i16()?),
                GdsRecordType::DataType | GdsRecordType::TextType | GdsRecordType::BoxType => {
                    f.xtype = Some(rec.i16()?)
                }
                GdsRecordType::Xy => f.xy = Some(rec.points()?),
                GdsRecordType::Width => f.width = Some(rec.i32()?),
                GdsRecordType::PathType => f.path_type = Some(rec.i16()?),
                GdsRecordType::BeginExtn => f.begin_extn = Some(rec.i32()?),
                GdsRecordType::EndExtn => f.end_extn = Some(rec.i32()?),
                GdsRecordType::StructRefName => f.name = Some(rec.string()?),
                GdsRecordType::ColRow => {
                    let v = rec.i16s(2)?;
                    f.colrow = Some((v[0], v[1]));
                }
                GdsRecordType::Strans => f.strans = Some(GdsStrans::from_flags(rec.bits()?)),
                GdsRecordType::Mag | GdsRecordType::Angle => {
                    let value = rec.f64s(1)?[0];
                    let Some(strans) = f.strans.as_mut() else {
                        return Err(rec.unexpected("STRANS before MAG or ANGLE"));
                    };
                    if rtype == GdsRecordType::Mag {
                        strans.mag = Some(value);
                    } else {
                        strans.angle = Some(value);
                    }
                }
                GdsRecordType::Presentation => f.presentation = Some(rec.bits()?),
                GdsRecordType::String => f.string = Some(rec.string()?),
                GdsRecordType::PropAttr => pending_attr = Some(rec.i16()?),
                GdsRecordType::PropValue => {
                    let Some(attr) = pending_attr.take() else {
                        return Err(rec.unexpected("PROPATTR before PROPVALUE"));
                    };
                    f.properties.push(GdsProperty {
                        attr,
                        value: rec.string()?,
                    });
                }
                _ => return Err(rec.unexpected("an element field or ENDEL")),
            }
        }
        assemble(kind, f).ok_or_else(|| header.malformed("element is missing a required record"))
    }
}

fn fixed<const N: usize>(xy: Vec<GdsPoint>) -> Option<[GdsPoint; N]> {
    xy.try_into().ok()
}

fn assemble(kind: ElemKind, f: ElemFields) -> Option<GdsElement> {
    Some(match kind {
        ElemKind::Boundary => GdsBoundary {
            layer: f.layer?,
            datatype: f.xtype?,
            xy: f.xy?,
            properties: f.properties,
        }
        .into(),
        ElemKind::Path => GdsPath {
            layer: f.layer?,
            datatype: f.xtype?,
            xy: f.xy?,
            width: f.width,
            path_type: f.path_type,
            begin_extn: f.begin_extn,
            end_extn: f.end_extn,
            properties: f.properties,
        }
        .into(),
        ElemKind::StructRef => {
            let [xy] = fixed::<1>(f.xy?)?;
            GdsStructRef {
                name: f.name?,
                xy,
                strans: f.strans,
                properties: f.properties,
            }
            .into()
        }
        ElemKind::ArrayRef => {
            let (cols, rows) = f.colrow?;
            GdsArrayRef {
                name: f.name?,
                xy: fixed::<3>(f.xy?)?,
                cols,
                rows,
                strans: f.strans,
                properties: f.properties,
            }
            .into()
        }
        ElemKind::Text => {
            let [xy] = fixed::<1>(f.xy?)?;
            GdsTextElem {
                string: f.string?,
                layer: f.layer?,
                texttype: f.xtype?,
                xy,
                presentation: f.presentation,
                path_type: f.path_type,
                width: f.width,
                strans: f.strans,
                properties: f.properties,
            }
            .into()
        }
        ElemKind::Box => GdsBox {
            layer: f.layer?,
            boxtype: f.xtype?,
            xy: fixed::<5>(f.xy?)?,
            properties: f.properties,
        }
        .into(),
    })
}
