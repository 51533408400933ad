//! Serializing a [`GdsLibrary`] into records.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use arcstr::ArcStr;
use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::data::*;
use crate::error::GdsResult;
use crate::record::{GdsData, GdsRecord, GdsRecordType, GdsRecordWriter};

impl GdsLibrary {
    /// Writes the library to a stream.
    pub fn write(&self, writer: impl Write) -> GdsResult<()> {
        let mut w = GdsWriter {
            records: GdsRecordWriter::new(writer),
        };
        w.write_lib(self)?;
        w.records.flush()
    }

    /// Serializes the library into a byte vector.
    pub fn to_bytes(&self) -> GdsResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        Ok(buf)
    }

    /// Writes the library to a file, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> GdsResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        self.write(BufWriter::new(file))
    }
}

struct GdsWriter<W> {
    records: GdsRecordWriter<W>,
}

impl<W: Write> GdsWriter<W> {
    fn record(&mut self, rtype: GdsRecordType, data: GdsData) -> GdsResult<()> {
        self.records.write_record(&GdsRecord::new(rtype, data))
    }

    fn empty(&mut self, rtype: GdsRecordType) -> GdsResult<()> {
        self.records.write_record(&GdsRecord::empty(rtype))
    }

    fn i16(&mut self, rtype: GdsRecordType, value: i16) -> GdsResult<()> {
        self.record(rtype, GdsData::I16(vec![value]))
    }

    fn i32(&mut self, rtype: GdsRecordType, value: i32) -> GdsResult<()> {
        self.record(rtype, GdsData::I32(vec![value]))
    }

    fn string(&mut self, rtype: GdsRecordType, value: &ArcStr) -> GdsResult<()> {
        self.record(rtype, GdsData::Str(value.clone()))
    }

    fn points(&mut self, xy: &[GdsPoint]) -> GdsResult<()> {
        let values = xy.iter().flat_map(|p| [p.x, p.y]).collect();
        self.record(GdsRecordType::Xy, GdsData::I32(values))
    }

    fn dates(&mut self, rtype: GdsRecordType, dates: &GdsDateTimes) -> GdsResult<()> {
        let mut values = Vec::with_capacity(12);
        values.extend(date_words(&dates.modified));
        values.extend(date_words(&dates.accessed));
        self.record(rtype, GdsData::I16(values))
    }

    fn write_lib(&mut self, lib: &GdsLibrary) -> GdsResult<()> {
        self.i16(GdsRecordType::Header, lib.version)?;
        self.dates(GdsRecordType::BgnLib, &lib.dates)?;
        self.string(GdsRecordType::LibName, &lib.name)?;
        self.record(
            GdsRecordType::Units,
            GdsData::F64(vec![lib.units.user_unit(), lib.units.db_unit()]),
        )?;
        for strukt in &lib.structs {
            self.write_struct(strukt)?;
        }
        self.empty(GdsRecordType::EndLib)
    }

    fn write_struct(&mut self, strukt: &GdsStruct) -> GdsResult<()> {
        self.dates(GdsRecordType::BgnStruct, &strukt.dates)?;
        self.string(GdsRecordType::StructName, &strukt.name)?;
        for elem in &strukt.elems {
            self.write_element(elem)?;
        }
        self.empty(GdsRecordType::EndStruct)
    }

    fn write_element(&mut self, elem: &GdsElement) -> GdsResult<()> {
        match elem {
            GdsElement::GdsBoundary(b) => {
                self.empty(GdsRecordType::Boundary)?;
                self.i16(GdsRecordType::Layer, b.layer)?;
                self.i16(GdsRecordType::DataType, b.datatype)?;
                self.points(&b.xy)?;
                self.properties(&b.properties)?;
            }
            GdsElement::GdsPath(p) => {
                self.empty(GdsRecordType::Path)?;
                self.i16(GdsRecordType::Layer, p.layer)?;
                self.i16(GdsRecordType::DataType, p.datatype)?;
                if let Some(path_type) = p.path_type {
                    self.i16(GdsRecordType::PathType, path_type)?;
                }
                if let Some(width) = p.width {
                    self.i32(GdsRecordType::Width, width)?;
                }
                if let Some(extn) = p.begin_extn {
                    self.i32(GdsRecordType::BeginExtn, extn)?;
                }
                if let Some(extn) = p.end_extn {
                    self.i32(GdsRecordType::EndExtn, extn)?;
                }
                self.points(&p.xy)?;
                self.properties(&p.properties)?;
            }
            GdsElement::GdsStructRef(s) => {
                self.empty(GdsRecordType::StructRef)?;
                self.string(GdsRecordType::StructRefName, &s.name)?;
                self.strans(s.strans.as_ref())?;
                self.points(std::slice::from_ref(&s.xy))?;
                self.properties(&s.properties)?;
            }
            GdsElement::GdsArrayRef(a) => {
                self.empty(GdsRecordType::ArrayRef)?;
                self.string(GdsRecordType::StructRefName, &a.name)?;
                self.strans(a.strans.as_ref())?;
                self.record(GdsRecordType::ColRow, GdsData::I16(vec![a.cols, a.rows]))?;
                self.points(&a.xy)?;
                self.properties(&a.properties)?;
            }
            GdsElement::GdsTextElem(t) => {
                self.empty(GdsRecordType::Text)?;
                self.i16(GdsRecordType::Layer, t.layer)?;
                self.i16(GdsRecordType::TextType, t.texttype)?;
                if let Some(presentation) = t.presentation {
                    self.record(GdsRecordType::Presentation, GdsData::BitArray(presentation))?;
                }
                if let Some(path_type) = t.path_type {
                    self.i16(GdsRecordType::PathType, path_type)?;
                }
                if let Some(width) = t.width {
                    self.i32(GdsRecordType::Width, width)?;
                }
                self.strans(t.strans.as_ref())?;
                self.points(std::slice::from_ref(&t.xy))?;
                self.string(GdsRecordType::String, &t.string)?;
                self.properties(&t.properties)?;
            }
            GdsElement::GdsBox(b) => {
                self.empty(GdsRecordType::Box)?;
                self.i16(GdsRecordType::Layer, b.layer)?;
                self.i16(GdsRecordType::BoxType, b.boxtype)?;
                self.points(&b.xy)?;
                self.properties(&b.properties)?;
            }
        }
        self.empty(GdsRecordType::EndElement)
    }

    fn strans(&mut self, strans: Option<&GdsStrans>) -> GdsResult<()> {
        let Some(strans) = strans else {
            return Ok(());
        };
        self.record(GdsRecordType::Strans, GdsData::BitArray(strans.flags()))?;
        if let Some(mag) = strans.mag {
            self.record(GdsRecordType::Mag, GdsData::F64(vec![mag]))?;
        }
        if let Some(angle) = strans.angle {
            self.record(GdsRecordType::Angle, GdsData::F64(vec![angle]))?;
        }
        Ok(())
    }

    fn properties(&mut self, properties: &[GdsProperty]) -> GdsResult<()> {
        for prop in properties {
            self.i16(GdsRecordType::PropAttr, prop.attr)?;
            self.string(GdsRecordType::PropValue, &prop.value)?;
        }
        Ok(())
    }
}

/// Year (since 1900), month, day, hour, minute, second.
fn date_words(t: &NaiveDateTime) -> [i16; 6] {
    [
        (t.year() - 1900) as i16,
        t.month() as i16,
        t.day() as i16,
        t.hour() as i16,
        t.minute() as i16,
        t.second() as i16,
    ]
}
