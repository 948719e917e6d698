//! EXIF decoding for eXIf payloads
//!
//! The walker only captures the raw eXIf bytes. Turning them into named tags
//! goes through the [`ExifDecoder`] trait so callers can plug in their own
//! decoder; with the `exif` feature the default is [`KamadakExifDecoder`].
//!
//! Decoded tags are grouped by section:
//! - `IFD0`, `EXIF`, `GPS`, `INTEROP`: primary image tags by directory
//! - `THUMBNAIL`: IFD1 tags
//! - `FILE`: `FileSize`, `SectionsFound`
//! - `COMPUTED`: values derived from the tags (`ByteOrderMotorola`, ...)

use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Decoded tags, keyed by name
pub type ExifTags = BTreeMap<String, ExifValue>;

/// A decoded EXIF value
#[derive(Debug, Clone, PartialEq)]
pub enum ExifValue {
    /// ASCII tag (multiple strings joined with ", ")
    Text(String),
    /// BYTE/SHORT/LONG components
    Unsigned(Vec<u64>),
    /// SBYTE/SSHORT/SLONG components
    Signed(Vec<i64>),
    /// RATIONAL components as (numerator, denominator)
    Rational(Vec<(u32, u32)>),
    /// SRATIONAL components as (numerator, denominator)
    SignedRational(Vec<(i32, i32)>),
    /// FLOAT/DOUBLE components
    Float(Vec<f64>),
    /// UNDEFINED or raw BYTE data
    Bytes(Vec<u8>),
    /// A nested section of tags
    Section(ExifTags),
}

impl ExifValue {
    /// The text, for ASCII values
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The nested tags, for section values
    pub fn as_section(&self) -> Option<&ExifTags> {
        match self {
            Self::Section(tags) => Some(tags),
            _ => None,
        }
    }
}

/// Decodes a raw TIFF-structured EXIF blob into named tags
///
/// `section_filter` is passed through unmodified from the caller.
/// Implemented for closures with the same signature.
pub trait ExifDecoder: Send + Sync {
    /// Decode `raw`, restricted by the optional section filter
    fn decode(&self, raw: &[u8], section_filter: Option<&str>) -> Result<ExifTags>;
}

impl<F> ExifDecoder for F
where
    F: Fn(&[u8], Option<&str>) -> Result<ExifTags> + Send + Sync,
{
    fn decode(&self, raw: &[u8], section_filter: Option<&str>) -> Result<ExifTags> {
        self(raw, section_filter)
    }
}

/// EXIF sections a filter can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    File,
    Computed,
    /// Any tag-bearing section
    AnyTag,
    Ifd0,
    Exif,
    Gps,
    Interop,
    Thumbnail,
}

impl Section {
    /// Sections that hold tags read from the blob
    pub const TAG_SECTIONS: [Section; 5] = [
        Section::Ifd0,
        Section::Exif,
        Section::Gps,
        Section::Interop,
        Section::Thumbnail,
    ];

    /// Section name as used in filters and output keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "FILE",
            Self::Computed => "COMPUTED",
            Self::AnyTag => "ANY_TAG",
            Self::Ifd0 => "IFD0",
            Self::Exif => "EXIF",
            Self::Gps => "GPS",
            Self::Interop => "INTEROP",
            Self::Thumbnail => "THUMBNAIL",
        }
    }

    /// Parse a section name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let section = match name.to_ascii_uppercase().as_str() {
            "FILE" => Self::File,
            "COMPUTED" => Self::Computed,
            "ANY_TAG" => Self::AnyTag,
            "IFD0" => Self::Ifd0,
            "EXIF" => Self::Exif,
            "GPS" => Self::Gps,
            "INTEROP" => Self::Interop,
            "THUMBNAIL" => Self::Thumbnail,
            _ => return None,
        };
        Some(section)
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parsed section filter: a comma-separated list of section names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionFilter {
    sections: BTreeSet<Section>,
}

impl SectionFilter {
    /// Parse a filter string; `None` or a blank string means no filter
    pub fn parse(filter: Option<&str>) -> Result<Option<Self>> {
        let Some(filter) = filter else {
            return Ok(None);
        };

        let mut sections = BTreeSet::new();
        for name in filter.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let section = Section::from_name(name).ok_or_else(|| {
                Error::ExifDecodeFailure(format!("Unknown EXIF section: {}", name))
            })?;
            sections.insert(section);
        }

        Ok(if sections.is_empty() {
            None
        } else {
            Some(Self { sections })
        })
    }

    /// Whether the filter asks for this section
    pub fn includes(&self, section: Section) -> bool {
        if self.sections.contains(&section) {
            return true;
        }
        self.sections.contains(&Section::AnyTag) && Section::TAG_SECTIONS.contains(&section)
    }

    /// Apply to decoded sections: every named section must be present
    pub fn apply(
        &self,
        mut found: BTreeMap<Section, ExifTags>,
    ) -> Result<BTreeMap<Section, ExifTags>> {
        for &section in &self.sections {
            let present = match section {
                Section::AnyTag => Section::TAG_SECTIONS.iter().any(|s| found.contains_key(s)),
                section => found.contains_key(&section),
            };
            if !present {
                return Err(Error::ExifDecodeFailure(format!(
                    "Required EXIF section not found: {}",
                    section
                )));
            }
        }
        found.retain(|section, _| self.includes(*section));
        Ok(found)
    }
}

/// Turn decoded sections into the nested tag mapping
pub fn sections_to_tags(sections: BTreeMap<Section, ExifTags>) -> ExifTags {
    sections
        .into_iter()
        .map(|(section, tags)| (section.as_str().to_string(), ExifValue::Section(tags)))
        .collect()
}

/// Fallback used when no EXIF decoder is available
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExifDecoder;

impl ExifDecoder for NoExifDecoder {
    fn decode(&self, _raw: &[u8], _section_filter: Option<&str>) -> Result<ExifTags> {
        Err(Error::ExifDecodeFailure(
            "EXIF decoding is not available in this build".into(),
        ))
    }
}

/// The decoder used when none is supplied
pub fn default_decoder() -> Box<dyn ExifDecoder> {
    #[cfg(feature = "exif")]
    {
        Box::new(KamadakExifDecoder)
    }
    #[cfg(not(feature = "exif"))]
    {
        Box::new(NoExifDecoder)
    }
}

#[cfg(feature = "exif")]
pub use kamadak::KamadakExifDecoder;

#[cfg(feature = "exif")]
mod kamadak {
    use super::*;
    use ::exif::{Context, Field, In, Reader, Tag, Value};

    /// EXIF decoder backed by the `kamadak-exif` crate
    #[derive(Debug, Default, Clone, Copy)]
    pub struct KamadakExifDecoder;

    impl ExifDecoder for KamadakExifDecoder {
        fn decode(&self, raw: &[u8], section_filter: Option<&str>) -> Result<ExifTags> {
            let filter = SectionFilter::parse(section_filter)?;

            let exif = Reader::new()
                .read_raw(raw.to_vec())
                .map_err(|e| Error::ExifDecodeFailure(e.to_string()))?;

            let mut sections: BTreeMap<Section, ExifTags> = BTreeMap::new();
            for field in exif.fields() {
                sections
                    .entry(section_of(field))
                    .or_default()
                    .insert(tag_name(field.tag), convert(field));
            }

            let found: Vec<&str> = sections.keys().map(Section::as_str).collect();
            let mut file = ExifTags::new();
            file.insert("FileSize".into(), ExifValue::Unsigned(vec![raw.len() as u64]));
            file.insert("SectionsFound".into(), ExifValue::Text(found.join(", ")));

            let mut computed = ExifTags::new();
            computed.insert(
                "ByteOrderMotorola".into(),
                ExifValue::Unsigned(vec![u64::from(!exif.little_endian())]),
            );
            if let Some(Value::Rational(v)) =
                exif.get_field(Tag::FNumber, In::PRIMARY).map(|f| &f.value)
            {
                if let Some(r) = v.first().filter(|r| r.denom != 0) {
                    computed.insert(
                        "ApertureFNumber".into(),
                        ExifValue::Text(format!("f/{:.1}", r.to_f64())),
                    );
                }
            }
            if exif
                .get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)
                .is_some()
            {
                computed.insert(
                    "Thumbnail.MimeType".into(),
                    ExifValue::Text("image/jpeg".into()),
                );
            }

            sections.insert(Section::File, file);
            sections.insert(Section::Computed, computed);

            let sections = match filter {
                Some(filter) => filter.apply(sections)?,
                None => sections,
            };
            log::trace!("Decoded EXIF sections: {}", found.join(", "));
            Ok(sections_to_tags(sections))
        }
    }

    fn section_of(field: &Field) -> Section {
        if field.ifd_num != In::PRIMARY {
            return Section::Thumbnail;
        }
        #[allow(unreachable_patterns)]
        match field.tag.context() {
            Context::Tiff => Section::Ifd0,
            Context::Exif => Section::Exif,
            Context::Gps => Section::Gps,
            Context::Interop => Section::Interop,
            _ => Section::Ifd0,
        }
    }

    fn tag_name(tag: Tag) -> String {
        let name = tag.to_string();
        if name.starts_with("Tag(") {
            format!("UndefinedTag:0x{:04X}", tag.number())
        } else {
            name
        }
    }

    fn convert(field: &Field) -> ExifValue {
        match &field.value {
            Value::Byte(v) => ExifValue::Bytes(v.clone()),
            Value::Undefined(v, _) => ExifValue::Bytes(v.clone()),
            Value::Ascii(v) => ExifValue::Text(
                v.iter()
                    .map(|s| String::from_utf8_lossy(s).into_owned())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Value::Short(v) => ExifValue::Unsigned(v.iter().map(|&n| n as u64).collect()),
            Value::Long(v) => ExifValue::Unsigned(v.iter().map(|&n| n as u64).collect()),
            Value::SByte(v) => ExifValue::Signed(v.iter().map(|&n| n as i64).collect()),
            Value::SShort(v) => ExifValue::Signed(v.iter().map(|&n| n as i64).collect()),
            Value::SLong(v) => ExifValue::Signed(v.iter().map(|&n| n as i64).collect()),
            Value::Rational(v) => {
                ExifValue::Rational(v.iter().map(|r| (r.num, r.denom)).collect())
            }
            Value::SRational(v) => {
                ExifValue::SignedRational(v.iter().map(|r| (r.num, r.denom)).collect())
            }
            Value::Float(v) => ExifValue::Float(v.iter().map(|&n| n as f64).collect()),
            Value::Double(v) => ExifValue::Float(v.clone()),
            _ => ExifValue::Text(field.display_value().to_string()),
        }
    }
}
