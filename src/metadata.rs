//! Metadata assembly
//!
//! Folds a walked [`Structure`] into the sorted key/value mapping handed to
//! callers. Keys are chunk tags (`IHDR`, `tEXt`, `sRGB`, `iTXt`, `bKGD`) plus
//! `exif` for decoded eXIf tags.

use crate::{
    chunk::KnownChunk,
    error::{Error, Result},
    exif::{ExifDecoder, ExifTags},
    structure::{HeaderFields, Structure, TextEntry},
    ExtractOptions,
};
use std::collections::BTreeMap;

/// Key holding decoded EXIF tags
pub const EXIF_KEY: &str = "exif";

/// Sorted metadata mapping
pub type MetadataMap = BTreeMap<String, MetadataValue>;

/// One value in the metadata mapping
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    /// IHDR byte groups
    Header(HeaderFields),
    /// All tEXt entries, in file order
    Text(Vec<TextEntry>),
    /// Raw payload of a single-buffer chunk
    Bytes(Vec<u8>),
    /// Decoded EXIF tags
    Exif(ExifTags),
}

/// Metadata extracted from one PNG
///
/// Iterating yields entries in key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PngMetadata {
    map: MetadataMap,
}

impl PngMetadata {
    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.map.get(key)
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// Entries in key order
    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, MetadataValue> {
        self.map.iter()
    }

    /// Number of top-level keys
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no metadata was found
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// IHDR groups
    pub fn header(&self) -> Option<&HeaderFields> {
        match self.map.get(KnownChunk::Ihdr.as_str()) {
            Some(MetadataValue::Header(fields)) => Some(fields),
            _ => None,
        }
    }

    /// tEXt entries (empty when the file has none)
    pub fn text_entries(&self) -> &[TextEntry] {
        match self.map.get(KnownChunk::Text.as_str()) {
            Some(MetadataValue::Text(entries)) => entries,
            _ => &[],
        }
    }

    /// Decoded EXIF tags
    pub fn exif(&self) -> Option<&ExifTags> {
        match self.map.get(EXIF_KEY) {
            Some(MetadataValue::Exif(tags)) => Some(tags),
            _ => None,
        }
    }

    /// Raw payload stored for a chunk kind
    pub fn raw(&self, kind: KnownChunk) -> Option<&[u8]> {
        match self.map.get(kind.as_str()) {
            Some(MetadataValue::Bytes(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// Borrow the underlying mapping
    pub fn as_map(&self) -> &MetadataMap {
        &self.map
    }

    /// Take the underlying mapping
    pub fn into_map(self) -> MetadataMap {
        self.map
    }
}

impl IntoIterator for PngMetadata {
    type Item = (String, MetadataValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, MetadataValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.into_iter()
    }
}

impl<'a> IntoIterator for &'a PngMetadata {
    type Item = (&'a String, &'a MetadataValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, MetadataValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

/// Union of two tag mappings; `newer` wins on conflicting keys
pub fn merge_exif(mut existing: ExifTags, newer: ExifTags) -> ExifTags {
    existing.extend(newer);
    existing
}

/// Build the final mapping from a walked structure
pub fn assemble(
    structure: Structure,
    options: &ExtractOptions,
    decoder: &dyn ExifDecoder,
) -> Result<PngMetadata> {
    let (header, text, raw) = structure.into_parts();
    let mut map = MetadataMap::new();

    if let Some(fields) = header {
        map.insert(KnownChunk::Ihdr.as_str().into(), MetadataValue::Header(fields));
    }
    if !text.is_empty() {
        map.insert(KnownChunk::Text.as_str().into(), MetadataValue::Text(text));
    }

    for (kind, bytes) in raw {
        if kind == KnownChunk::Exif && options.decode_exif {
            let decoded = decoder
                .decode(&bytes, options.section_filter.as_deref())
                .map_err(|e| match e {
                    Error::ExifDecodeFailure(_) => e,
                    other => Error::ExifDecodeFailure(other.to_string()),
                })?;
            let existing = match map.remove(EXIF_KEY) {
                Some(MetadataValue::Exif(tags)) => tags,
                _ => ExifTags::new(),
            };
            map.insert(
                EXIF_KEY.into(),
                MetadataValue::Exif(merge_exif(existing, decoded)),
            );
        } else {
            map.insert(kind.as_str().into(), MetadataValue::Bytes(bytes));
        }
    }

    log::debug!(
        "Assembled PNG metadata: {}",
        map.keys().cloned().collect::<Vec<_>>().join(", ")
    );
    Ok(PngMetadata { map })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{exif::ExifValue, structure::ChunkRecord};

    fn fixed_decoder(raw: &[u8], _filter: Option<&str>) -> Result<ExifTags> {
        Ok(ExifTags::from([(
            "Size".to_string(),
            ExifValue::Unsigned(vec![raw.len() as u64]),
        )]))
    }

    fn sample_structure() -> Structure {
        let mut structure = Structure::new();
        structure.add_record(ChunkRecord::Raw {
            kind: KnownChunk::Srgb,
            bytes: vec![0],
        });
        structure.add_record(ChunkRecord::Raw {
            kind: KnownChunk::Exif,
            bytes: vec![1, 2, 3],
        });
        structure.add_record(ChunkRecord::Text(TextEntry::from_payload(b"Title\0Hi")));
        structure
    }

    #[test]
    fn test_keys_sorted() {
        let metadata =
            assemble(sample_structure(), &ExtractOptions::new(), &fixed_decoder).unwrap();
        let keys: Vec<_> = metadata.keys().collect();
        assert_eq!(keys, ["exif", "sRGB", "tEXt"]);
        assert_eq!(metadata.len(), 3);
        assert!(!metadata.is_empty());
        assert_eq!(
            metadata.exif().unwrap()["Size"],
            ExifValue::Unsigned(vec![3])
        );
        assert!(metadata.raw(KnownChunk::Exif).is_none());
    }

    #[test]
    fn test_exif_decoding_disabled_keeps_raw() {
        let options = ExtractOptions::new().skip_exif();
        let metadata = assemble(sample_structure(), &options, &fixed_decoder).unwrap();
        assert!(metadata.exif().is_none());
        assert_eq!(metadata.raw(KnownChunk::Exif), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn test_decoder_error_is_fatal() {
        let failing = |_: &[u8], _: Option<&str>| -> Result<ExifTags> {
            Err(Error::Io(std::io::ErrorKind::InvalidData.into()))
        };
        let err = assemble(sample_structure(), &ExtractOptions::new(), &failing).unwrap_err();
        assert!(matches!(err, Error::ExifDecodeFailure(_)));
    }

    #[test]
    fn test_filter_passed_through() {
        let echo = |_: &[u8], filter: Option<&str>| -> Result<ExifTags> {
            Ok(ExifTags::from([(
                "Filter".to_string(),
                ExifValue::Text(filter.unwrap_or("none").to_string()),
            )]))
        };
        let options = ExtractOptions::new().section_filter("IFD0,gps");
        let metadata = assemble(sample_structure(), &options, &echo).unwrap();
        assert_eq!(
            metadata.exif().unwrap()["Filter"].as_text(),
            Some("IFD0,gps")
        );
    }

    #[test]
    fn test_merge_newer_wins() {
        let existing = ExifTags::from([
            ("A".to_string(), ExifValue::Text("old".into())),
            ("B".to_string(), ExifValue::Text("kept".into())),
        ]);
        let newer = ExifTags::from([
            ("A".to_string(), ExifValue::Text("new".into())),
            ("C".to_string(), ExifValue::Text("added".into())),
        ]);
        let merged = merge_exif(existing, newer);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged["A"].as_text(), Some("new"));
        assert_eq!(merged["B"].as_text(), Some("kept"));
    }

    #[test]
    fn test_empty_structure() {
        let metadata =
            assemble(Structure::new(), &ExtractOptions::new(), &fixed_decoder).unwrap();
        assert!(metadata.is_empty());
        assert!(metadata.text_entries().is_empty());
        assert!(metadata.header().is_none());
    }
}
