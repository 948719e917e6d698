//! Streaming metadata extraction for PNG files.
//!
//! This crate walks a PNG chunk stream in a single forward pass and pulls out
//! the metadata-bearing chunks without touching pixel data:
//!
//! - `IHDR`: six raw header byte groups
//! - `tEXt`: keyword/text pairs
//! - `sRGB`, `iTXt`, `bKGD`: raw payloads
//! - `eXIf`: decoded into named EXIF tags under the `exif` key
//!
//! # Design Principles
//!
//! - **Streaming**: One forward scan over any `Read + Seek` source
//! - **Bounded reads**: Declared chunk lengths are checked against the
//!   stream before anything is allocated
//! - **All or nothing**: Extraction returns the complete mapping or one error
//!
//! # Quick Start
//!
//! ```no_run
//! use png_meta_io::{extract, ExtractOptions};
//!
//! # fn main() -> png_meta_io::Result<()> {
//! let metadata = extract("image.png", &ExtractOptions::new())?;
//!
//! for (key, value) in &metadata {
//!     println!("{key}: {value:?}");
//! }
//! if let Some(exif) = metadata.exif() {
//!     println!("EXIF sections: {}", exif.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Streams
//!
//! ```
//! use png_meta_io::{extract_from_stream, test_utils::PngBuilder, ExtractOptions};
//! use std::io::Cursor;
//!
//! # fn main() -> png_meta_io::Result<()> {
//! let png = PngBuilder::new().ihdr(16, 9).text("Title", "Hi").iend().build();
//! let metadata = extract_from_stream(Cursor::new(png), &ExtractOptions::new())?;
//!
//! assert_eq!(metadata.header().unwrap().width_px(), 16);
//! assert_eq!(metadata.text_entries()[0].keyword, "Title");
//! # Ok(())
//! # }
//! ```

mod chunk;
mod error;
pub mod exif;
mod extractor;
mod media_type;
mod metadata;
mod reader;
mod structure;
mod walker;

pub use chunk::{ChunkHeader, KnownChunk, MAX_CHUNK_LEN, PNG_SIGNATURE};
pub use error::{Error, Result};
pub use self::exif::{ExifDecoder, ExifTags, ExifValue};
pub use extractor::PngMetadataReader;
pub use media_type::{detect_image_type, ImageType};
pub use metadata::{merge_exif, MetadataMap, MetadataValue, PngMetadata, EXIF_KEY};
pub use reader::{ByteRange, ChunkPayload, ChunkReader};
pub use structure::{
    ChunkLocation, ChunkRecord, HeaderFields, RenderingIntent, Structure, TextEntry,
};
pub use walker::walk;

// Test utilities - only compiled for tests or when explicitly enabled
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::io::{Read, Seek};
use std::path::Path;

/// Extraction options
///
/// By default EXIF is decoded with no section filter.
///
/// # Example
///
/// ```
/// use png_meta_io::ExtractOptions;
///
/// let options = ExtractOptions::new().section_filter("IFD0,EXIF");
/// assert_eq!(options.section_filter.as_deref(), Some("IFD0,EXIF"));
/// assert!(options.decode_exif);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Comma-separated EXIF sections, passed to the decoder unmodified
    pub section_filter: Option<String>,

    /// Decode eXIf into the `exif` key; when off the raw bytes are kept
    /// under `eXIf`
    pub decode_exif: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            section_filter: None,
            decode_exif: true,
        }
    }
}

impl ExtractOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict EXIF decoding to the named sections
    pub fn section_filter(mut self, filter: impl Into<String>) -> Self {
        self.section_filter = Some(filter.into());
        self
    }

    /// Keep the raw eXIf payload instead of decoding it
    pub fn skip_exif(mut self) -> Self {
        self.decode_exif = false;
        self
    }
}

/// Extract metadata from a PNG file
///
/// # Errors
/// - `NotFound`: empty, missing or unreadable path
/// - `NotAPng`: the file does not sniff as PNG
/// - `MalformedSignature`, `TruncatedHeader`, `TruncatedPayload`,
///   `ChunkTooLarge`: malformed chunk stream
/// - `ExifDecodeFailure`: the eXIf payload could not be decoded
pub fn extract<P: AsRef<Path>>(path: P, options: &ExtractOptions) -> Result<PngMetadata> {
    PngMetadataReader::new()
        .with_options(options.clone())
        .read_path(path)
}

/// Extract metadata, reporting any failure as `None`
///
/// Runs the same validation as [`extract`]; the error is logged at debug
/// level and dropped.
pub fn try_extract<P: AsRef<Path>>(path: P, options: &ExtractOptions) -> Option<PngMetadata> {
    PngMetadataReader::new()
        .with_options(options.clone())
        .try_read_path(path)
}

/// Extract metadata from a stream positioned at the PNG signature
pub fn extract_from_stream<R: Read + Seek>(
    source: R,
    options: &ExtractOptions,
) -> Result<PngMetadata> {
    PngMetadataReader::new()
        .with_options(options.clone())
        .read(source)
}

/// Check whether a file sniffs as PNG
pub fn is_png<P: AsRef<Path>>(path: P) -> Result<bool> {
    Ok(detect_image_type(path)? == ImageType::Png)
}
