//! PNG metadata extraction entry point
//!
//! Ties the walker, the assembler and the EXIF decoder together behind one
//! configurable reader.

use crate::{
    error::{Error, Result},
    exif::{default_decoder, ExifDecoder},
    media_type::{detect_image_type, open_existing, ImageType},
    metadata::{assemble, PngMetadata},
    walker::walk,
    ExtractOptions,
};
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// Extracts metadata from PNG files and streams
///
/// # Example
///
/// ```no_run
/// use png_meta_io::{ExtractOptions, PngMetadataReader};
///
/// # fn main() -> png_meta_io::Result<()> {
/// let reader = PngMetadataReader::new()
///     .with_options(ExtractOptions::new().section_filter("IFD0"));
///
/// let metadata = reader.read_path("image.png")?;
/// for entry in metadata.text_entries() {
///     println!("{}: {}", entry.keyword, entry.text);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PngMetadataReader {
    options: ExtractOptions,
    decoder: Box<dyn ExifDecoder>,
}

impl Default for PngMetadataReader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PngMetadataReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PngMetadataReader")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl PngMetadataReader {
    /// Reader with default options and the default EXIF decoder
    pub fn new() -> Self {
        Self {
            options: ExtractOptions::default(),
            decoder: default_decoder(),
        }
    }

    /// Replace the extraction options
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a custom EXIF decoder
    pub fn with_decoder<D: ExifDecoder + 'static>(mut self, decoder: D) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Current options
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract from a stream positioned at the PNG signature
    ///
    /// No type sniffing happens here; a non-PNG stream fails with
    /// [`Error::MalformedSignature`].
    pub fn read<R: Read + Seek>(&self, source: R) -> Result<PngMetadata> {
        let structure = walk(source)?;
        log::debug!(
            "Walked {} chunks (IEND found: {})",
            structure.chunks.len(),
            structure.found_iend
        );
        assemble(structure, &self.options, self.decoder.as_ref())
    }

    /// Extract from a file on disk
    ///
    /// The file must exist and sniff as PNG. It is closed before this
    /// returns, on success and on every error.
    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<PngMetadata> {
        let path = path.as_ref();
        match detect_image_type(path)? {
            ImageType::Png => {}
            other => return Err(Error::NotAPng(other)),
        }
        let file = open_existing(path)?;
        self.read(BufReader::new(file))
    }

    /// Like [`read_path`](Self::read_path), but reports any failure as `None`
    pub fn try_read_path<P: AsRef<Path>>(&self, path: P) -> Option<PngMetadata> {
        let path = path.as_ref();
        self.read_path(path)
            .inspect_err(|e| log::debug!("No metadata from {}: {}", path.display(), e))
            .ok()
    }
}
