//! Image type sniffing
//!
//! Classifies a file by its leading magic bytes. Only PNG proceeds to chunk
//! walking; the other types exist so callers get a useful answer from
//! [`detect_image_type`] instead of a bare "not PNG".

use crate::{
    chunk::PNG_SIGNATURE,
    error::{Error, Result},
};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of leading bytes the sniffer looks at
const SNIFF_LEN: usize = 12;

/// Detected image type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    WebP,
    /// Anything we don't recognize
    Unknown,
}

impl ImageType {
    /// Classify from the first bytes of a file
    pub fn detect(header: &[u8]) -> Self {
        if is_png_signature(header) {
            Self::Png
        } else if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if header.starts_with(b"GIF87a") || header.starts_with(b"GIF89a") {
            Self::Gif
        } else if header.starts_with(b"BM") {
            Self::Bmp
        } else if header.starts_with(b"II*\0") || header.starts_with(b"MM\0*") {
            Self::Tiff
        } else if header.len() >= 12 && &header[0..4] == b"RIFF" && &header[8..12] == b"WEBP" {
            Self::WebP
        } else {
            Self::Unknown
        }
    }

    /// Get the primary MIME type for this image type
    ///
    /// # Example
    ///
    /// ```
    /// use png_meta_io::ImageType;
    ///
    /// assert_eq!(ImageType::Png.to_mime(), "image/png");
    /// ```
    pub fn to_mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::WebP => "image/webp",
            Self::Unknown => "application/octet-stream",
        }
    }

    /// Get the primary file extension (without dot)
    pub fn to_extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Tiff => "tif",
            Self::WebP => "webp",
            Self::Unknown => "",
        }
    }
}

impl std::fmt::Display for ImageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_mime())
    }
}

/// Check whether a header starts with the PNG signature
pub fn is_png_signature(header: &[u8]) -> bool {
    header.starts_with(&PNG_SIGNATURE)
}

/// Sniff the image type of a file on disk
///
/// Fails with [`Error::NotFound`] for an empty path or one that cannot be
/// opened. Short files are classified from whatever bytes they have.
pub fn detect_image_type<P: AsRef<Path>>(path: P) -> Result<ImageType> {
    let file = open_existing(path.as_ref())?;
    let mut header = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut header)?;
    Ok(ImageType::detect(&header))
}

/// Open a file, mapping a missing or unreadable path to [`Error::NotFound`]
pub(crate) fn open_existing(path: &Path) -> Result<File> {
    if path.as_os_str().is_empty() {
        return Err(Error::NotFound("path is required".into()));
    }
    if !path.is_file() {
        return Err(Error::NotFound(path.display().to_string()));
    }
    File::open(path).map_err(|e| {
        log::debug!("Cannot open {}: {}", path.display(), e);
        Error::NotFound(path.display().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from_header() {
        assert_eq!(ImageType::detect(b"\x89PNG\r\n\x1a\n\0\0\0\r"), ImageType::Png);
        assert_eq!(ImageType::detect(&[0xFF, 0xD8, 0xFF, 0xE0]), ImageType::Jpeg);
        assert_eq!(ImageType::detect(b"GIF89a"), ImageType::Gif);
        assert_eq!(ImageType::detect(b"MM\0*\0\0\0\x08"), ImageType::Tiff);
        assert_eq!(ImageType::detect(b"RIFF\0\0\0\0WEBPVP8 "), ImageType::WebP);
        assert_eq!(ImageType::detect(b"\x89PNG"), ImageType::Unknown);
        assert_eq!(ImageType::detect(b""), ImageType::Unknown);
    }

    #[test]
    fn test_signature_check() {
        assert!(is_png_signature(b"\x89PNG\r\n\x1a\n...."));
        assert!(!is_png_signature(b"\x89PNG\r\n\x1a"));
        assert!(!is_png_signature(b"GIF89a\0\0"));
    }

    #[test]
    fn test_empty_path_not_found() {
        assert!(matches!(detect_image_type(""), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_missing_path_not_found() {
        let result = detect_image_type("/definitely/not/here.png");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_display_is_mime() {
        assert_eq!(ImageType::Png.to_string(), "image/png");
        assert_eq!(ImageType::Jpeg.to_extension(), "jpg");
    }
}
