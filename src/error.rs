//! Error types for png-meta-io

use std::io;

/// Result type for png-meta-io operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting PNG metadata
///
/// Every variant is terminal for the extraction that produced it; there is
/// no partial-result mode.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input path is empty, does not exist, or cannot be opened
    #[error("File not found: {0}")]
    NotFound(String),

    /// The type sniffer did not classify the input as PNG
    #[error("File is not a PNG (detected {0})")]
    NotAPng(crate::ImageType),

    /// The first 8 bytes are not the PNG signature
    #[error("Invalid PNG file signature")]
    MalformedSignature,

    /// The stream ended inside a chunk header
    #[error("Truncated chunk header at offset {offset}: {available} of 8 bytes available")]
    TruncatedHeader { offset: u64, available: u64 },

    /// A chunk declares more payload than the stream holds
    #[error(
        "Truncated {tag} chunk at offset {offset}: needs {needed} bytes, {available} available"
    )]
    TruncatedPayload {
        offset: u64,
        tag: String,
        needed: u64,
        available: u64,
    },

    /// A chunk length exceeds the PNG maximum of 2^31 - 1 but fits in the stream
    #[error("Chunk length too large at offset {offset}: {length}")]
    ChunkTooLarge { offset: u64, length: u32 },

    /// The EXIF decoder rejected the eXIf payload
    #[error("EXIF decode failure: {0}")]
    ExifDecodeFailure(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// True for the two truncation kinds (header or payload)
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            Error::TruncatedHeader { .. } | Error::TruncatedPayload { .. }
        )
    }
}
