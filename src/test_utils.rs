//! Test utilities for building synthetic PNG streams.
//!
//! This module provides helpers for tests and fuzz seeds, including:
//! - [`PngBuilder`] for assembling chunk streams byte by byte
//! - [`minimal_tiff`] for a small valid EXIF/TIFF blob
//! - Ready-made streams ([`minimal_png`], [`annotated_png`])
//! - [`write_fixture`] for path-based tests
//!
//! # Usage
//!
//! ```
//! use png_meta_io::test_utils::*;
//!
//! let png = PngBuilder::new()
//!     .ihdr(2, 2)
//!     .text("Title", "Hi")
//!     .exif(&minimal_tiff())
//!     .iend()
//!     .build();
//! assert!(png.starts_with(b"\x89PNG"));
//! ```

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use crate::chunk::PNG_SIGNATURE;

/// Builds a PNG byte stream chunk by chunk
///
/// Chunks get real CRCs so the output is also readable by strict decoders.
#[derive(Debug, Clone)]
pub struct PngBuilder {
    data: Vec<u8>,
}

impl Default for PngBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PngBuilder {
    /// Start with the PNG signature
    pub fn new() -> Self {
        Self {
            data: PNG_SIGNATURE.to_vec(),
        }
    }

    /// Start with arbitrary leading bytes instead of the signature
    pub fn with_signature(signature: &[u8]) -> Self {
        Self {
            data: signature.to_vec(),
        }
    }

    /// Append a chunk with the given tag and payload
    pub fn chunk(mut self, tag: &[u8; 4], payload: &[u8]) -> Self {
        self.data
            .extend_from_slice(&(payload.len() as u32).to_be_bytes());
        self.data.extend_from_slice(tag);
        self.data.extend_from_slice(payload);
        self.data
            .extend_from_slice(&calculate_crc(tag, payload).to_be_bytes());
        self
    }

    /// Append an IHDR for an 8-bit RGB, non-interlaced image
    pub fn ihdr(self, width: u32, height: u32) -> Self {
        let mut payload = Vec::with_capacity(13);
        payload.extend_from_slice(&width.to_be_bytes());
        payload.extend_from_slice(&height.to_be_bytes());
        payload.extend_from_slice(&[
            0x08, // Bit depth: 8
            0x02, // Color type: RGB
            0x00, // Compression: deflate
            0x00, // Filter: adaptive
            0x00, // Interlace: none
        ]);
        self.chunk(b"IHDR", &payload)
    }

    /// Append a tEXt chunk (ASCII keyword and text)
    pub fn text(self, keyword: &str, text: &str) -> Self {
        let mut payload = keyword.as_bytes().to_vec();
        payload.push(0);
        payload.extend_from_slice(text.as_bytes());
        self.chunk(b"tEXt", &payload)
    }

    /// Append an eXIf chunk
    pub fn exif(self, tiff: &[u8]) -> Self {
        self.chunk(b"eXIf", tiff)
    }

    /// Append an sRGB chunk
    pub fn srgb(self, intent: u8) -> Self {
        self.chunk(b"sRGB", &[intent])
    }

    /// Append the IEND chunk
    pub fn iend(self) -> Self {
        self.chunk(b"IEND", &[])
    }

    /// Append raw bytes without chunk framing
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    /// Finish and return the bytes
    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

/// CRC32 over chunk type and data, as PNG defines it
pub fn calculate_crc(chunk_type: &[u8], data: &[u8]) -> u32 {
    let mut crc = 0xFFFFFFFF_u32;

    for &byte in chunk_type.iter().chain(data) {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
        }
    }

    crc ^ 0xFFFFFFFF
}

/// Little-endian TIFF with IFD0 holding Make = "Acme" and Orientation = 1
pub fn minimal_tiff() -> Vec<u8> {
    let mut tiff = Vec::with_capacity(43);
    tiff.extend_from_slice(b"II*\0");
    tiff.extend_from_slice(&8u32.to_le_bytes()); // IFD0 offset

    tiff.extend_from_slice(&2u16.to_le_bytes()); // tag count

    // Make: ASCII, 5 bytes at offset 38
    tiff.extend_from_slice(&0x010Fu16.to_le_bytes());
    tiff.extend_from_slice(&2u16.to_le_bytes());
    tiff.extend_from_slice(&5u32.to_le_bytes());
    tiff.extend_from_slice(&38u32.to_le_bytes());

    // Orientation: SHORT, inline value 1
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());

    tiff.extend_from_slice(&0u32.to_le_bytes()); // no IFD1
    tiff.extend_from_slice(b"Acme\0");
    tiff
}

/// Signature, 1x1 IHDR and IEND
pub fn minimal_png() -> Vec<u8> {
    PngBuilder::new().ihdr(1, 1).iend().build()
}

/// IHDR, tEXt("Title", "Hi"), eXIf(minimal TIFF), IEND
pub fn annotated_png() -> Vec<u8> {
    PngBuilder::new()
        .ihdr(1, 1)
        .text("Title", "Hi")
        .exif(&minimal_tiff())
        .iend()
        .build()
}

/// Write fixture bytes into `dir` and return the path
pub fn write_fixture(dir: &Path, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    let path = dir.join(file_name);
    fs::write(&path, bytes)?;
    Ok(path)
}
