//! PNG chunk headers and the closed set of chunk kinds we extract

use byteorder::{BigEndian, ReadBytesExt};
use std::io::Read;

/// PNG signature: 89 50 4E 47 0D 0A 1A 0A
pub const PNG_SIGNATURE: [u8; 8] = *b"\x89PNG\r\n\x1a\n";

/// Size of a chunk header: length (4) + type (4)
pub const CHUNK_HEADER_LEN: u64 = 8;

/// Size of the trailing CRC of every chunk
pub const CHUNK_CRC_LEN: u64 = 4;

/// Largest chunk length the PNG format allows (2^31 - 1)
pub const MAX_CHUNK_LEN: u32 = 0x7FFF_FFFF;

/// The 8-byte header in front of every chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Payload byte count (excludes header and CRC)
    pub length: u32,
    /// Four ASCII letters
    pub tag: [u8; 4],
}

impl ChunkHeader {
    /// Read a header from the current stream position
    pub(crate) fn read_from<R: Read>(source: &mut R) -> std::io::Result<Self> {
        let length = source.read_u32::<BigEndian>()?;
        let mut tag = [0u8; 4];
        source.read_exact(&mut tag)?;
        Ok(Self { length, tag })
    }

    /// The tag as text; non-ASCII bytes are replaced
    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }

    /// Classify the tag, `None` for anything we skip
    pub fn kind(&self) -> Option<KnownChunk> {
        KnownChunk::from_tag(&self.tag)
    }

    /// Bytes from the start of the payload to the start of the next header
    pub fn skip_len(&self) -> u64 {
        self.length as u64 + CHUNK_CRC_LEN
    }
}

/// Chunk types the walker recognizes
///
/// Anything else is skipped without being stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KnownChunk {
    /// Image header
    Ihdr,
    /// Uncompressed Latin-1 keyword/text pair
    Text,
    /// Embedded EXIF/TIFF blob
    Exif,
    /// Standard RGB color space marker
    Srgb,
    /// International (UTF-8) text
    Itxt,
    /// Background color
    Bkgd,
    /// End of the chunk stream
    Iend,
}

impl KnownChunk {
    /// All known chunks, in no particular order
    pub const ALL: [KnownChunk; 7] = [
        KnownChunk::Ihdr,
        KnownChunk::Text,
        KnownChunk::Exif,
        KnownChunk::Srgb,
        KnownChunk::Itxt,
        KnownChunk::Bkgd,
        KnownChunk::Iend,
    ];

    /// Map a raw tag to a known chunk (case-sensitive, as PNG requires)
    pub fn from_tag(tag: &[u8; 4]) -> Option<Self> {
        match tag {
            b"IHDR" => Some(Self::Ihdr),
            b"tEXt" => Some(Self::Text),
            b"eXIf" => Some(Self::Exif),
            b"sRGB" => Some(Self::Srgb),
            b"iTXt" => Some(Self::Itxt),
            b"bKGD" => Some(Self::Bkgd),
            b"IEND" => Some(Self::Iend),
            _ => None,
        }
    }

    /// The four-letter tag
    pub fn tag(&self) -> &'static [u8; 4] {
        match self {
            Self::Ihdr => b"IHDR",
            Self::Text => b"tEXt",
            Self::Exif => b"eXIf",
            Self::Srgb => b"sRGB",
            Self::Itxt => b"iTXt",
            Self::Bkgd => b"bKGD",
            Self::Iend => b"IEND",
        }
    }

    /// The tag as a string, used as the metadata key
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ihdr => "IHDR",
            Self::Text => "tEXt",
            Self::Exif => "eXIf",
            Self::Srgb => "sRGB",
            Self::Itxt => "iTXt",
            Self::Bkgd => "bKGD",
            Self::Iend => "IEND",
        }
    }
}

impl std::fmt::Display for KnownChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
