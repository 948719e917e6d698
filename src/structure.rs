//! Structure representation for a walked chunk stream

use crate::{chunk::KnownChunk, reader::ByteRange};
use std::collections::BTreeMap;

/// IHDR fields as six raw byte groups
///
/// Width and height stay as their raw 4-byte groups; the four single bytes
/// follow in file order. The interlace byte is not part of the groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeaderFields {
    /// Width, raw big-endian bytes
    pub width: [u8; 4],
    /// Height, raw big-endian bytes
    pub height: [u8; 4],
    pub bit_depth: u8,
    pub color_type: u8,
    pub compression_method: u8,
    pub filter_method: u8,
}

impl HeaderFields {
    /// Number of bytes the six groups cover
    pub const LEN: usize = 12;

    /// The six groups in file order
    pub fn groups(&self) -> [&[u8]; 6] {
        [
            &self.width[..],
            &self.height[..],
            std::slice::from_ref(&self.bit_depth),
            std::slice::from_ref(&self.color_type),
            std::slice::from_ref(&self.compression_method),
            std::slice::from_ref(&self.filter_method),
        ]
    }

    /// Width in pixels
    pub fn width_px(&self) -> u32 {
        u32::from_be_bytes(self.width)
    }

    /// Height in pixels
    pub fn height_px(&self) -> u32 {
        u32::from_be_bytes(self.height)
    }
}

/// One tEXt keyword/text pair, decoded from ISO-8859-1
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextEntry {
    pub keyword: String,
    pub text: String,
}

impl TextEntry {
    /// Split a tEXt payload on its first NUL byte
    ///
    /// Without a NUL the whole payload is the keyword.
    pub fn from_payload(payload: &[u8]) -> Self {
        let (keyword, text) = match payload.iter().position(|&b| b == 0) {
            Some(nul) => (&payload[..nul], &payload[nul + 1..]),
            None => (payload, &[][..]),
        };
        Self {
            keyword: latin1(keyword),
            text: latin1(text),
        }
    }
}

// Every byte maps to the code point of the same value.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// sRGB rendering intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderingIntent {
    Perceptual,
    RelativeColorimetric,
    Saturation,
    AbsoluteColorimetric,
}

impl RenderingIntent {
    /// Interpret a raw sRGB payload (one byte)
    pub fn from_srgb(payload: &[u8]) -> Option<Self> {
        match payload {
            [0] => Some(Self::Perceptual),
            [1] => Some(Self::RelativeColorimetric),
            [2] => Some(Self::Saturation),
            [3] => Some(Self::AbsoluteColorimetric),
            _ => None,
        }
    }
}

/// Payload extracted from one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkRecord {
    /// IHDR groups
    Header(HeaderFields),
    /// One tEXt entry
    Text(TextEntry),
    /// Raw payload of eXIf, sRGB, iTXt or bKGD
    Raw { kind: KnownChunk, bytes: Vec<u8> },
}

impl ChunkRecord {
    /// Chunk kind the record came from
    pub fn kind(&self) -> KnownChunk {
        match self {
            Self::Header(_) => KnownChunk::Ihdr,
            Self::Text(_) => KnownChunk::Text,
            Self::Raw { kind, .. } => *kind,
        }
    }
}

/// Location of a chunk in the stream, for every chunk walked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkLocation {
    /// Raw four-letter tag
    pub tag: [u8; 4],
    /// Whole chunk: header, payload and CRC
    pub range: ByteRange,
    /// Whether a record was kept for it
    pub extracted: bool,
}

/// Everything the walker kept from one stream
#[derive(Debug, Default, Clone)]
pub struct Structure {
    /// Every chunk visited, in file order
    pub chunks: Vec<ChunkLocation>,

    /// Whether the walk stopped on IEND
    pub found_iend: bool,

    /// IHDR groups (last IHDR wins)
    header: Option<HeaderFields>,

    /// tEXt entries in file order
    text: Vec<TextEntry>,

    /// Raw single-buffer chunks (last one of each kind wins)
    raw: BTreeMap<KnownChunk, Vec<u8>>,
}

impl Structure {
    /// Create an empty structure
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record in; returns true when it replaced an earlier one
    pub fn add_record(&mut self, record: ChunkRecord) -> bool {
        match record {
            ChunkRecord::Header(fields) => self.header.replace(fields).is_some(),
            ChunkRecord::Text(entry) => {
                self.text.push(entry);
                false
            }
            ChunkRecord::Raw { kind, bytes } => self.raw.insert(kind, bytes).is_some(),
        }
    }

    /// IHDR groups, if an IHDR chunk carried a payload
    pub fn header(&self) -> Option<&HeaderFields> {
        self.header.as_ref()
    }

    /// tEXt entries in file order
    pub fn text_entries(&self) -> &[TextEntry] {
        &self.text
    }

    /// Raw payload for a single-buffer chunk kind
    pub fn raw(&self, kind: KnownChunk) -> Option<&[u8]> {
        self.raw.get(&kind).map(Vec::as_slice)
    }

    /// Split into the owned parts, for assembly
    pub(crate) fn into_parts(
        self,
    ) -> (
        Option<HeaderFields>,
        Vec<TextEntry>,
        BTreeMap<KnownChunk, Vec<u8>>,
    ) {
        (self.header, self.text, self.raw)
    }
}
