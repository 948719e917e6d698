//! PNG chunk walker
//!
//! Single forward pass: signature, then header by header until IEND or a
//! clean end of stream. Known chunks are dispatched to an extractor that
//! sees only a bounded payload view; the reader then jumps to the next
//! header no matter how much the extractor consumed.

use crate::{
    chunk::KnownChunk,
    error::Result,
    reader::{ChunkPayload, ChunkReader},
    structure::{ChunkLocation, ChunkRecord, HeaderFields, Structure, TextEntry},
};
use std::io::{Read, Seek};

/// Walk a PNG stream positioned at its signature
pub fn walk<R: Read + Seek>(source: R) -> Result<Structure> {
    let mut reader = ChunkReader::new(source)?;
    reader.read_signature().inspect_err(|_| {
        log::debug!("PNG signature mismatch, no chunks read");
    })?;

    let mut structure = Structure::new();

    while let Some(header) = reader.next_header()? {
        let range = reader.chunk_range();
        let chunk_offset = range.offset;
        log::trace!(
            "Chunk {} at offset {}, {} bytes",
            header.tag_str(),
            chunk_offset,
            header.length
        );

        let kind = header.kind();
        if kind == Some(KnownChunk::Iend) {
            structure.chunks.push(ChunkLocation {
                tag: header.tag,
                range,
                extracted: false,
            });
            structure.found_iend = true;
            break;
        }

        let record = match kind {
            Some(kind) if header.length > 0 => {
                let mut payload = reader.payload(&header)?;
                extract(kind, &mut payload)?
            }
            _ => None,
        };

        structure.chunks.push(ChunkLocation {
            tag: header.tag,
            range,
            extracted: record.is_some(),
        });

        if let Some(record) = record {
            let kind = record.kind();
            if structure.add_record(record) {
                log::warn!(
                    "Duplicate {} chunk at offset {}, keeping the last",
                    kind,
                    chunk_offset
                );
            }
        } else if kind.is_none() {
            log::trace!("Skipping {} chunk", header.tag_str());
        }

        reader.finish_chunk()?;
    }

    if !structure.found_iend {
        log::warn!("PNG stream ended without an IEND chunk");
    }

    Ok(structure)
}

/// Extract one known chunk's payload
fn extract<R: Read>(
    kind: KnownChunk,
    payload: &mut ChunkPayload<'_, R>,
) -> Result<Option<ChunkRecord>> {
    let record = match kind {
        KnownChunk::Text => ChunkRecord::Text(TextEntry::from_payload(&payload.read_to_end()?)),
        KnownChunk::Exif | KnownChunk::Srgb | KnownChunk::Itxt | KnownChunk::Bkgd => {
            ChunkRecord::Raw {
                kind,
                bytes: payload.read_to_end()?,
            }
        }
        KnownChunk::Ihdr => ChunkRecord::Header(read_header_fields(payload)?),
        KnownChunk::Iend => return Ok(None),
    };
    Ok(Some(record))
}

/// Read the six IHDR groups: 4, 4, 1, 1, 1, 1 bytes
fn read_header_fields<R: Read>(payload: &mut ChunkPayload<'_, R>) -> Result<HeaderFields> {
    let width = payload.read_array::<4>()?;
    let height = payload.read_array::<4>()?;
    let [bit_depth] = payload.read_array::<1>()?;
    let [color_type] = payload.read_array::<1>()?;
    let [compression_method] = payload.read_array::<1>()?;
    let [filter_method] = payload.read_array::<1>()?;
    Ok(HeaderFields {
        width,
        height,
        bit_depth,
        color_type,
        compression_method,
        filter_method,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, test_utils::PngBuilder};
    use std::io::Cursor;

    #[test]
    fn test_minimal_walk() {
        let data = PngBuilder::new().ihdr(1, 1).iend().build();
        let structure = walk(Cursor::new(data)).unwrap();

        assert!(structure.found_iend);
        assert_eq!(structure.chunks.len(), 2);
        let header = structure.header().unwrap();
        assert_eq!(header.width_px(), 1);
        assert_eq!(header.bit_depth, 8);
        assert_eq!(header.color_type, 2);
    }

    #[test]
    fn test_invalid_signature() {
        let data = vec![0x00; 32];
        let result = walk(Cursor::new(data));
        assert!(matches!(result, Err(Error::MalformedSignature)));
    }

    #[test]
    fn test_unknown_chunks_skipped() {
        let data = PngBuilder::new()
            .ihdr(4, 4)
            .chunk(b"zzzz", b"ignored payload")
            .text("Title", "Hi")
            .iend()
            .build();
        let structure = walk(Cursor::new(data)).unwrap();

        assert_eq!(structure.text_entries().len(), 1);
        let zzzz = &structure.chunks[1];
        assert_eq!(&zzzz.tag, b"zzzz");
        assert!(!zzzz.extracted);
        assert_eq!(zzzz.range.size, 8 + 15 + 4);
    }

    #[test]
    fn test_zero_length_known_chunk_stores_nothing() {
        let data = PngBuilder::new()
            .chunk(b"IHDR", b"")
            .chunk(b"tEXt", b"")
            .chunk(b"sRGB", b"")
            .iend()
            .build();
        let structure = walk(Cursor::new(data)).unwrap();

        assert!(structure.header().is_none());
        assert!(structure.text_entries().is_empty());
        assert!(structure.raw(KnownChunk::Srgb).is_none());
    }

    #[test]
    fn test_short_ihdr_is_truncated_payload() {
        let data = PngBuilder::new().chunk(b"IHDR", &[0; 11]).iend().build();
        let err = walk(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, Error::TruncatedPayload { ref tag, .. } if tag == "IHDR"));
    }

    #[test]
    fn test_ihdr_interlace_byte_ignored() {
        let data = PngBuilder::new().ihdr(640, 480).iend().build();
        let structure = walk(Cursor::new(data)).unwrap();
        let header = structure.header().unwrap();
        assert_eq!(header.width, 640u32.to_be_bytes());
        assert_eq!(header.height, 480u32.to_be_bytes());
        assert_eq!(header.filter_method, 0);
    }

    #[test]
    fn test_stops_at_iend() {
        let mut data = PngBuilder::new().ihdr(1, 1).iend().build();
        // garbage after IEND would otherwise be a truncated header
        data.extend_from_slice(&[1, 2, 3]);
        let structure = walk(Cursor::new(data)).unwrap();
        assert!(structure.found_iend);
    }

    #[test]
    fn test_missing_iend_tolerated() {
        let data = PngBuilder::new().ihdr(2, 2).text("a", "b").build();
        let structure = walk(Cursor::new(data)).unwrap();
        assert!(!structure.found_iend);
        assert_eq!(structure.text_entries()[0].keyword, "a");
    }

    #[test]
    fn test_iend_with_missing_crc_ends_walk() {
        let mut data = PngBuilder::new().ihdr(1, 1).text("Title", "Hi").iend().build();
        data.truncate(data.len() - 4);
        let structure = walk(Cursor::new(data)).unwrap();

        assert!(structure.found_iend);
        assert_eq!(structure.text_entries()[0].text, "Hi");
        let iend = structure.chunks.last().unwrap();
        assert_eq!(&iend.tag, b"IEND");
        assert_eq!(iend.range.size, 8);
    }

    #[test]
    fn test_missing_crc_on_last_chunk_keeps_metadata() {
        let mut data = PngBuilder::new().ihdr(1, 1).text("Title", "Hi").build();
        data.truncate(data.len() - 4);
        let structure = walk(Cursor::new(data)).unwrap();

        assert!(!structure.found_iend);
        assert_eq!(structure.text_entries()[0].keyword, "Title");
        assert_eq!(structure.chunks.len(), 2);
    }
}
