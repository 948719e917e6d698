//! Forward-only chunk cursor
//!
//! [`ChunkReader`] owns the canonical stream position. Each accepted header
//! fixes where the next header starts; payload handlers only ever get a
//! bounded [`ChunkPayload`] view and cannot move that position. Advancing
//! is always an absolute seek to the recorded boundary, so a handler that
//! reads less (or nothing) never desynchronizes the walk.

use crate::{
    chunk::{ChunkHeader, KnownChunk, CHUNK_HEADER_LEN, MAX_CHUNK_LEN, PNG_SIGNATURE},
    error::{Error, Result},
};
use std::io::{Read, Seek, SeekFrom};

/// A byte range in the stream (offset and size)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Offset from start of stream
    pub offset: u64,
    /// Size in bytes
    pub size: u64,
}

impl ByteRange {
    /// Create a new byte range
    pub fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }

    /// Get the end offset of this range
    pub fn end_offset(&self) -> u64 {
        self.offset + self.size
    }
}

/// Cursor over a PNG chunk stream
pub struct ChunkReader<R> {
    source: R,
    /// Absolute position where the stream starts (usually 0)
    base: u64,
    /// Absolute end of the stream
    end: u64,
    /// Absolute position of the header last read
    current: u64,
    /// Absolute position of the next chunk header
    next: u64,
}

impl<R: Read + Seek> ChunkReader<R> {
    /// Wrap a stream positioned at the start of the PNG data
    pub fn new(mut source: R) -> Result<Self> {
        let base = source.stream_position()?;
        let end = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(base))?;
        Ok(Self {
            source,
            base,
            end: end.max(base),
            current: base,
            next: base,
        })
    }

    /// Offset of the next header, relative to the start of the PNG data
    pub fn offset(&self) -> u64 {
        self.next - self.base
    }

    /// Bytes left between the next header and the end of the stream
    pub fn remaining(&self) -> u64 {
        self.end.saturating_sub(self.next)
    }

    /// Consume and check the 8-byte signature
    pub fn read_signature(&mut self) -> Result<()> {
        if self.remaining() < PNG_SIGNATURE.len() as u64 {
            return Err(Error::MalformedSignature);
        }
        let mut sig = [0u8; 8];
        self.source.read_exact(&mut sig)?;
        if sig != PNG_SIGNATURE {
            return Err(Error::MalformedSignature);
        }
        self.next += PNG_SIGNATURE.len() as u64;
        Ok(())
    }

    /// Read the next chunk header and fix the boundary of its chunk
    ///
    /// Returns `Ok(None)` when the stream ends cleanly on a chunk boundary.
    /// IEND is handed back as soon as its header is read. For every other
    /// chunk the declared payload must fit in the stream; nothing is
    /// allocated before that check passes. A CRC cut off by the end of the
    /// stream is not an error: the next call sees a clean end.
    pub fn next_header(&mut self) -> Result<Option<ChunkHeader>> {
        let offset = self.offset();
        let available = self.remaining();
        if available == 0 {
            return Ok(None);
        }
        if available < CHUNK_HEADER_LEN {
            return Err(Error::TruncatedHeader { offset, available });
        }

        self.source.seek(SeekFrom::Start(self.next))?;
        let header = ChunkHeader::read_from(&mut self.source)?;
        self.current = self.next;
        let available = available - CHUNK_HEADER_LEN;

        if header.kind() != Some(KnownChunk::Iend) {
            let needed = header.length as u64;
            if needed > available {
                return Err(Error::TruncatedPayload {
                    offset,
                    tag: header.tag_str(),
                    needed,
                    available,
                });
            }
            if header.length > MAX_CHUNK_LEN {
                return Err(Error::ChunkTooLarge {
                    offset,
                    length: header.length,
                });
            }
        }

        self.next += CHUNK_HEADER_LEN + header.skip_len().min(available);
        Ok(Some(header))
    }

    /// Span of the chunk whose header was just read, relative to the start
    /// of the PNG data
    ///
    /// Covers header, payload and as much of the CRC as the stream holds.
    pub fn chunk_range(&self) -> ByteRange {
        ByteRange::new(self.current - self.base, self.next - self.current)
    }

    /// Bounded view over the payload of the chunk whose header was just read
    pub fn payload(&mut self, header: &ChunkHeader) -> Result<ChunkPayload<'_, R>> {
        let start = self.current + CHUNK_HEADER_LEN;
        self.source.seek(SeekFrom::Start(start))?;
        Ok(ChunkPayload {
            source: &mut self.source,
            range: ByteRange::new(start, header.length as u64),
            tag: header.tag,
            base: self.base,
            consumed: 0,
        })
    }

    /// Move the stream to the start of the next header
    pub fn finish_chunk(&mut self) -> Result<()> {
        self.source.seek(SeekFrom::Start(self.next))?;
        Ok(())
    }

    /// Give the stream back
    pub fn into_inner(self) -> R {
        self.source
    }
}

/// Read-only window over one chunk's payload
///
/// Reads past the declared length fail with [`Error::TruncatedPayload`]
/// instead of spilling into the CRC or the next chunk.
pub struct ChunkPayload<'a, R> {
    source: &'a mut R,
    range: ByteRange,
    tag: [u8; 4],
    base: u64,
    consumed: u64,
}

impl<R: Read> ChunkPayload<'_, R> {
    /// Declared payload length
    pub fn len(&self) -> u64 {
        self.range.size
    }

    /// True when the chunk declares no payload
    pub fn is_empty(&self) -> bool {
        self.range.size == 0
    }

    /// Payload bytes not read yet
    pub fn remaining(&self) -> u64 {
        self.range.size - self.consumed
    }

    /// Read exactly `n` bytes
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.check(n as u64)?;
        let mut buf = vec![0u8; n];
        self.source.read_exact(&mut buf)?;
        self.consumed += n as u64;
        Ok(buf)
    }

    /// Read a fixed-size group
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.check(N as u64)?;
        let mut buf = [0u8; N];
        self.source.read_exact(&mut buf)?;
        self.consumed += N as u64;
        Ok(buf)
    }

    /// Read whatever is left of the payload
    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let n = self.remaining() as usize;
        self.read_bytes(n)
    }

    fn check(&self, n: u64) -> Result<()> {
        if n > self.remaining() {
            return Err(Error::TruncatedPayload {
                offset: self.range.offset - self.base - CHUNK_HEADER_LEN,
                tag: String::from_utf8_lossy(&self.tag).into_owned(),
                needed: self.consumed + n,
                available: self.range.size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn stream(chunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
        let mut data = PNG_SIGNATURE.to_vec();
        for (tag, payload) in chunks {
            data.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            data.extend_from_slice(*tag);
            data.extend_from_slice(payload);
            data.extend_from_slice(&[0; 4]);
        }
        data
    }

    #[test]
    fn test_partial_read_does_not_desync() {
        let data = stream(&[(b"aaaa", b"0123456789"), (b"bbbb", b"xy")]);
        let mut reader = ChunkReader::new(Cursor::new(data)).unwrap();
        reader.read_signature().unwrap();

        let first = reader.next_header().unwrap().unwrap();
        let mut payload = reader.payload(&first).unwrap();
        assert_eq!(payload.read_array::<3>().unwrap(), *b"012");
        reader.finish_chunk().unwrap();

        let second = reader.next_header().unwrap().unwrap();
        assert_eq!(&second.tag, b"bbbb");
        let mut payload = reader.payload(&second).unwrap();
        assert_eq!(payload.read_to_end().unwrap(), b"xy");
        reader.finish_chunk().unwrap();

        assert!(reader.next_header().unwrap().is_none());
    }

    #[test]
    fn test_payload_reads_are_bounded() {
        let data = stream(&[(b"IHDR", b"abc")]);
        let mut reader = ChunkReader::new(Cursor::new(data)).unwrap();
        reader.read_signature().unwrap();
        let header = reader.next_header().unwrap().unwrap();
        let mut payload = reader.payload(&header).unwrap();
        let err = payload.read_bytes(4).unwrap_err();
        assert!(matches!(err, Error::TruncatedPayload { offset: 8, .. }));
    }

    #[test]
    fn test_short_signature() {
        let mut reader = ChunkReader::new(Cursor::new(b"\x89PNG".to_vec())).unwrap();
        assert!(matches!(
            reader.read_signature(),
            Err(Error::MalformedSignature)
        ));
    }

    #[test]
    fn test_header_tail_is_truncation() {
        let mut data = stream(&[]);
        data.extend_from_slice(&[0, 0, 0]);
        let mut reader = ChunkReader::new(Cursor::new(data)).unwrap();
        reader.read_signature().unwrap();
        assert!(matches!(
            reader.next_header(),
            Err(Error::TruncatedHeader {
                offset: 8,
                available: 3
            })
        ));
    }

    #[test]
    fn test_length_past_end_is_truncated_payload() {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
        data.extend_from_slice(b"tEXt");
        data.extend_from_slice(b"Title");
        let mut reader = ChunkReader::new(Cursor::new(data)).unwrap();
        reader.read_signature().unwrap();
        assert!(matches!(
            reader.next_header(),
            Err(Error::TruncatedPayload {
                offset: 8,
                needed: 0xFFFF_FFFF,
                available: 5,
                ..
            })
        ));
    }

    /// Reports a length larger than its buffer and reads zeros past it
    struct SparseStream {
        data: Vec<u8>,
        len: u64,
        pos: u64,
    }

    impl Read for SparseStream {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = buf.len().min(self.len.saturating_sub(self.pos) as usize);
            for (i, byte) in buf[..n].iter_mut().enumerate() {
                *byte = self.data.get(self.pos as usize + i).copied().unwrap_or(0);
            }
            self.pos += n as u64;
            Ok(n)
        }
    }

    impl Seek for SparseStream {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            self.pos = match pos {
                SeekFrom::Start(n) => n,
                SeekFrom::End(n) => (self.len as i64 + n) as u64,
                SeekFrom::Current(n) => (self.pos as i64 + n) as u64,
            };
            Ok(self.pos)
        }
    }

    #[test]
    fn test_oversized_length_that_fits_is_too_large() {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(&0x8000_0000u32.to_be_bytes());
        data.extend_from_slice(b"zzzz");
        let mut reader = ChunkReader::new(SparseStream {
            data,
            len: 8 + 8 + 0x8000_0000 + 4,
            pos: 0,
        })
        .unwrap();
        reader.read_signature().unwrap();
        assert!(matches!(
            reader.next_header(),
            Err(Error::ChunkTooLarge {
                offset: 8,
                length: 0x8000_0000
            })
        ));
    }

    #[test]
    fn test_iend_returned_without_length_check() {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(b"IEND");
        let mut reader = ChunkReader::new(Cursor::new(data)).unwrap();
        reader.read_signature().unwrap();

        let header = reader.next_header().unwrap().unwrap();
        assert_eq!(&header.tag, b"IEND");
        assert_eq!(reader.chunk_range(), ByteRange::new(8, 8));
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_missing_crc_ends_stream() {
        let mut data = stream(&[(b"tEXt", b"a\0b")]);
        data.truncate(data.len() - 3);
        let mut reader = ChunkReader::new(Cursor::new(data)).unwrap();
        reader.read_signature().unwrap();

        let header = reader.next_header().unwrap().unwrap();
        assert_eq!(reader.chunk_range(), ByteRange::new(8, 8 + 3 + 1));
        let mut payload = reader.payload(&header).unwrap();
        assert_eq!(payload.read_to_end().unwrap(), b"a\0b");
        reader.finish_chunk().unwrap();

        assert!(reader.next_header().unwrap().is_none());
    }

    #[test]
    fn test_offsets_relative_to_start_position() {
        let mut data = vec![0xAA; 5];
        data.extend(stream(&[(b"zzzz", b"")]));
        let mut cursor = Cursor::new(data);
        cursor.set_position(5);

        let mut reader = ChunkReader::new(cursor).unwrap();
        reader.read_signature().unwrap();
        assert_eq!(reader.offset(), 8);
        reader.next_header().unwrap().unwrap();
        reader.finish_chunk().unwrap();
        assert_eq!(reader.offset(), 20);
        assert_eq!(reader.remaining(), 0);
    }
}
