//! Chunk header decoding
//!
//! Every chunk starts with an 8-byte header: a 4-byte ASCII tag followed by
//! the body length as a big-endian u32.

use std::fmt;
use std::io::{self, Read, Seek};

use crate::error::{ChunkError, ChunkResult};

/// Size of a chunk header on disk
pub const HEADER_SIZE: u64 = 8;

/// Four-character chunk tag
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkId([u8; 4]);

impl ChunkId {
    pub const FORM: ChunkId = ChunkId(*b"FORM");
    pub const MARK: ChunkId = ChunkId(*b"MARK");
    pub const AIFF: ChunkId = ChunkId(*b"AIFF");
    pub const AIFC: ChunkId = ChunkId(*b"AIFC");

    pub const fn new(bytes: [u8; 4]) -> Self {
        ChunkId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Whether every byte is in the printable ASCII range (0x20..=0x7E)
    pub fn is_printable(&self) -> bool {
        self.0.iter().all(|b| (b' '..=b'~').contains(b))
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if (b' '..=b'~').contains(&b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkId(\"{}\")", self)
    }
}

impl From<[u8; 4]> for ChunkId {
    fn from(bytes: [u8; 4]) -> Self {
        ChunkId(bytes)
    }
}

/// Decoded chunk header, size in host byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: ChunkId,
    pub size: u32,
}

impl ChunkHeader {
    pub fn new(id: ChunkId, size: u32) -> Self {
        Self { id, size }
    }
}

impl fmt::Display for ChunkHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chunk: {} {} bytes", self.id, self.size)
    }
}

/// Read one chunk header from the stream.
///
/// Returns `Ok(None)` when the stream is already at end of data. A header cut
/// short after at least one byte is an I/O error, and a tag with a
/// non-printable byte is rejected before anything past the header is read.
pub fn read_header<R: Read + Seek>(reader: &mut R) -> ChunkResult<Option<ChunkHeader>> {
    let offset = reader.stream_position()?;
    let mut buf = [0u8; HEADER_SIZE as usize];

    let filled = read_full(reader, &mut buf)?;
    if filled == 0 {
        return Ok(None);
    }
    if filled < buf.len() {
        return Err(ChunkError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "chunk header at offset {:#x} truncated after {} of {} bytes",
                offset, filled, HEADER_SIZE
            ),
        )));
    }

    let id = ChunkId([buf[0], buf[1], buf[2], buf[3]]);
    if !id.is_printable() {
        return Err(ChunkError::InvalidHeader { id, offset });
    }

    let size = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
    log::trace!("header {} size {} at {:#x}", id, size, offset);
    Ok(Some(ChunkHeader { id, size }))
}

/// Fill `buf` as far as the stream allows, returning the byte count.
pub(super) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
