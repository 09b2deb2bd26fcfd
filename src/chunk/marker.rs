//! MARK chunk: table of named sample-frame positions
//!
//! Parsing a MARK chunk during a read does not unpack its entries; the raw
//! body is materialized like any other chunk. `MarkerTable::decode` unpacks
//! the entries from those bytes when a caller asks for them.

use crate::error::{ChunkError, ChunkResult};

/// A single marker: id, sample-frame position and Pascal-string name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerEntry {
    pub id: u16,
    pub position: u32,
    pub name: String,
}

/// Structured view of a MARK chunk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerTable {
    /// Left empty by the structural parse
    pub markers: Vec<MarkerEntry>,
}

impl MarkerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode marker entries from a MARK chunk body.
    ///
    /// Layout: u16 count, then per marker u16 id, u32 position and a Pascal
    /// string whose count byte plus characters is padded to an even length.
    pub fn decode(data: &[u8]) -> ChunkResult<Vec<MarkerEntry>> {
        let mut pos = 0usize;
        let count = be_u16(data, &mut pos)?;
        let mut markers = Vec::with_capacity(count as usize);

        for index in 0..count {
            let id = be_u16(data, &mut pos)?;
            let position = be_u32(data, &mut pos)?;
            let len = take(data, &mut pos, 1)?[0] as usize;
            let name = take(data, &mut pos, len)
                .map_err(|_| {
                    ChunkError::InvalidMarker(format!(
                        "name of marker {} runs past end of table",
                        index
                    ))
                })?
                .iter()
                .map(|&b| b as char)
                .collect();
            // Count byte + chars is odd when len is even
            if len % 2 == 0 && pos < data.len() {
                pos += 1;
            }
            markers.push(MarkerEntry { id, position, name });
        }

        if pos < data.len() {
            log::debug!(
                "MARK: {} trailing bytes after {} markers",
                data.len() - pos,
                count
            );
        }
        Ok(markers)
    }
}

fn take<'a>(data: &'a [u8], pos: &mut usize, n: usize) -> ChunkResult<&'a [u8]> {
    let end = *pos + n;
    if end > data.len() {
        return Err(ChunkError::InvalidMarker(format!(
            "need {} bytes at offset {}, have {}",
            n,
            *pos,
            data.len().saturating_sub(*pos)
        )));
    }
    let slice = &data[*pos..end];
    *pos = end;
    Ok(slice)
}

fn be_u16(data: &[u8], pos: &mut usize) -> ChunkResult<u16> {
    let b = take(data, pos, 2)?;
    Ok(u16::from_be_bytes([b[0], b[1]]))
}

fn be_u32(data: &[u8], pos: &mut usize) -> ChunkResult<u32> {
    let b = take(data, pos, 4)?;
    Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}
