//! Chunk decoding engine for AIFF/AIFC files
//!
//! # Architecture
//!
//! - `header` reads and validates the 8-byte tag + length prefix
//! - `types` holds the chunk tree: `Chunk`, `ChunkBody`, `Form`, `Document`
//! - `marker` holds the MARK table types and on-demand entry decoding
//! - `reader` drives the recursive descent and body materialization

pub mod header;
pub mod marker;
pub mod reader;
pub mod types;

pub use header::{read_header, ChunkHeader, ChunkId, HEADER_SIZE};
pub use marker::{MarkerEntry, MarkerTable};
pub use reader::{
    open_document, open_document_with, parse_bytes, ChunkReader, ReaderOptions, DEFAULT_MAX_DEPTH,
};
pub use types::{Chunk, ChunkBody, ChunkKind, Document, Form, FormType};
