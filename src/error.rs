//! Error type for chunk parsing and extraction
//!
//! Every variant is fatal for the run that produced it. Library code returns
//! these up to the caller; only the binary decides to abort.

use std::io;
use std::path::PathBuf;

use crate::chunk::ChunkId;

/// Errors produced while reading a chunk stream or writing extracted chunks
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// Stream read failure, or a header/body cut short by end of data
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A header tag byte lies outside printable ASCII
    #[error("Invalid header ID {id} at offset {offset:#x}")]
    InvalidHeader { id: ChunkId, offset: u64 },

    /// A FORM chunk whose form type is neither AIFF nor AIFC
    #[error("Unexpected form type {found} at offset {offset:#x}")]
    InvalidFormType { found: ChunkId, offset: u64 },

    /// A container's declared size is not covered exactly by its contents
    #[error("Container {id} declares {expected} bytes but its contents account for {consumed}")]
    TruncatedContainer {
        id: ChunkId,
        expected: u64,
        consumed: u64,
    },

    /// Dispatch fell through every known chunk kind
    #[error("Unknown chunk type {0}")]
    UnknownChunkType(ChunkId),

    /// Containers nested beyond the configured limit
    #[error("Containers nested {depth} deep (limit {max})")]
    NestingTooDeep { depth: usize, max: usize },

    /// A marker table too short for the entries it declares
    #[error("Invalid marker table: {0}")]
    InvalidMarker(String),

    /// An extracted chunk could not be created or written
    #[error("Error writing chunk data to {}: {source}", .path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for chunk operations
pub type ChunkResult<T> = Result<T, ChunkError>;
