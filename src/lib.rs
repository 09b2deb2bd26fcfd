//! Chunk-level reader for AIFF/AIFC files
//!
//! Parses a file into a tree of chunks that keep their exact on-disk bytes,
//! then lists the tree or writes each top-level chunk back out.

pub mod chunk;
pub mod cli;
pub mod config;
pub mod dump;
pub mod error;
pub mod extract;
pub mod logging;

pub use chunk::{
    open_document, open_document_with, Chunk, ChunkHeader, ChunkId, ChunkKind, Document,
    ReaderOptions,
};
pub use cli::Cli;
pub use config::Options;
pub use dump::dump_document;
pub use error::{ChunkError, ChunkResult};
pub use extract::{extract_document, Extractor};
pub use logging::LogLevel;
