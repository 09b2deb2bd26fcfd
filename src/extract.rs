//! Write chunk bodies to disk
//!
//! Each top-level chunk becomes `<prefix>.<counter>.<tag>.dat`. FORM chunks
//! are written whole by default; `extract_leaves` instead descends into them
//! and writes every non-container chunk, sharing one counter.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::chunk::{Chunk, Document};
use crate::error::{ChunkError, ChunkResult};

/// Extraction driver owning the file counter
#[derive(Debug)]
pub struct Extractor {
    prefix: String,
    dir: Option<PathBuf>,
    /// Number assigned to the last written file
    counter: u32,
}

impl Extractor {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            dir: None,
            counter: 0,
        }
    }

    /// Place output files in `dir` instead of next to the prefix
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Number of files written so far
    pub fn count(&self) -> u32 {
        self.counter
    }

    /// Path the next file would be written to for `chunk`
    pub fn next_path(&self, chunk: &Chunk) -> PathBuf {
        let name = format!("{}.{}.{}.dat", self.prefix, self.counter + 1, chunk.id());
        match &self.dir {
            Some(dir) => {
                // Only the final component of the prefix goes inside the directory
                let file_name = Path::new(&name)
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(&name));
                dir.join(file_name)
            }
            None => PathBuf::from(name),
        }
    }

    /// Write one chunk's raw body and advance the counter.
    pub fn write_chunk(&mut self, chunk: &Chunk) -> ChunkResult<PathBuf> {
        let path = self.next_path(chunk);
        let mut file = File::create(&path).map_err(|source| ChunkError::Extract {
            path: path.clone(),
            source,
        })?;
        file.write_all(chunk.data())
            .and_then(|_| file.flush())
            .map_err(|source| ChunkError::Extract {
                path: path.clone(),
                source,
            })?;

        self.counter += 1;
        log::info!("wrote {} ({} bytes)", path.display(), chunk.data().len());
        Ok(path)
    }

    /// Write every top-level chunk of `doc` in read order.
    pub fn extract(&mut self, doc: &Document) -> ChunkResult<Vec<PathBuf>> {
        doc.iter().map(|chunk| self.write_chunk(chunk)).collect()
    }

    /// Write every non-FORM chunk of `doc`, depth-first in read order.
    ///
    /// Containers themselves produce no file.
    pub fn extract_leaves(&mut self, doc: &Document) -> ChunkResult<Vec<PathBuf>> {
        let mut written = Vec::new();
        for chunk in doc {
            self.write_leaves(chunk, &mut written)?;
        }
        Ok(written)
    }

    fn write_leaves(&mut self, chunk: &Chunk, written: &mut Vec<PathBuf>) -> ChunkResult<()> {
        match chunk.as_form() {
            Some(form) => {
                for child in &form.chunks {
                    self.write_leaves(child, written)?;
                }
            }
            None => written.push(self.write_chunk(chunk)?),
        }
        Ok(())
    }
}

/// Extract `doc` with a fresh counter starting at 1.
pub fn extract_document(doc: &Document, prefix: &str) -> ChunkResult<Vec<PathBuf>> {
    Extractor::new(prefix).extract(doc)
}
