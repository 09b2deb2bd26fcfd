//! Human-readable chunk tree listing

use std::fmt::Write;

use crate::chunk::{Chunk, ChunkBody, Document};

/// Render the document as one line per chunk, children numbered and indented
/// under their FORM.
pub fn dump_document(doc: &Document) -> String {
    let mut out = String::new();
    for chunk in doc {
        dump_chunk(&mut out, chunk, 0);
    }
    out
}

fn dump_chunk(out: &mut String, chunk: &Chunk, depth: usize) {
    // Writing into a String cannot fail
    let _ = write!(out, "{}", chunk.header);
    match &chunk.body {
        ChunkBody::Form(form) => {
            let _ = writeln!(
                out,
                " [{}] ({} chunks)",
                form.form_type.id(),
                form.chunks.len()
            );
            let indent = "  ".repeat(depth + 1);
            for (i, child) in form.chunks.iter().enumerate() {
                let _ = write!(out, "{}{}) ", indent, i + 1);
                dump_chunk(out, child, depth + 1);
            }
        }
        ChunkBody::Generic | ChunkBody::Marker(_) => out.push('\n'),
    }
}
