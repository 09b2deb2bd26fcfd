//! In-memory chunk tree

use super::header::{ChunkHeader, ChunkId};
use super::marker::{MarkerEntry, MarkerTable};
use crate::error::{ChunkError, ChunkResult};

/// Closed set of chunk variants, selected by tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// Opaque payload
    Generic,
    /// FORM container holding further chunks
    Form,
    /// MARK table
    Marker,
}

impl ChunkKind {
    /// Exact tag match; anything unrecognized is generic
    pub fn from_id(id: ChunkId) -> Self {
        match id {
            ChunkId::FORM => ChunkKind::Form,
            ChunkId::MARK => ChunkKind::Marker,
            _ => ChunkKind::Generic,
        }
    }
}

/// Accepted FORM types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormType {
    Aiff,
    Aifc,
}

impl FormType {
    pub fn from_id(id: ChunkId) -> Option<Self> {
        match id {
            ChunkId::AIFF => Some(FormType::Aiff),
            ChunkId::AIFC => Some(FormType::Aifc),
            _ => None,
        }
    }

    pub fn id(&self) -> ChunkId {
        match self {
            FormType::Aiff => ChunkId::AIFF,
            FormType::Aifc => ChunkId::AIFC,
        }
    }
}

/// FORM container body
///
/// The header size covers the 4-byte form type plus every child's header and
/// body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub form_type: FormType,
    pub chunks: Vec<Chunk>,
}

/// Variant-specific structure parsed from a chunk body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkBody {
    Generic,
    Form(Form),
    Marker(MarkerTable),
}

/// A parsed chunk.
///
/// `data` always holds the complete body as it appeared in the stream,
/// exactly `header.size` bytes, whatever the variant parsed out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub header: ChunkHeader,
    pub data: Vec<u8>,
    pub body: ChunkBody,
}

impl Chunk {
    pub fn id(&self) -> ChunkId {
        self.header.id
    }

    pub fn size(&self) -> u32 {
        self.header.size
    }

    pub fn kind(&self) -> ChunkKind {
        match self.body {
            ChunkBody::Generic => ChunkKind::Generic,
            ChunkBody::Form(_) => ChunkKind::Form,
            ChunkBody::Marker(_) => ChunkKind::Marker,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn as_form(&self) -> Option<&Form> {
        match &self.body {
            ChunkBody::Form(form) => Some(form),
            _ => None,
        }
    }

    /// Children of a FORM chunk, empty for every other kind
    pub fn children(&self) -> &[Chunk] {
        match &self.body {
            ChunkBody::Form(form) => &form.chunks,
            _ => &[],
        }
    }

    /// Decode marker entries from a MARK chunk's raw body
    pub fn markers(&self) -> ChunkResult<Vec<MarkerEntry>> {
        match &self.body {
            ChunkBody::Marker(_) => MarkerTable::decode(&self.data),
            _ => Err(ChunkError::InvalidMarker(format!(
                "{} is not a MARK chunk",
                self.header.id
            ))),
        }
    }

    /// Depth-first walk over this chunk and every nested child
    pub fn walk(&self) -> Vec<&Chunk> {
        let mut out = vec![self];
        for child in self.children() {
            out.extend(child.walk());
        }
        out
    }
}

/// Top-level chunks of one input stream, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub chunks: Vec<Chunk>,
}

impl Document {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    /// First chunk anywhere in the tree with the given tag
    pub fn find(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks
            .iter()
            .flat_map(|c| c.walk())
            .find(|c| c.header.id == id)
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}
