//! Recursive descent chunk reader
//!
//! Reads one header at a time, dispatches on its tag, lets the variant walk
//! the body, then re-reads the whole body into the chunk so that every chunk
//! carries its original bytes no matter how much of them were interpreted.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use super::header::{read_full, read_header, ChunkHeader, ChunkId};
use super::marker::MarkerTable;
use super::types::{Chunk, ChunkBody, ChunkKind, Document, Form, FormType};
use crate::error::{ChunkError, ChunkResult};

/// Default limit on FORM nesting
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Size of the form type field that opens every FORM body
const FORM_TYPE_SIZE: u64 = 4;

/// Reader behaviour knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Maximum number of nested FORM chunks
    pub max_depth: usize,
    /// Skip the pad byte that follows odd-sized chunk bodies
    pub pad_odd_chunks: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            pad_odd_chunks: false,
        }
    }
}

/// Chunk reader over any seekable byte stream
pub struct ChunkReader<R> {
    reader: R,
    options: ReaderOptions,
    /// Number of FORM bodies currently being parsed
    depth: usize,
}

impl<R: Read + Seek> ChunkReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ReaderOptions::default())
    }

    pub fn with_options(reader: R, options: ReaderOptions) -> Self {
        Self {
            reader,
            options,
            depth: 0,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read every remaining top-level chunk until a clean end of stream.
    pub fn read_document(&mut self) -> ChunkResult<Document> {
        let mut chunks = Vec::new();
        while let Some(chunk) = self.read_chunk()? {
            log::debug!("read top-level {}", chunk.header);
            chunks.push(chunk);
        }
        Ok(Document { chunks })
    }

    /// Read a single chunk, header and body.
    ///
    /// Returns `Ok(None)` only when the stream ends exactly on a header
    /// boundary.
    pub fn read_chunk(&mut self) -> ChunkResult<Option<Chunk>> {
        match read_header(&mut self.reader)? {
            Some(header) => self.read_body(header).map(Some),
            None => Ok(None),
        }
    }

    /// Build the chunk for `header` with the stream positioned at its body.
    fn read_body(&mut self, header: ChunkHeader) -> ChunkResult<Chunk> {
        let body_start = self.reader.stream_position()?;
        let end = body_start + u64::from(header.size);

        let body = match ChunkKind::from_id(header.id) {
            ChunkKind::Form => ChunkBody::Form(self.parse_form(header, body_start)?),
            ChunkKind::Marker => ChunkBody::Marker(MarkerTable::new()),
            ChunkKind::Generic => {
                self.reader.seek(SeekFrom::Start(end))?;
                ChunkBody::Generic
            }
        };

        let pos = self.reader.stream_position()?;
        if pos > end {
            return Err(ChunkError::TruncatedContainer {
                id: header.id,
                expected: u64::from(header.size),
                consumed: pos - body_start,
            });
        }

        let data = self.materialize(header, body_start)?;
        self.skip_pad(header)?;

        Ok(Chunk { header, data, body })
    }

    /// Parse a FORM body: form type, then children up to the declared end.
    fn parse_form(&mut self, header: ChunkHeader, body_start: u64) -> ChunkResult<Form> {
        let expected = u64::from(header.size);
        if expected < FORM_TYPE_SIZE {
            return Err(ChunkError::TruncatedContainer {
                id: header.id,
                expected,
                consumed: FORM_TYPE_SIZE,
            });
        }

        if self.depth >= self.options.max_depth {
            return Err(ChunkError::NestingTooDeep {
                depth: self.depth + 1,
                max: self.options.max_depth,
            });
        }

        let mut raw = [0u8; 4];
        self.reader.read_exact(&mut raw).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("reading form type at offset {:#x}: {}", body_start, e),
            )
        })?;
        let found = ChunkId::new(raw);
        let form_type = FormType::from_id(found).ok_or(ChunkError::InvalidFormType {
            found,
            offset: body_start,
        })?;

        let end = body_start + expected;
        self.depth += 1;
        let children = self.read_children(end);
        self.depth -= 1;
        let chunks = children?;

        let consumed = self.reader.stream_position()? - body_start;
        if consumed != expected {
            return Err(ChunkError::TruncatedContainer {
                id: header.id,
                expected,
                consumed,
            });
        }

        log::debug!(
            "FORM {} at depth {}: {} chunks",
            found,
            self.depth,
            chunks.len()
        );
        Ok(Form { form_type, chunks })
    }

    fn read_children(&mut self, end: u64) -> ChunkResult<Vec<Chunk>> {
        let mut chunks = Vec::new();
        while self.reader.stream_position()? < end {
            match self.read_chunk()? {
                Some(chunk) => chunks.push(chunk),
                None => break,
            }
        }
        Ok(chunks)
    }

    /// Copy the full declared body into memory and leave the stream at the
    /// body's end.
    fn materialize(&mut self, header: ChunkHeader, body_start: u64) -> ChunkResult<Vec<u8>> {
        let size = u64::from(header.size);
        self.reader.seek(SeekFrom::Start(body_start))?;

        let mut data = Vec::new();
        (&mut self.reader).take(size).read_to_end(&mut data)?;
        if data.len() as u64 != size {
            return Err(ChunkError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "{} body at offset {:#x} truncated: {} of {} bytes",
                    header.id,
                    body_start,
                    data.len(),
                    size
                ),
            )));
        }

        log::trace!("materialized {} bytes for {}", size, header.id);
        Ok(data)
    }

    /// Consume the pad byte after an odd-sized body when padding is enabled.
    fn skip_pad(&mut self, header: ChunkHeader) -> ChunkResult<()> {
        if !self.options.pad_odd_chunks || header.size % 2 == 0 {
            return Ok(());
        }
        let mut pad = [0u8; 1];
        match read_full(&mut self.reader, &mut pad)? {
            0 => log::debug!("{}: missing pad byte at end of stream", header.id),
            _ if pad[0] != 0 => log::warn!("{}: non-zero pad byte {:#04x}", header.id, pad[0]),
            _ => {}
        }
        Ok(())
    }
}

/// Read a document from an in-memory buffer.
pub fn parse_bytes(data: &[u8], options: ReaderOptions) -> ChunkResult<Document> {
    ChunkReader::with_options(Cursor::new(data), options).read_document()
}

/// Open and read a document with default options.
pub fn open_document<P: AsRef<Path>>(path: P) -> ChunkResult<Document> {
    open_document_with(path, ReaderOptions::default())
}

/// Open and read a document.
pub fn open_document_with<P: AsRef<Path>>(
    path: P,
    options: ReaderOptions,
) -> ChunkResult<Document> {
    let path = path.as_ref();
    log::debug!("opening {}", path.display());
    let file = File::open(path)?;
    ChunkReader::with_options(BufReader::new(file), options).read_document()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble chunk streams byte by byte.
    struct StreamBuilder {
        bytes: Vec<u8>,
    }

    impl StreamBuilder {
        fn new() -> Self {
            Self { bytes: Vec::new() }
        }

        fn chunk(mut self, tag: &[u8; 4], body: &[u8]) -> Self {
            self.bytes.extend_from_slice(tag);
            self.bytes
                .extend_from_slice(&(body.len() as u32).to_be_bytes());
            self.bytes.extend_from_slice(body);
            self
        }

        fn form(self, form_type: &[u8; 4], children: StreamBuilder) -> Self {
            let mut body = form_type.to_vec();
            body.extend_from_slice(&children.bytes);
            self.chunk(b"FORM", &body)
        }

        fn raw(mut self, bytes: &[u8]) -> Self {
            self.bytes.extend_from_slice(bytes);
            self
        }

        fn build(self) -> Vec<u8> {
            self.bytes
        }
    }

    fn parse(data: &[u8]) -> ChunkResult<Document> {
        parse_bytes(data, ReaderOptions::default())
    }

    #[test]
    fn test_empty_stream_is_empty_document() {
        let doc = parse(&[]).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_minimal_form_with_empty_child() {
        let data = StreamBuilder::new()
            .form(b"AIFF", StreamBuilder::new().chunk(b"TEST", &[]))
            .build();
        assert_eq!(&data[4..8], &12u32.to_be_bytes());

        let doc = parse(&data).unwrap();
        assert_eq!(doc.len(), 1);
        let form_chunk = &doc.chunks[0];
        assert_eq!(form_chunk.kind(), ChunkKind::Form);
        assert_eq!(form_chunk.size(), 12);
        assert_eq!(form_chunk.data(), &data[8..20]);

        let form = form_chunk.as_form().unwrap();
        assert_eq!(form.form_type, FormType::Aiff);
        assert_eq!(form.chunks.len(), 1);
        assert_eq!(form.chunks[0].id(), ChunkId::new(*b"TEST"));
        assert!(form.chunks[0].data().is_empty());
    }

    #[test]
    fn test_generic_chunks_keep_raw_bytes() {
        let data = StreamBuilder::new()
            .chunk(b"COMM", &[1, 2, 3, 4, 5, 6])
            .chunk(b"SSND", &[9, 8, 7])
            .build();
        let doc = parse(&data).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.chunks[0].data(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(doc.chunks[1].data(), &[9, 8, 7]);
        assert_eq!(doc.chunks[1].kind(), ChunkKind::Generic);
    }

    #[test]
    fn test_marker_chunk_keeps_raw_bytes_and_empty_table() {
        let body = [0, 1, 0, 5, 0, 0, 0, 10, 3, b'a', b'b', b'c'];
        let data = StreamBuilder::new()
            .form(b"AIFC", StreamBuilder::new().chunk(b"MARK", &body))
            .build();
        let doc = parse(&data).unwrap();
        let mark = &doc.chunks[0].children()[0];
        assert_eq!(mark.kind(), ChunkKind::Marker);
        assert_eq!(mark.data(), &body);
        match &mark.body {
            ChunkBody::Marker(table) => assert!(table.markers.is_empty()),
            other => panic!("Expected marker body, got {:?}", other),
        }
        let markers = mark.markers().unwrap();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].id, 5);
        assert_eq!(markers[0].position, 10);
        assert_eq!(markers[0].name, "abc");
    }

    #[test]
    fn test_nested_forms() {
        let inner = StreamBuilder::new().chunk(b"COMM", &[0; 18]);
        let outer = StreamBuilder::new()
            .chunk(b"FVER", &[0xA2, 0x80, 0x51, 0x40])
            .form(b"AIFF", inner);
        let data = StreamBuilder::new().form(b"AIFC", outer).build();

        let doc = parse(&data).unwrap();
        let top = doc.chunks[0].as_form().unwrap();
        assert_eq!(top.form_type, FormType::Aifc);
        assert_eq!(top.chunks.len(), 2);
        let nested = top.chunks[1].as_form().unwrap();
        assert_eq!(nested.form_type, FormType::Aiff);
        assert_eq!(nested.chunks[0].data().len(), 18);
    }

    #[test]
    fn test_invalid_form_type() {
        let data = StreamBuilder::new()
            .form(b"WAVE", StreamBuilder::new().raw(&[0xFF; 8]))
            .build();
        let err = parse(&data).unwrap_err();
        match err {
            ChunkError::InvalidFormType { found, offset } => {
                assert_eq!(found, ChunkId::new(*b"WAVE"));
                assert_eq!(offset, 8);
            }
            other => panic!("Expected InvalidFormType, got {:?}", other),
        }
    }

    #[test]
    fn test_form_shortfall_is_truncated_container() {
        // Declares 20 bytes, holds form type + one 8-byte empty child = 12
        let mut data = StreamBuilder::new()
            .form(b"AIFF", StreamBuilder::new().chunk(b"TEST", &[]))
            .build();
        data[4..8].copy_from_slice(&20u32.to_be_bytes());
        let err = parse(&data).unwrap_err();
        assert!(matches!(
            err,
            ChunkError::TruncatedContainer {
                expected: 20,
                consumed: 12,
                ..
            }
        ));
    }

    #[test]
    fn test_child_overrunning_form_is_truncated_container() {
        // FORM declares 12 but its child claims 4 body bytes
        let mut data = Vec::new();
        data.extend_from_slice(b"FORM");
        data.extend_from_slice(&12u32.to_be_bytes());
        data.extend_from_slice(b"AIFF");
        data.extend_from_slice(b"TEST");
        data.extend_from_slice(&4u32.to_be_bytes());
        data.extend_from_slice(&[1, 2, 3, 4]);
        let err = parse(&data).unwrap_err();
        assert!(matches!(
            err,
            ChunkError::TruncatedContainer {
                expected: 12,
                consumed: 16,
                ..
            }
        ));
    }

    #[test]
    fn test_form_smaller_than_form_type() {
        let data = StreamBuilder::new().chunk(b"FORM", b"AI").build();
        assert!(matches!(
            parse(&data),
            Err(ChunkError::TruncatedContainer { expected: 2, .. })
        ));
    }

    #[test]
    fn test_truncated_generic_body_is_io_error() {
        let mut data = StreamBuilder::new().chunk(b"SSND", &[0; 16]).build();
        data.truncate(12);
        assert!(matches!(parse(&data), Err(ChunkError::Io(_))));
    }

    #[test]
    fn test_truncated_form_type_is_io_error() {
        let mut data = Vec::new();
        data.extend_from_slice(b"FORM");
        data.extend_from_slice(&12u32.to_be_bytes());
        data.extend_from_slice(b"AI");
        assert!(matches!(parse(&data), Err(ChunkError::Io(_))));
    }

    #[test]
    fn test_truncated_header_after_chunk() {
        let data = StreamBuilder::new()
            .chunk(b"COMM", &[0; 4])
            .raw(b"SSN")
            .build();
        assert!(matches!(parse(&data), Err(ChunkError::Io(_))));
    }

    #[test]
    fn test_invalid_child_header() {
        let data = StreamBuilder::new()
            .form(b"AIFF", StreamBuilder::new().chunk(b"CO\x00M", &[]))
            .build();
        assert!(matches!(
            parse(&data),
            Err(ChunkError::InvalidHeader { offset: 12, .. })
        ));
    }

    #[test]
    fn test_max_depth_enforced() {
        let mut nested = StreamBuilder::new().chunk(b"TEST", &[]);
        for _ in 0..4 {
            nested = StreamBuilder::new().form(b"AIFF", nested);
        }
        let data = nested.build();

        let ok = ReaderOptions {
            max_depth: 4,
            ..ReaderOptions::default()
        };
        assert!(parse_bytes(&data, ok).is_ok());

        let tight = ReaderOptions {
            max_depth: 3,
            ..ReaderOptions::default()
        };
        assert!(matches!(
            parse_bytes(&data, tight),
            Err(ChunkError::NestingTooDeep { depth: 4, max: 3 })
        ));
    }

    #[test]
    fn test_depth_resets_between_top_level_forms() {
        let data = StreamBuilder::new()
            .form(b"AIFF", StreamBuilder::new().chunk(b"TEST", &[]))
            .form(b"AIFF", StreamBuilder::new().chunk(b"TEST", &[]))
            .build();
        let opts = ReaderOptions {
            max_depth: 1,
            ..ReaderOptions::default()
        };
        assert_eq!(parse_bytes(&data, opts).unwrap().len(), 2);
    }

    #[test]
    fn test_odd_chunk_without_padding_option() {
        // Unpadded odd chunk followed directly by another chunk
        let data = StreamBuilder::new()
            .chunk(b"ANNO", b"odd")
            .chunk(b"NAME", b"ok")
            .build();
        let doc = parse(&data).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.chunks[1].data(), b"ok");
    }

    #[test]
    fn test_padded_odd_chunks_inside_form() {
        let children = StreamBuilder::new()
            .chunk(b"ANNO", b"odd")
            .raw(&[0])
            .chunk(b"NAME", b"ok");
        let data = StreamBuilder::new().form(b"AIFF", children).build();
        let opts = ReaderOptions {
            pad_odd_chunks: true,
            ..ReaderOptions::default()
        };
        let doc = parse_bytes(&data, opts).unwrap();
        let form = doc.chunks[0].as_form().unwrap();
        assert_eq!(form.chunks.len(), 2);
        assert_eq!(form.chunks[0].data(), b"odd");
        assert_eq!(form.chunks[1].data(), b"ok");

        // The same bytes without padding support misread the pad byte
        assert!(parse(&data).is_err());
    }

    #[test]
    fn test_padding_missing_at_end_of_stream() {
        let data = StreamBuilder::new().chunk(b"ANNO", b"odd").build();
        let opts = ReaderOptions {
            pad_odd_chunks: true,
            ..ReaderOptions::default()
        };
        let doc = parse_bytes(&data, opts).unwrap();
        assert_eq!(doc.chunks[0].data(), b"odd");
    }

    /// Fails every other `read` call with `Interrupted`
    struct Interrupting<R> {
        inner: R,
        interrupt_next: bool,
    }

    impl<R: Read> Read for Interrupting<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.interrupt_next {
                self.interrupt_next = false;
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            self.interrupt_next = true;
            self.inner.read(buf)
        }
    }

    impl<R: Seek> Seek for Interrupting<R> {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    #[test]
    fn test_interrupted_reads_are_retried() {
        let data = StreamBuilder::new()
            .chunk(b"ANNO", b"odd")
            .raw(&[0])
            .chunk(b"NAME", b"ok")
            .build();
        let stream = Interrupting {
            inner: Cursor::new(&data[..]),
            interrupt_next: true,
        };
        let opts = ReaderOptions {
            pad_odd_chunks: true,
            ..ReaderOptions::default()
        };
        let doc = ChunkReader::with_options(stream, opts)
            .read_document()
            .unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.chunks[0].data(), b"odd");
        assert_eq!(doc.chunks[1].data(), b"ok");
    }

    #[test]
    fn test_read_chunk_single_step() {
        let data = StreamBuilder::new()
            .chunk(b"COMM", &[1])
            .chunk(b"SSND", &[2, 3])
            .build();
        let mut reader = ChunkReader::new(Cursor::new(&data[..]));
        assert_eq!(reader.read_chunk().unwrap().unwrap().data(), &[1]);
        assert_eq!(reader.read_chunk().unwrap().unwrap().data(), &[2, 3]);
        assert!(reader.read_chunk().unwrap().is_none());
        assert_eq!(reader.into_inner().position(), data.len() as u64);
    }
}
