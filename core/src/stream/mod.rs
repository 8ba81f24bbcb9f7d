//! Byte source abstraction with buffered read/peek and a growable,
//! compacting buffer.
//!
//! `ByteStream` supports both whole-input and incremental (chunked) parsing
//! over four source kinds: an in-memory slice, a file handle, a pull-based
//! reader callback, or an externally-owned buffer the caller appends into
//! directly. All four share one buffered cursor implementation; only
//! `fill_buffer` differs per source.

use core::fmt;

mod ring;
pub use ring::RingBuffer;

/// Default initial buffer capacity when no hint is given.
const DEFAULT_BUFFER_HINT: usize = 4096;

/// Buffer growth factor applied by `append` when more room is needed.
const GROWTH_FACTOR: f64 = 1.5;

/// The origin of the bytes a [`ByteStream`] draws from.
pub enum Source {
    /// A fixed in-memory slice, fully available up front.
    Memory,
    /// A file-like handle read in best-effort chunks via a user callback.
    File,
    /// A pull-based reader: `fill` is called to fetch more bytes on demand.
    Reader(Box<dyn FnMut(&mut [u8]) -> Result<usize, StreamError>>),
    /// An externally-owned buffer the caller appends into directly (the
    /// incremental/chunked parsing path).
    External,
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Source::Memory => "Memory",
            Source::File => "File",
            Source::Reader(_) => "Reader",
            Source::External => "External",
        };
        f.debug_tuple("Source").field(&name).finish()
    }
}

impl Source {
    fn kind_name(&self) -> &'static str {
        match self {
            Source::Memory => "memory",
            Source::File => "file",
            Source::Reader(_) => "reader",
            Source::External => "external",
        }
    }
}

/// Failure modes for [`ByteStream`] operations.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("append would exceed the configured maximum buffer size ({max} bytes)")]
    AppendExceedsMaxBuffer { max: usize },

    #[error("cannot resize a buffer owned externally by the caller")]
    CannotResizeExternalBuffer,

    #[error("cannot seek a non-memory source")]
    CannotSeekNonMemorySource,

    #[error("I/O error reading from source: {0}")]
    IoError(String),
}

/// Buffer occupancy snapshot returned by [`ByteStream::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    pub buffer_size: usize,
    pub used: usize,
    pub free: usize,
    pub total_consumed: u64,
    pub source_kind: &'static str,
}

/// A buffered byte source with peek/consume/append/compact, used by both the
/// zero-alloc [`crate::token_stream::TokenStream`] (over a fixed memory
/// slice) and the allocating [`crate::tokenizer::Tokenizer`].
///
/// Invariant: `0 <= read_cursor <= write_cursor <= buffer.len()`. Available,
/// unread bytes are always `buffer[read_cursor..write_cursor]`.
pub struct ByteStream {
    buffer: Vec<u8>,
    read_cursor: usize,
    write_cursor: usize,
    total_consumed: u64,
    position: crate::position::Position,
    last_byte: Option<u8>,
    exhausted: bool,
    finished: bool,
    source: Source,
    max_buffer: usize,
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteStream")
            .field("read_cursor", &self.read_cursor)
            .field("write_cursor", &self.write_cursor)
            .field("total_consumed", &self.total_consumed)
            .field("position", &self.position)
            .field("exhausted", &self.exhausted)
            .field("finished", &self.finished)
            .field("source", &self.source)
            .finish()
    }
}

impl ByteStream {
    fn blank(source: Source, buffer_hint: Option<usize>, max_buffer: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(buffer_hint.unwrap_or(DEFAULT_BUFFER_HINT)),
            read_cursor: 0,
            write_cursor: 0,
            total_consumed: 0,
            position: crate::position::Position::new(),
            last_byte: None,
            exhausted: false,
            finished: false,
            source,
            max_buffer,
        }
    }

    /// Builds a stream over an in-memory slice, fully available from the
    /// start. Marked `finished` immediately: the whole input is already
    /// buffered, so there is never any ambiguity about whether more bytes
    /// might still arrive.
    pub fn from_memory(slice: &[u8], buffer_hint: Option<usize>) -> Self {
        let mut s = Self::blank(Source::Memory, buffer_hint.or(Some(slice.len())), usize::MAX);
        s.buffer.extend_from_slice(slice);
        s.write_cursor = s.buffer.len();
        s.finished = true;
        s
    }

    /// Builds a stream that pulls bytes from `reader` on demand, one
    /// best-effort read per `fill_buffer` call.
    pub fn from_reader(
        reader: impl FnMut(&mut [u8]) -> Result<usize, StreamError> + 'static,
        buffer_hint: Option<usize>,
    ) -> Self {
        Self::blank(Source::Reader(Box::new(reader)), buffer_hint, usize::MAX)
    }

    /// Builds a stream over a file-like source; bytes must be supplied via
    /// `append` since the core library performs no filesystem I/O itself —
    /// callers own file access and feed chunks in.
    pub fn from_file(buffer_hint: Option<usize>) -> Self {
        Self::blank(Source::File, buffer_hint, usize::MAX)
    }

    /// Builds a stream over an externally-owned buffer fed exclusively via
    /// `append` (the incremental/chunked parsing path).
    pub fn with_buffer(buffer_hint: Option<usize>) -> Self {
        Self::blank(Source::External, buffer_hint, usize::MAX)
    }

    /// Sets the maximum buffer size `append` is allowed to grow to.
    pub fn with_max_buffer(mut self, max_buffer: usize) -> Self {
        self.max_buffer = max_buffer;
        self
    }

    #[inline]
    fn available(&self) -> usize {
        self.write_cursor - self.read_cursor
    }

    /// Attempts one best-effort read from a pull-based source to top up the
    /// buffer. No-op for `Memory`/`External` sources (they have no pull
    /// step) and for `File` (callers feed it via `append`).
    fn fill_buffer(&mut self) -> Result<(), StreamError> {
        if self.exhausted {
            return Ok(());
        }
        let read = match &mut self.source {
            Source::Reader(reader) => {
                self.compact();
                let start = self.write_cursor;
                let want = DEFAULT_BUFFER_HINT;
                if self.buffer.len() < start + want {
                    self.buffer.resize(start + want, 0);
                }
                let n = reader(&mut self.buffer[start..start + want])?;
                self.buffer.truncate(start + n.max(0));
                n
            }
            _ => return Ok(()),
        };
        self.write_cursor += read;
        if read == 0 {
            self.exhausted = true;
        }
        Ok(())
    }

    /// Non-consuming peek at the next byte, filling the buffer as needed.
    pub fn peek(&mut self) -> Option<u8> {
        self.peek_at(0)
    }

    /// Non-consuming peek `offset` bytes ahead of the read cursor, filling
    /// the buffer as needed.
    pub fn peek_at(&mut self, offset: usize) -> Option<u8> {
        while self.available() <= offset && !self.exhausted {
            if self.fill_buffer().is_err() {
                return None;
            }
            if matches!(self.source, Source::Memory | Source::External | Source::File) {
                break;
            }
        }
        self.buffer.get(self.read_cursor + offset).copied()
    }

    /// Consumes and returns the next byte, advancing position tracking.
    pub fn consume(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.read_cursor += 1;
        self.total_consumed += 1;
        self.position.advance(byte, self.last_byte);
        self.last_byte = Some(byte);
        if self.read_cursor >= self.write_cursor
            && self.exhausted
            && matches!(self.source, Source::Reader(_))
        {
            self.exhausted = true;
        }
        Some(byte)
    }

    /// Consumes the next byte only if it equals `expected`.
    pub fn consume_if(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.consume();
            true
        } else {
            false
        }
    }

    /// Consumes up to `n` bytes, returning how many were actually consumed.
    pub fn consume_count(&mut self, n: usize) -> usize {
        let mut count = 0;
        while count < n && self.consume().is_some() {
            count += 1;
        }
        count
    }

    /// Current position (offset/line/column) of the read cursor.
    pub fn position(&self) -> crate::position::Position {
        self.position
    }

    /// Repositions a memory-backed stream to an arbitrary offset. Fails for
    /// any non-memory source.
    pub fn set_position(&mut self, offset: u64) -> Result<(), StreamError> {
        if !matches!(self.source, Source::Memory) {
            return Err(StreamError::CannotSeekNonMemorySource);
        }
        let offset = offset as usize;
        if offset > self.buffer.len() {
            return Err(StreamError::CannotSeekNonMemorySource);
        }
        self.read_cursor = offset;
        self.total_consumed = offset as u64;
        self.position = crate::position::Position::new();
        self.last_byte = None;
        // Recompute line/column by replaying consumed bytes; memory sources
        // are small/bounded relative to typical use, and this keeps the
        // invariant (`total_consumed` == bytes returned by consume) exact
        // without storing a full position table.
        let mut prev = None;
        for i in 0..offset {
            let b = self.buffer[i];
            self.position.advance(b, prev);
            prev = Some(b);
        }
        self.last_byte = prev;
        Ok(())
    }

    /// Appends bytes to the buffer (the incremental/chunked parsing path).
    /// Grows the buffer by ~1.5x when more room is needed.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        let needed = self.write_cursor + bytes.len();
        if needed > self.max_buffer {
            return Err(StreamError::AppendExceedsMaxBuffer {
                max: self.max_buffer,
            });
        }
        if needed > self.buffer.len() {
            let mut new_cap = (self.buffer.capacity().max(1) as f64 * GROWTH_FACTOR) as usize;
            while new_cap < needed {
                new_cap = (new_cap.max(1) as f64 * GROWTH_FACTOR) as usize;
            }
            self.buffer.reserve(new_cap - self.buffer.len());
        }
        self.buffer.truncate(self.write_cursor);
        self.buffer.extend_from_slice(bytes);
        self.write_cursor += bytes.len();
        self.exhausted = false;
        Ok(())
    }

    /// Moves unread data to the start of the buffer. Idempotent.
    pub fn compact(&mut self) {
        if self.read_cursor == 0 {
            return;
        }
        self.buffer.copy_within(self.read_cursor..self.write_cursor, 0);
        self.write_cursor -= self.read_cursor;
        self.buffer.truncate(self.write_cursor);
        self.read_cursor = 0;
    }

    /// Restarts a memory or file source from offset 0. Fails for
    /// reader/external sources, which have no stable "beginning" to rewind
    /// to.
    pub fn reset(&mut self) -> Result<(), StreamError> {
        match self.source {
            Source::Memory | Source::File => {
                self.read_cursor = 0;
                self.total_consumed = 0;
                self.position = crate::position::Position::new();
                self.last_byte = None;
                self.exhausted = false;
                Ok(())
            }
            _ => Err(StreamError::CannotSeekNonMemorySource),
        }
    }

    /// True once no source and no buffered data remain.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted && self.available() == 0
    }

    /// Declares that no further `append` calls are coming for a `File` or
    /// `External` source. A `Reader` source reaches the same state on its
    /// own once a read returns zero bytes; `Memory` is finished at
    /// construction.
    ///
    /// This is what lets an unbounded pattern (`one_or_more`, `until`) at the
    /// tail of incrementally-appended input resolve: until it's called, a
    /// match that consumes every currently-buffered byte is treated as
    /// "might still grow" rather than committed.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// True once the caller has signaled (via [`Self::finish`], reaching
    /// true end-of-reader, or being a `Memory` source) that no more bytes
    /// will ever be appended.
    pub fn is_finished(&self) -> bool {
        self.finished || self.exhausted
    }

    /// A snapshot of current buffer occupancy.
    pub fn stats(&self) -> StreamStats {
        StreamStats {
            buffer_size: self.buffer.capacity(),
            used: self.available(),
            free: self.buffer.capacity().saturating_sub(self.write_cursor),
            total_consumed: self.total_consumed,
            source_kind: self.source.kind_name(),
        }
    }

    /// Borrows the currently-buffered unread bytes, without consuming them.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer[self.read_cursor..self.write_cursor]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_stream_consumes_in_order() {
        let mut s = ByteStream::from_memory(b"abc", None);
        assert_eq!(s.consume(), Some(b'a'));
        assert_eq!(s.consume(), Some(b'b'));
        assert_eq!(s.consume(), Some(b'c'));
        assert_eq!(s.consume(), None);
        assert_eq!(s.stats().total_consumed, 3);
    }

    #[test]
    fn peek_does_not_advance() {
        let mut s = ByteStream::from_memory(b"ab", None);
        assert_eq!(s.peek(), Some(b'a'));
        assert_eq!(s.peek(), Some(b'a'));
        s.consume();
        assert_eq!(s.peek(), Some(b'b'));
    }

    #[test]
    fn append_preserves_unread_bytes() {
        let mut s = ByteStream::with_buffer(None);
        s.append(b"he").unwrap();
        s.consume();
        s.append(b"llo").unwrap();
        let mut rest = Vec::new();
        while let Some(b) = s.consume() {
            rest.push(b);
        }
        assert_eq!(rest, b"ello");
    }

    #[test]
    fn line_column_tracks_newlines() {
        let mut s = ByteStream::from_memory(b"a\nb", None);
        s.consume();
        assert_eq!(s.position().line, 1);
        s.consume();
        assert_eq!(s.position().line, 2);
        assert_eq!(s.position().column, 1);
    }

    #[test]
    fn compact_is_idempotent() {
        let mut s = ByteStream::from_memory(b"abcdef", None);
        s.consume_count(3);
        s.compact();
        let before = s.buffered().to_vec();
        s.compact();
        assert_eq!(s.buffered(), before);
    }

    #[test]
    fn append_exceeding_max_buffer_errors() {
        let mut s = ByteStream::with_buffer(None).with_max_buffer(4);
        assert!(s.append(b"abcde").is_err());
    }

    #[test]
    fn set_position_requires_memory_source() {
        let mut s = ByteStream::with_buffer(None);
        assert!(matches!(
            s.set_position(0),
            Err(StreamError::CannotSeekNonMemorySource)
        ));
    }

    #[test]
    fn reset_restarts_memory_source() {
        let mut s = ByteStream::from_memory(b"abc", None);
        s.consume_count(2);
        s.reset().unwrap();
        assert_eq!(s.stats().total_consumed, 0);
        assert_eq!(s.consume(), Some(b'a'));
    }
}
