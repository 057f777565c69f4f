// SPDX-License-Identifier: ISC
use std::io::{self, Read};

use log::{debug, trace, warn};

use crate::engine::{DecodeEngine, StepStatus};
use crate::{Error, LzfDecoder, Result};

/// Default read-ahead buffer size: large enough to keep engine round-trips
/// cheap without holding much memory per reader.
pub const DEFAULT_BUF_SIZE: usize = 32 * 1024;

/// Status of a successful [`Reader::read_with_status`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// More decoded data may follow.
    More,
    /// The compressed stream ended cleanly; nothing more will be produced.
    EndOfStream,
}

/// Result of [`Reader::read_with_status`].
///
/// `count` bytes at the front of the caller's buffer are valid decoded data
/// even when `status` is an error.
#[derive(Debug)]
#[must_use]
pub struct ReadOutcome {
    /// Decoded bytes written to the caller's buffer.
    pub count: usize,
    /// Whether the stream continues, ended, or failed.
    pub status: Result<ReadStatus>,
}

impl ReadOutcome {
    fn more(count: usize) -> Self {
        Self { count, status: Ok(ReadStatus::More) }
    }

    fn end() -> Self {
        Self { count: 0, status: Ok(ReadStatus::EndOfStream) }
    }

    fn failed(count: usize, err: Error) -> Self {
        Self { count, status: Err(err) }
    }

    /// Returns `true` when the stream ended cleanly.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self.status, Ok(ReadStatus::EndOfStream))
    }
}

/// Undecoded input not yet handed to the engine.
#[derive(Debug, Clone, Copy)]
enum Window<'a> {
    /// `buf[pos..end]` of the read-ahead buffer.
    Buffered { pos: usize, end: usize },
    /// Suffix of caller-supplied compressed bytes.
    Borrowed(&'a [u8]),
}

impl<'a> Window<'a> {
    const EMPTY: Self = Self::Buffered { pos: 0, end: 0 };

    fn slice<'s>(&'s self, buf: &'s [u8]) -> &'s [u8] {
        match *self {
            Self::Buffered { pos, end } => &buf[pos..end],
            Self::Borrowed(bytes) => bytes,
        }
    }

    fn is_empty(&self) -> bool {
        match *self {
            Self::Buffered { pos, end } => pos == end,
            Self::Borrowed(bytes) => bytes.is_empty(),
        }
    }

    fn advance(&mut self, n: usize) {
        match self {
            Self::Buffered { pos, .. } => *pos += n,
            Self::Borrowed(bytes) => {
                let rest: &'a [u8] = *bytes;
                *bytes = &rest[n..];
            }
        }
    }
}

/// Pull-based reader that decompresses a compressed source.
///
/// The reader owns a decode engine (by default [`LzfDecoder`]) and a
/// read-ahead buffer. Each read hands the buffered compressed bytes and the
/// caller's buffer to the engine, refilling from the source only when the
/// engine has nothing left to give.
///
/// A dictionary, if supplied, is borrowed for `'d` and therefore stays valid
/// and unmoved until the engine is gone.
///
/// # Example
///
/// ```
/// use std::io::Read;
/// use lzf_stream::Reader;
///
/// let compressed = [b'Z', b'V', 0, 0, 5, b'h', b'e', b'l', b'l', b'o', 0];
/// let mut reader = Reader::new(&compressed[..]);
///
/// let mut out = Vec::new();
/// reader.read_to_end(&mut out).unwrap();
/// assert_eq!(out, b"hello");
/// reader.close().unwrap();
/// ```
pub struct Reader<'d, R, E = LzfDecoder<'d>> {
    source: R,
    engine: Option<E>,
    dictionary: Option<&'d [u8]>,
    buf: Box<[u8]>,
    window: Window<'d>,
    deferred: Option<Error>,
}

impl<'d, R: Read> Reader<'d, R> {
    /// Creates a reader decoding `source` with the default buffer size.
    pub fn new(source: R) -> Self {
        Self::assemble(source, LzfDecoder::new(), None, DEFAULT_BUF_SIZE, Window::EMPTY)
    }

    /// Creates a reader with a read-ahead buffer of `capacity` bytes.
    ///
    /// Returns `Error::InvalidParameter` if `capacity` is zero.
    pub fn with_capacity(capacity: usize, source: R) -> Result<Self> {
        Self::with_engine(source, LzfDecoder::new(), None, capacity)
    }

    /// Creates a reader decoding a stream compressed against `dictionary`.
    ///
    /// Returns `Error::EmptyDictionary` for an empty dictionary.
    pub fn with_dictionary(source: R, dictionary: &'d [u8]) -> Result<Self> {
        Self::with_engine(source, LzfDecoder::new(), Some(dictionary), DEFAULT_BUF_SIZE)
    }
}

impl<'d, R: Read, E: DecodeEngine<'d>> Reader<'d, R, E> {
    /// Creates a reader driving a caller-supplied engine.
    ///
    /// The dictionary, if any, is attached to `engine` before any input is
    /// read. Engine attachment failures are returned as `Error::Engine`.
    pub fn with_engine(
        source: R,
        engine: E,
        dictionary: Option<&'d [u8]>,
        capacity: usize,
    ) -> Result<Self> {
        Self::from_parts(source, engine, dictionary, capacity, Window::EMPTY)
    }

    pub(crate) fn preloaded(
        source: R,
        engine: E,
        dictionary: Option<&'d [u8]>,
        capacity: usize,
        input: &'d [u8],
    ) -> Result<Self> {
        Self::from_parts(source, engine, dictionary, capacity, Window::Borrowed(input))
    }

    fn from_parts(
        source: R,
        mut engine: E,
        dictionary: Option<&'d [u8]>,
        capacity: usize,
        window: Window<'d>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidParameter("read buffer capacity must be non-zero"));
        }
        if let Some(dict) = dictionary {
            if dict.is_empty() {
                return Err(Error::EmptyDictionary);
            }
            engine.attach_dictionary(dict)?;
            debug!("attached {} byte dictionary", dict.len());
        }
        Ok(Self::assemble(source, engine, dictionary, capacity, window))
    }

    fn assemble(
        source: R,
        engine: E,
        dictionary: Option<&'d [u8]>,
        capacity: usize,
        window: Window<'d>,
    ) -> Self {
        debug!(
            "opened reader: buffer={capacity} dictionary={}",
            dictionary.map_or(0, <[u8]>::len)
        );
        Self {
            source,
            engine: Some(engine),
            dictionary,
            buf: vec![0u8; capacity].into_boxed_slice(),
            window,
            deferred: None,
        }
    }

    /// Decodes into `buf`, reporting how many bytes were produced and why the
    /// call returned.
    ///
    /// Blocks on the source only when no decoded bytes are available yet. A
    /// zero-length `buf` returns `(0, More)` without invoking the engine.
    /// End of stream is reported by the first call after the last byte was
    /// returned.
    pub fn read_with_status(&mut self, buf: &mut [u8]) -> ReadOutcome {
        let Some(engine) = self.engine.as_mut() else {
            return ReadOutcome::failed(0, Error::Closed);
        };

        if !engine.has_buffered_output() && self.window.is_empty() {
            match fill(&mut self.source, &mut self.buf) {
                Err(err) => return ReadOutcome::failed(0, Error::Source(err)),
                Ok(0) if engine.is_finished() => return ReadOutcome::end(),
                Ok(0) => return ReadOutcome::failed(0, Error::UnexpectedEof),
                Ok(n) => self.window = Window::Buffered { pos: 0, end: n },
            }
        }

        if buf.is_empty() {
            return ReadOutcome::more(0);
        }

        loop {
            let step = engine.decompress_step(self.window.slice(&self.buf), buf);
            self.window.advance(step.consumed);
            let n = step.written;

            match step.status {
                StepStatus::Done => {
                    if !self.window.is_empty() {
                        warn!("compressed stream ended with unconsumed input");
                        return ReadOutcome::failed(n, Error::ExcessiveInput);
                    }
                    return ReadOutcome::more(n);
                }
                StepStatus::Error(err) => return ReadOutcome::failed(n, Error::Engine(err)),
                StepStatus::NeedsMoreOutput => {
                    if n == 0 {
                        return ReadOutcome::failed(0, Error::ShortBuffer);
                    }
                    return ReadOutcome::more(n);
                }
                StepStatus::NeedsMoreInput => {}
            }

            if !self.window.is_empty() {
                warn!("decoder requested input with input pending");
                return ReadOutcome::failed(n, Error::InvalidState);
            }

            // Reading the source may block; return what we have first.
            if n > 0 {
                return ReadOutcome::more(n);
            }

            match fill(&mut self.source, &mut self.buf) {
                Err(err) => return ReadOutcome::failed(0, Error::Source(err)),
                Ok(0) => return ReadOutcome::failed(0, Error::UnexpectedEof),
                Ok(m) => self.window = Window::Buffered { pos: 0, end: m },
            }
        }
    }

    /// Drops the decode engine and releases the dictionary.
    ///
    /// Undrained output is discarded. Returns `Error::Closed` if the reader
    /// was already closed.
    pub fn close(&mut self) -> Result<()> {
        let Some(engine) = self.engine.take() else {
            return Err(Error::Closed);
        };
        drop(engine);
        self.dictionary = None;
        self.deferred = None;
        debug!("closed reader");
        Ok(())
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.engine.is_none()
    }

    /// Returns `true` when the engine has decoded the end of the stream.
    pub fn is_finished(&self) -> bool {
        self.engine.as_ref().is_some_and(E::is_finished)
    }

    /// Returns the dictionary held for the engine, if any.
    pub fn dictionary(&self) -> Option<&'d [u8]> {
        self.dictionary
    }
}

impl<'d, R, E> Reader<'d, R, E> {
    /// Unwraps the reader and returns the underlying source.
    ///
    /// Compressed bytes already read from the source but not yet decoded are
    /// lost.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Returns a shared reference to the underlying source.
    pub fn inner(&self) -> &R {
        &self.source
    }

    /// Returns a mutable reference to the underlying source.
    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.source
    }
}

impl<'d, R: Read, E: DecodeEngine<'d>> Read for Reader<'d, R, E> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(err) = self.deferred.take() {
            return Err(err.into());
        }

        loop {
            let ReadOutcome { count, status } = self.read_with_status(buf);
            match status {
                // The engine finished on a call that produced nothing; the
                // next call reports end of stream or excessive input.
                Ok(ReadStatus::More) if count == 0 && !buf.is_empty() => continue,
                Ok(_) => return Ok(count),
                Err(err) if count > 0 => {
                    self.deferred = Some(err);
                    return Ok(count);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

fn fill<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let n = source.read(buf)?;
    trace!("read {n} compressed bytes from source");
    Ok(n)
}
