// SPDX-License-Identifier: ISC
use std::io;

use thiserror::Error;

use crate::EngineError;

/// Result type used by this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for streaming decompression.
#[derive(Debug, Error)]
pub enum Error {
    /// The reader was already closed.
    #[error("reader is closed")]
    Closed,
    /// The underlying source failed. Passed through unchanged.
    #[error(transparent)]
    Source(#[from] io::Error),
    /// The source ran dry before the compressed stream was complete.
    #[error("unexpected end of compressed stream")]
    UnexpectedEof,
    /// Input remains after the end of the compressed stream.
    #[error("excessive input after end of compressed stream")]
    ExcessiveInput,
    /// The output buffer cannot hold a single decoded unit.
    #[error("output buffer too small")]
    ShortBuffer,
    /// The engine asked for more input while input was still pending.
    #[error("decoder requested input while input was pending")]
    InvalidState,
    /// The engine rejected the compressed data or the dictionary.
    #[error("decode failed: {0}")]
    Engine(#[from] EngineError),
    /// A dictionary was supplied but it has no bytes.
    #[error("dictionary is empty")]
    EmptyDictionary,
    /// Configuration is invalid.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
}

impl Error {
    /// Returns the engine error, if this is one.
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            Self::Engine(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        let kind = match value {
            Error::Source(err) => return err,
            Error::UnexpectedEof => io::ErrorKind::UnexpectedEof,
            Error::ExcessiveInput | Error::Engine(_) => io::ErrorKind::InvalidData,
            Error::ShortBuffer | Error::EmptyDictionary | Error::InvalidParameter(_) => {
                io::ErrorKind::InvalidInput
            }
            Error::Closed | Error::InvalidState => io::ErrorKind::Other,
        };
        io::Error::new(kind, value)
    }
}
