// SPDX-License-Identifier: ISC
//! Contract between [`Reader`](crate::Reader) and the block decoder it drives.
use thiserror::Error;

/// Failure reported by a [`DecodeEngine`].
///
/// The numeric code is engine-specific; the message is the engine's own
/// description of that code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{message} (code {code})")]
pub struct EngineError {
    code: i32,
    message: &'static str,
}

impl EngineError {
    /// Creates an engine error from a native code and its description.
    pub const fn new(code: i32, message: &'static str) -> Self {
        Self { code, message }
    }

    /// Returns the engine's native error code.
    pub const fn code(&self) -> i32 {
        self.code
    }

    /// Returns the engine's description of [`code`](Self::code).
    pub const fn message(&self) -> &'static str {
        self.message
    }
}

/// Outcome of a single [`DecodeEngine::decompress_step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The compressed stream is complete.
    Done,
    /// All input was consumed and decoding cannot continue without more.
    NeedsMoreInput,
    /// The output slice is full and the engine has more to produce.
    NeedsMoreOutput,
    /// The compressed stream is invalid.
    Error(EngineError),
}

/// Progress made by one [`DecodeEngine::decompress_step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Bytes written to the front of the output slice.
    pub written: usize,
    /// Bytes consumed from the front of the input slice.
    pub consumed: usize,
    /// Why the engine returned.
    pub status: StepStatus,
}

/// Stateful, buffer-oriented decoder driven by [`Reader`](crate::Reader).
///
/// The engine is created by its constructor and destroyed by `Drop`. A
/// dictionary, if any, is attached once before the first step and borrowed
/// for `'d`, so it outlives the engine.
///
/// Implementations must only report [`StepStatus::NeedsMoreInput`] after
/// consuming the whole input slice.
pub trait DecodeEngine<'d> {
    /// Attaches a shared dictionary. Called at most once, before decoding.
    fn attach_dictionary(&mut self, dictionary: &'d [u8]) -> Result<(), EngineError>;

    /// Decodes as much of `input` into `output` as possible.
    fn decompress_step(&mut self, input: &[u8], output: &mut [u8]) -> Step;

    /// Returns `true` while decoded bytes are held internally awaiting output space.
    fn has_buffered_output(&self) -> bool;

    /// Returns `true` once the end of the compressed stream has been decoded.
    fn is_finished(&self) -> bool;
}

impl<'d, E: DecodeEngine<'d> + ?Sized> DecodeEngine<'d> for Box<E> {
    #[inline]
    fn attach_dictionary(&mut self, dictionary: &'d [u8]) -> Result<(), EngineError> {
        (**self).attach_dictionary(dictionary)
    }

    #[inline]
    fn decompress_step(&mut self, input: &[u8], output: &mut [u8]) -> Step {
        (**self).decompress_step(input, output)
    }

    #[inline]
    fn has_buffered_output(&self) -> bool {
        (**self).has_buffered_output()
    }

    #[inline]
    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }
}
