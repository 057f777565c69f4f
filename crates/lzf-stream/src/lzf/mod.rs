// SPDX-License-Identifier: ISC
//! Resumable decoder for framed LZF block streams.
//!
//! Stream layout (integers big-endian):
//!
//! - `Z V 0x00 len:u16` followed by `len` stored bytes.
//! - `Z V 0x01 clen:u16 ulen:u16` followed by `clen` bytes of raw LZF tokens
//!   decoding to `ulen` bytes.
//! - `Z V 0x02 crc32:u32` declaring the CRC-32 of the dictionary the following
//!   blocks reference.
//! - A single `0x00` byte ending the stream.
mod raw;

use crate::engine::{DecodeEngine, EngineError, Step, StepStatus};

const MAGIC_0: u8 = b'Z';
const MAGIC_1: u8 = b'V';
const END_OF_STREAM: u8 = 0;
const TYPE_UNCOMPRESSED: u8 = 0;
const TYPE_COMPRESSED: u8 = 1;
const TYPE_DICTIONARY: u8 = 2;
const PREAMBLE_SIZE: usize = 3;
const TYPE0_HDR_SIZE: usize = 5;
const TYPE1_HDR_SIZE: usize = 7;
const TYPE2_HDR_SIZE: usize = 7;
const MAX_HDR_SIZE: usize = 7;

/// Native failure codes of [`LzfDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum DecodeFault {
    /// A block does not start with `ZV`.
    InvalidMagic = -1,
    /// A block type tag is not recognised.
    UnknownBlockType = -2,
    /// A compressed block holds malformed tokens.
    CorruptBlock = -3,
    /// A compressed block does not decode to its declared size.
    BlockSizeMismatch = -4,
    /// The stream references a dictionary but none is attached.
    DictionaryRequired = -5,
    /// The attached dictionary is not the one the stream references.
    DictionaryMismatch = -6,
    /// A dictionary was attached after decoding started.
    DictionaryAfterStart = -7,
    /// A dictionary was attached twice.
    DictionaryAlreadyAttached = -8,
}

impl DecodeFault {
    /// Returns the stable numeric code.
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Returns a human readable description.
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidMagic => "invalid block header",
            Self::UnknownBlockType => "unknown block type",
            Self::CorruptBlock => "corrupt compressed block",
            Self::BlockSizeMismatch => "block size mismatch",
            Self::DictionaryRequired => "stream requires a dictionary",
            Self::DictionaryMismatch => "dictionary does not match stream",
            Self::DictionaryAfterStart => "dictionary attached after decoding started",
            Self::DictionaryAlreadyAttached => "dictionary already attached",
        }
    }

    /// Maps an [`EngineError`] code back to the fault, if it is one of ours.
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            -1 => Self::InvalidMagic,
            -2 => Self::UnknownBlockType,
            -3 => Self::CorruptBlock,
            -4 => Self::BlockSizeMismatch,
            -5 => Self::DictionaryRequired,
            -6 => Self::DictionaryMismatch,
            -7 => Self::DictionaryAfterStart,
            -8 => Self::DictionaryAlreadyAttached,
            _ => return None,
        })
    }
}

impl From<DecodeFault> for EngineError {
    fn from(value: DecodeFault) -> Self {
        EngineError::new(value.code(), value.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Collecting a block header into `header[..header_len]`.
    Header,
    /// Stored bytes left in the current uncompressed block.
    Stored(usize),
    /// Collecting a compressed payload into `payload`.
    Payload { compressed: usize, uncompressed: usize },
    /// Handing out `block[block_pos..]`.
    Drain,
    Finished,
    Failed(DecodeFault),
}

/// Resumable decoder for the framed LZF block stream.
///
/// Accepts input and output in arbitrarily small pieces: headers and
/// compressed payloads may be split across calls, stored blocks are copied
/// straight through, and a decoded compressed block is held until the caller
/// provides room for it.
///
/// # Example
///
/// ```
/// use lzf_stream::{DecodeEngine, LzfDecoder, StepStatus};
///
/// let stream = [b'Z', b'V', 0, 0, 2, b'h', b'i', 0];
/// let mut decoder = LzfDecoder::new();
/// let mut out = [0u8; 8];
///
/// let step = decoder.decompress_step(&stream, &mut out);
/// assert_eq!(step.status, StepStatus::Done);
/// assert_eq!(&out[..step.written], b"hi");
/// assert!(decoder.is_finished());
/// ```
#[derive(Debug)]
pub struct LzfDecoder<'d> {
    stage: Stage,
    header: [u8; MAX_HDR_SIZE],
    header_len: usize,
    payload: Vec<u8>,
    block: Vec<u8>,
    block_pos: usize,
    dictionary: Option<&'d [u8]>,
    history: &'d [u8],
    started: bool,
}

impl Default for LzfDecoder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'d> LzfDecoder<'d> {
    /// Creates a decoder positioned at the start of a stream.
    pub fn new() -> Self {
        Self {
            stage: Stage::Header,
            header: [0; MAX_HDR_SIZE],
            header_len: 0,
            payload: Vec::new(),
            block: Vec::new(),
            block_pos: 0,
            dictionary: None,
            history: &[],
            started: false,
        }
    }

    /// Returns the fault that stopped decoding, if any.
    pub fn fault(&self) -> Option<DecodeFault> {
        match self.stage {
            Stage::Failed(fault) => Some(fault),
            _ => None,
        }
    }

    fn header_target(&self) -> Result<usize, DecodeFault> {
        if self.header_len < PREAMBLE_SIZE {
            return Ok(PREAMBLE_SIZE);
        }
        if self.header[0] != MAGIC_0 || self.header[1] != MAGIC_1 {
            return Err(DecodeFault::InvalidMagic);
        }
        match self.header[2] {
            TYPE_UNCOMPRESSED => Ok(TYPE0_HDR_SIZE),
            TYPE_COMPRESSED => Ok(TYPE1_HDR_SIZE),
            TYPE_DICTIONARY => Ok(TYPE2_HDR_SIZE),
            _ => Err(DecodeFault::UnknownBlockType),
        }
    }

    fn begin_block(&mut self) -> Result<Stage, DecodeFault> {
        let h = &self.header;
        match h[2] {
            TYPE_UNCOMPRESSED => Ok(Stage::Stored(usize::from(u16::from_be_bytes([h[3], h[4]])))),
            TYPE_COMPRESSED => {
                let compressed = usize::from(u16::from_be_bytes([h[3], h[4]]));
                let uncompressed = usize::from(u16::from_be_bytes([h[5], h[6]]));
                self.payload.clear();
                self.payload.reserve(compressed);
                Ok(Stage::Payload { compressed, uncompressed })
            }
            TYPE_DICTIONARY => {
                let expected = u32::from_be_bytes([h[3], h[4], h[5], h[6]]);
                let dictionary = self.dictionary.ok_or(DecodeFault::DictionaryRequired)?;
                if crc32fast::hash(dictionary) != expected {
                    return Err(DecodeFault::DictionaryMismatch);
                }
                self.history = dictionary;
                Ok(Stage::Header)
            }
            _ => Err(DecodeFault::UnknownBlockType),
        }
    }

    fn expand(&mut self, uncompressed: usize) -> Result<Stage, DecodeFault> {
        self.block.resize(uncompressed, 0);
        let written = raw::decompress(&self.payload, &mut self.block, self.history)?;
        if written != uncompressed {
            return Err(DecodeFault::BlockSizeMismatch);
        }
        self.block_pos = 0;
        Ok(Stage::Drain)
    }
}

impl<'d> DecodeEngine<'d> for LzfDecoder<'d> {
    fn attach_dictionary(&mut self, dictionary: &'d [u8]) -> Result<(), EngineError> {
        if self.started {
            return Err(DecodeFault::DictionaryAfterStart.into());
        }
        if self.dictionary.is_some() {
            return Err(DecodeFault::DictionaryAlreadyAttached.into());
        }
        self.dictionary = Some(dictionary);
        Ok(())
    }

    fn decompress_step(&mut self, input: &[u8], output: &mut [u8]) -> Step {
        let mut ip = 0usize;
        let mut op = 0usize;

        let status = loop {
            match self.stage {
                Stage::Finished => break StepStatus::Done,
                Stage::Failed(fault) => break StepStatus::Error(fault.into()),
                Stage::Header => {
                    if self.header_len == 0 {
                        if ip == input.len() {
                            break StepStatus::NeedsMoreInput;
                        }
                        if input[ip] == END_OF_STREAM {
                            ip += 1;
                            self.stage = Stage::Finished;
                            continue;
                        }
                    }

                    let target = match self.header_target() {
                        Ok(target) => target,
                        Err(fault) => {
                            self.stage = Stage::Failed(fault);
                            continue;
                        }
                    };
                    let take = (target - self.header_len).min(input.len() - ip);
                    self.header[self.header_len..self.header_len + take]
                        .copy_from_slice(&input[ip..ip + take]);
                    self.header_len += take;
                    ip += take;

                    if self.header_len < target {
                        break StepStatus::NeedsMoreInput;
                    }
                    if target == PREAMBLE_SIZE {
                        continue;
                    }

                    self.header_len = 0;
                    self.stage = self.begin_block().unwrap_or_else(Stage::Failed);
                }
                Stage::Stored(0) => self.stage = Stage::Header,
                Stage::Stored(remaining) => {
                    let take = remaining.min(input.len() - ip).min(output.len() - op);
                    output[op..op + take].copy_from_slice(&input[ip..ip + take]);
                    ip += take;
                    op += take;
                    self.stage = Stage::Stored(remaining - take);

                    if take < remaining {
                        if op == output.len() {
                            break StepStatus::NeedsMoreOutput;
                        }
                        break StepStatus::NeedsMoreInput;
                    }
                }
                Stage::Payload { compressed, uncompressed } => {
                    let take = (compressed - self.payload.len()).min(input.len() - ip);
                    self.payload.extend_from_slice(&input[ip..ip + take]);
                    ip += take;

                    if self.payload.len() < compressed {
                        break StepStatus::NeedsMoreInput;
                    }
                    self.stage = self.expand(uncompressed).unwrap_or_else(Stage::Failed);
                }
                Stage::Drain => {
                    let pending = &self.block[self.block_pos..];
                    let take = pending.len().min(output.len() - op);
                    output[op..op + take].copy_from_slice(&pending[..take]);
                    op += take;
                    self.block_pos += take;

                    if self.block_pos < self.block.len() {
                        break StepStatus::NeedsMoreOutput;
                    }
                    self.block.clear();
                    self.block_pos = 0;
                    self.stage = Stage::Header;
                }
            }
        };

        self.started |= ip > 0;
        Step { written: op, consumed: ip, status }
    }

    fn has_buffered_output(&self) -> bool {
        self.stage == Stage::Drain && self.block_pos < self.block.len()
    }

    fn is_finished(&self) -> bool {
        self.stage == Stage::Finished
    }
}
