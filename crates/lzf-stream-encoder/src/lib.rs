// SPDX-License-Identifier: BSD-2-Clause
//! Reference encoder for the framed LZF streams decoded by `lzf-stream`.
//!
//! Produces `ZV` blocks (stored or LZF-compressed), an optional dictionary
//! reference block, and the trailing end-of-stream byte.
//!
//! ```
//! use lzf_stream_encoder::{DEFAULT_BLOCK_SIZE, encode_blocks};
//!
//! let framed = encode_blocks(b"abc", DEFAULT_BLOCK_SIZE).unwrap();
//! assert_eq!(framed, [b'Z', b'V', 0, 0, 3, b'a', b'b', b'c', 0]);
//! ```
#![forbid(unsafe_code)]

mod raw;

use thiserror::Error;

/// Maximum literal run size in the LZF format.
pub const MAX_LITERAL_LEN: usize = 1 << 5;

/// Maximum backwards offset in the LZF format.
pub const MAX_OFFSET: usize = 1 << 13;

/// Maximum match length in the LZF format.
pub const MAX_MATCH_LEN: usize = (1 << 8) + (1 << 3);

/// Largest block size the framing can describe.
pub const DEFAULT_BLOCK_SIZE: usize = u16::MAX as usize;

const MAGIC_0: u8 = b'Z';
const MAGIC_1: u8 = b'V';
const END_OF_STREAM: u8 = 0;
const TYPE_UNCOMPRESSED: u8 = 0;
const TYPE_COMPRESSED: u8 = 1;
const TYPE_DICTIONARY: u8 = 2;

/// Encoder failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Block size or dictionary is unusable.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
    /// Compressed tokens did not fit the space that makes compression worthwhile.
    #[error("output buffer too small")]
    OutputTooSmall,
}

/// Encodes `input` as a framed stream of blocks of at most `block_size` bytes.
///
/// `block_size` must be in `1..=65535`.
pub fn encode_blocks(input: &[u8], block_size: usize) -> Result<Vec<u8>, EncodeError> {
    encode(input, &[], block_size)
}

/// Encodes `input` so that blocks may reference the tail of `dictionary`.
///
/// The stream starts with a dictionary reference block carrying the CRC-32 of
/// `dictionary`; decoding requires the same bytes.
pub fn encode_blocks_with_dictionary(
    input: &[u8],
    dictionary: &[u8],
    block_size: usize,
) -> Result<Vec<u8>, EncodeError> {
    if dictionary.is_empty() {
        return Err(EncodeError::InvalidParameter("dictionary must not be empty"));
    }
    encode(input, dictionary, block_size)
}

fn encode(input: &[u8], dictionary: &[u8], block_size: usize) -> Result<Vec<u8>, EncodeError> {
    if block_size == 0 || block_size > DEFAULT_BLOCK_SIZE {
        return Err(EncodeError::InvalidParameter("block size must be in 1..=65535"));
    }

    let mut output = Vec::with_capacity(input.len() + input.len() / block_size * 7 + 16);
    if !dictionary.is_empty() {
        output.extend_from_slice(&[MAGIC_0, MAGIC_1, TYPE_DICTIONARY]);
        output.extend_from_slice(&crc32fast::hash(dictionary).to_be_bytes());
    }

    let history = &dictionary[dictionary.len().saturating_sub(MAX_OFFSET)..];
    let mut window = Vec::with_capacity(history.len() + block_size);
    let mut compressed = vec![0u8; block_size];

    for block in input.chunks(block_size) {
        window.clear();
        window.extend_from_slice(history);
        window.extend_from_slice(block);

        // Compressing only pays off when it saves more than the larger header.
        let max_try = block.len().saturating_sub(4);
        let encoded_len = if max_try == 0 {
            Err(EncodeError::OutputTooSmall)
        } else {
            raw::compress(&window, history.len(), &mut compressed[..max_try])
        };

        // Both lengths fit in u16: blocks never exceed DEFAULT_BLOCK_SIZE.
        let us = (block.len() as u16).to_be_bytes();
        match encoded_len {
            Ok(cs) => {
                output.extend_from_slice(&[MAGIC_0, MAGIC_1, TYPE_COMPRESSED]);
                output.extend_from_slice(&(cs as u16).to_be_bytes());
                output.extend_from_slice(&us);
                output.extend_from_slice(&compressed[..cs]);
            }
            Err(EncodeError::OutputTooSmall) => {
                output.extend_from_slice(&[MAGIC_0, MAGIC_1, TYPE_UNCOMPRESSED]);
                output.extend_from_slice(&us);
                output.extend_from_slice(block);
            }
            Err(err) => return Err(err),
        }
    }

    output.push(END_OF_STREAM);
    Ok(output)
}
