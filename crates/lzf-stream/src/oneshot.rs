// SPDX-License-Identifier: ISC
use std::io;

use crate::{LzfDecoder, ReadOutcome, ReadStatus, Reader, Result};

/// Scratch size for the empty source behind one-shot decoding; any non-zero
/// size lets the source report end of data.
const SCRATCH_SIZE: usize = 4;

/// Output growth step while decoding a whole buffer.
const GROW_SIZE: usize = 32 * 1024;

/// Decodes a complete compressed stream held in memory.
///
/// # Example
///
/// ```
/// use lzf_stream::decode_all;
///
/// let compressed = [b'Z', b'V', 0, 0, 3, b'f', b'o', b'x', 0];
/// assert_eq!(decode_all(&compressed).unwrap(), b"fox");
/// ```
pub fn decode_all(compressed: &[u8]) -> Result<Vec<u8>> {
    decode(compressed, None)
}

/// Decodes a complete compressed stream that references `dictionary`.
///
/// Returns `Error::EmptyDictionary` for an empty dictionary.
pub fn decode_all_with_dictionary(compressed: &[u8], dictionary: &[u8]) -> Result<Vec<u8>> {
    decode(compressed, Some(dictionary))
}

fn decode<'a>(compressed: &'a [u8], dictionary: Option<&'a [u8]>) -> Result<Vec<u8>> {
    let mut reader =
        Reader::preloaded(io::empty(), LzfDecoder::new(), dictionary, SCRATCH_SIZE, compressed)?;

    let result = drain(&mut reader);
    let closed = reader.close();
    let output = result?;
    closed?;
    Ok(output)
}

fn drain(reader: &mut Reader<'_, io::Empty>) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    loop {
        if output.len() == output.capacity() {
            output.reserve(GROW_SIZE);
        }
        let start = output.len();
        output.resize(output.capacity(), 0);

        let ReadOutcome { count, status } = reader.read_with_status(&mut output[start..]);
        output.truncate(start + count);

        if status? == ReadStatus::EndOfStream {
            return Ok(output);
        }
    }
}
