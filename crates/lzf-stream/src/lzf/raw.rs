// SPDX-License-Identifier: ISC
//! Raw (unframed) LZF token decoding against an optional history prefix.
use super::DecodeFault;

/// Decompresses raw LZF `input` into `output`.
///
/// Back-references that reach before the start of `output` resolve into the
/// tail of `history`, which behaves as if it immediately preceded the block.
/// Pass an empty `history` for self-contained blocks.
///
/// Returns the number of bytes written to `output`, or:
/// - `DecodeFault::CorruptBlock` when the token stream is malformed or a
///   back-reference reaches past the available history.
/// - `DecodeFault::BlockSizeMismatch` when the block decodes to more than
///   `output.len()` bytes.
pub(crate) fn decompress(
    input: &[u8],
    output: &mut [u8],
    history: &[u8],
) -> Result<usize, DecodeFault> {
    let mut ip = 0usize;
    let mut op = 0usize;

    while ip < input.len() {
        let ctrl = input[ip];
        ip += 1;

        if ctrl < 32 {
            let len = usize::from(ctrl) + 1;
            if ip + len > input.len() {
                return Err(DecodeFault::CorruptBlock);
            }
            if op + len > output.len() {
                return Err(DecodeFault::BlockSizeMismatch);
            }
            output[op..op + len].copy_from_slice(&input[ip..ip + len]);
            ip += len;
            op += len;
            continue;
        }

        let mut len = usize::from(ctrl >> 5);
        let off_hi = usize::from(ctrl & 0x1f) << 8;
        if len == 7 {
            if ip >= input.len() {
                return Err(DecodeFault::CorruptBlock);
            }
            len += usize::from(input[ip]);
            ip += 1;
        }

        if ip >= input.len() {
            return Err(DecodeFault::CorruptBlock);
        }

        let distance = (off_hi | usize::from(input[ip])) + 1;
        ip += 1;

        let copy_len = len + 2;
        if op + copy_len > output.len() {
            return Err(DecodeFault::BlockSizeMismatch);
        }
        if distance > op + history.len() {
            return Err(DecodeFault::CorruptBlock);
        }

        let mut remaining = copy_len;
        if distance > op {
            // Match starts inside the history.
            let start = history.len() - (distance - op);
            let take = (distance - op).min(remaining);
            output[op..op + take].copy_from_slice(&history[start..start + take]);
            op += take;
            remaining -= take;
        }

        if remaining == 0 {
            continue;
        }

        let ref_pos = op - distance;
        if ref_pos + remaining <= op {
            output.copy_within(ref_pos..ref_pos + remaining, op);
        } else {
            let mut dst = op;
            let mut src = ref_pos;
            let end = dst + remaining;
            while dst < end {
                output[dst] = output[src];
                dst += 1;
                src += 1;
            }
        }
        op += remaining;
    }

    Ok(op)
}
