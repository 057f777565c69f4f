// SPDX-License-Identifier: BSD-2-Clause
// Derived from liblzf encoder logic by Stefan Traby and Marc Lehmann.
use crate::{EncodeError, MAX_LITERAL_LEN, MAX_MATCH_LEN, MAX_OFFSET};

const HASH_LOG: usize = 16;
const HASH_SIZE: usize = 1 << HASH_LOG;

/// Appends raw LZF tokens to a bounded output slice.
struct Tokens<'o> {
    out: &'o mut [u8],
    len: usize,
}

impl Tokens<'_> {
    fn reserve(&mut self, n: usize) -> Result<usize, EncodeError> {
        let at = self.len;
        if at + n > self.out.len() {
            return Err(EncodeError::OutputTooSmall);
        }
        self.len += n;
        Ok(at)
    }

    fn literals(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        for run in bytes.chunks(MAX_LITERAL_LEN) {
            let at = self.reserve(1 + run.len())?;
            self.out[at] = (run.len() - 1) as u8;
            self.out[at + 1..at + 1 + run.len()].copy_from_slice(run);
        }
        Ok(())
    }

    /// `off` is the distance minus one.
    fn backref(&mut self, off: usize, len: usize) -> Result<(), EncodeError> {
        debug_assert!(off < MAX_OFFSET);
        debug_assert!((3..=MAX_MATCH_LEN).contains(&len));

        let l = len - 2;
        let hi = (off >> 8) as u8;
        let lo = (off & 0xff) as u8;
        if l < 7 {
            let at = self.reserve(2)?;
            self.out[at] = ((l as u8) << 5) | hi;
            self.out[at + 1] = lo;
        } else {
            let at = self.reserve(3)?;
            self.out[at] = (7u8 << 5) | hi;
            self.out[at + 1] = (l - 7) as u8;
            self.out[at + 2] = lo;
        }
        Ok(())
    }
}

/// Single-slot hash chain over three-byte prefixes of `window`.
struct Matcher<'w> {
    window: &'w [u8],
    // Position + 1; zero is empty.
    table: Vec<u32>,
}

impl<'w> Matcher<'w> {
    fn new(window: &'w [u8]) -> Self {
        Self { window, table: vec![0; HASH_SIZE] }
    }

    fn hash(&self, pos: usize) -> usize {
        let w = self.window;
        let v = (u32::from(w[pos]) << 16) | (u32::from(w[pos + 1]) << 8) | u32::from(w[pos + 2]);
        ((v.wrapping_mul(0x1e35_a7bd) >> (32 - HASH_LOG - 8)) as usize) & (HASH_SIZE - 1)
    }

    fn insert(&mut self, pos: usize) {
        let h = self.hash(pos);
        self.table[h] = (pos + 1) as u32;
    }

    fn insert_range(&mut self, from: usize, to: usize) {
        let end = to.min(self.window.len().saturating_sub(2));
        for pos in from..end {
            self.insert(pos);
        }
    }

    /// Records `pos` and returns `(offset, length)` of a usable earlier match.
    fn find(&mut self, pos: usize) -> Option<(usize, usize)> {
        let h = self.hash(pos);
        let prev = self.table[h] as usize;
        self.table[h] = (pos + 1) as u32;

        let candidate = prev.checked_sub(1)?;
        let off = pos.checked_sub(candidate + 1)?;
        let w = self.window;
        if off >= MAX_OFFSET || w[candidate..candidate + 3] != w[pos..pos + 3] {
            return None;
        }

        let limit = (w.len() - pos).min(MAX_MATCH_LEN);
        let len = 3 + w[candidate + 3..]
            .iter()
            .zip(&w[pos + 3..pos + limit])
            .take_while(|(a, b)| a == b)
            .count();
        Some((off, len))
    }
}

/// Compresses `window[start..]` into `output` as raw LZF tokens.
///
/// `window[..start]` is history the decoder will see in front of the block:
/// matches may point into it but its bytes are not emitted.
///
/// Returns `EncodeError::OutputTooSmall` if `output` cannot hold the tokens.
pub(crate) fn compress(window: &[u8], start: usize, output: &mut [u8]) -> Result<usize, EncodeError> {
    let mut tokens = Tokens { out: output, len: 0 };
    let mut matcher = Matcher::new(window);
    matcher.insert_range(0, start);

    let mut anchor = start;
    let mut pos = start;
    while pos + 2 < window.len() {
        let Some((off, len)) = matcher.find(pos) else {
            pos += 1;
            continue;
        };

        tokens.literals(&window[anchor..pos])?;
        tokens.backref(off, len)?;
        matcher.insert_range(pos + 1, pos + len);
        pos += len;
        anchor = pos;
    }

    tokens.literals(&window[anchor..])?;
    Ok(tokens.len)
}
