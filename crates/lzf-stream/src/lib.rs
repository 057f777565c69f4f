// SPDX-License-Identifier: ISC
//! Streaming decompression over a resumable block decode engine.
//!
//! # Overview
//!
//! This crate provides:
//!
//! - [`Reader`], a pull-based `std::io::Read` adapter that drives a
//!   [`DecodeEngine`] over any compressed source.
//! - [`LzfDecoder`], a resumable engine for framed LZF block streams with
//!   optional shared dictionaries.
//! - One-shot helpers (`decode_all`, `decode_all_with_dictionary`) for
//!   compressed data already in memory.
//!
//! The reader keeps a fixed read-ahead buffer, never blocks on the source when
//! decoded bytes are ready, and distinguishes a cleanly finished stream from a
//! truncated one or one followed by trailing bytes.
//!
//! # Examples
//!
//! Streaming with status:
//!
//! ```
//! use lzf_stream::{ReadStatus, Reader};
//!
//! let compressed = [b'Z', b'V', 0, 0, 4, b'l', b'z', b'f', b'!', 0];
//! let mut reader = Reader::new(&compressed[..]);
//! let mut out = [0u8; 16];
//!
//! let first = reader.read_with_status(&mut out);
//! assert_eq!(&out[..first.count], b"lzf!");
//!
//! let last = reader.read_with_status(&mut out);
//! assert_eq!(last.count, 0);
//! assert_eq!(last.status.unwrap(), ReadStatus::EndOfStream);
//! ```
//!
//! Decoding a buffer:
//!
//! ```
//! use lzf_stream::{Error, decode_all};
//!
//! assert!(decode_all(&[0]).unwrap().is_empty());
//! assert!(matches!(decode_all(&[0, 0]), Err(Error::ExcessiveInput)));
//! ```
//!
//! # Dictionaries
//!
//! A dictionary is borrowed for the reader's lifetime and attached to the
//! engine once, before any input is decoded. The borrow checker keeps the
//! bytes alive and unmoved until the engine is dropped.
//!
//! # Logging
//!
//! Diagnostics go through the [`log`] facade; no logger is installed.
//!
//! # Safety
//!
//! This crate forbids `unsafe` code.

#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod engine;
mod error;
mod lzf;
mod oneshot;
mod reader;

/// Decode engine contract.
pub use engine::{DecodeEngine, EngineError, Step, StepStatus};
/// Crate error and result types.
pub use error::{Error, Result};
/// Framed LZF engine.
pub use lzf::{DecodeFault, LzfDecoder};
/// One-shot decoding of in-memory streams.
pub use oneshot::{decode_all, decode_all_with_dictionary};
/// Streaming reader.
pub use reader::{DEFAULT_BUF_SIZE, ReadOutcome, ReadStatus, Reader};
