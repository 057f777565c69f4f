// SPDX-License-Identifier: ISC
use std::io::{self, Read};

use lzf_stream::{Error, ReadStatus, Reader};
use lzf_stream_encoder::{DEFAULT_BLOCK_SIZE, encode_blocks, encode_blocks_with_dictionary};

fn pattern_data(size: usize) -> Vec<u8> {
    let mut out = vec![0u8; size];
    for (i, b) in out.iter_mut().enumerate() {
        *b = ((i * 17) ^ (i >> 3) ^ 0x5a) as u8;
    }
    out
}

/// Hands out at most `chunk` bytes per read and counts the reads.
struct ChunkedSource {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
    reads: usize,
}

impl ChunkedSource {
    fn new(data: Vec<u8>, chunk: usize) -> Self {
        Self { data, pos: 0, chunk, reads: 0 }
    }
}

impl Read for ChunkedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

struct FailingSource;

impl Read for FailingSource {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"))
    }
}

fn read_all_with_status<R: Read>(reader: &mut Reader<'_, R>, out_len: usize) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buf = vec![0u8; out_len];
    loop {
        let outcome = reader.read_with_status(&mut buf);
        out.extend_from_slice(&buf[..outcome.count]);
        match outcome.status.expect("read") {
            ReadStatus::More => {}
            ReadStatus::EndOfStream => return out,
        }
    }
}

#[test]
fn read_to_end_matches_input() {
    let input = pattern_data(180_000);
    let stream = encode_blocks(&input, DEFAULT_BLOCK_SIZE).expect("encode");

    let mut reader = Reader::new(stream.as_slice());
    let mut output = Vec::new();
    reader.read_to_end(&mut output).expect("read_to_end");

    assert_eq!(output, input);
    assert!(reader.is_finished());
    reader.close().expect("close");
}

#[test]
fn one_byte_source_and_output() {
    let input = pattern_data(5_000);
    let stream = encode_blocks(&input, 1024).expect("encode");

    let mut reader = Reader::new(ChunkedSource::new(stream, 1));
    assert_eq!(read_all_with_status(&mut reader, 1), input);
}

#[test]
fn tiny_read_ahead_buffer() {
    let input = pattern_data(20_000);
    let stream = encode_blocks(&input, 4096).expect("encode");

    let mut reader = Reader::with_capacity(3, ChunkedSource::new(stream, 7)).expect("reader");
    assert_eq!(read_all_with_status(&mut reader, 333), input);
}

#[test]
fn end_of_stream_follows_last_byte() {
    let stream = encode_blocks(b"hi", DEFAULT_BLOCK_SIZE).expect("encode");
    let mut reader = Reader::new(stream.as_slice());
    let mut buf = [0u8; 16];

    let first = reader.read_with_status(&mut buf);
    assert_eq!(&buf[..first.count], b"hi");
    assert!(!first.is_end_of_stream());
    first.status.expect("first read");

    let last = reader.read_with_status(&mut buf);
    assert_eq!(last.count, 0);
    assert!(last.is_end_of_stream());

    let again = reader.read_with_status(&mut buf);
    assert_eq!(again.count, 0);
    assert!(again.is_end_of_stream());
}

#[test]
fn decoded_bytes_return_before_source_is_read_again() {
    // One stored block in the first chunk, the terminator in the next.
    let mut stream = vec![b'Z', b'V', 0, 0, 5];
    stream.extend_from_slice(b"hello");
    stream.push(0);

    let mut reader = Reader::new(ChunkedSource::new(stream, 10));
    let mut buf = [0u8; 64];

    let outcome = reader.read_with_status(&mut buf);
    assert_eq!(&buf[..outcome.count], b"hello");
    assert_eq!(outcome.status.expect("read"), ReadStatus::More);
    assert_eq!(reader.inner().reads, 1);
}

#[test]
fn buffered_output_is_drained_without_reading_source() {
    let input = vec![7u8; 2048];
    let stream = encode_blocks(&input, DEFAULT_BLOCK_SIZE).expect("encode");
    let len = stream.len();

    let mut reader = Reader::new(ChunkedSource::new(stream, len));
    let mut buf = [0u8; 16];
    let mut total = 0;
    while total < input.len() {
        let outcome = reader.read_with_status(&mut buf);
        outcome.status.expect("read");
        total += outcome.count;
    }
    assert_eq!(reader.inner().reads, 1);
}

#[test]
fn zero_length_read_reports_more() {
    let stream = encode_blocks(b"abc", DEFAULT_BLOCK_SIZE).expect("encode");
    let mut reader = Reader::new(stream.as_slice());

    let outcome = reader.read_with_status(&mut []);
    assert_eq!(outcome.count, 0);
    assert_eq!(outcome.status.expect("read"), ReadStatus::More);

    let mut out = Vec::new();
    reader.read_to_end(&mut out).expect("read_to_end");
    assert_eq!(out, b"abc");
}

#[test]
fn empty_source_is_unexpected_eof() {
    let mut reader = Reader::new(io::empty());
    let mut buf = [0u8; 8];

    let outcome = reader.read_with_status(&mut buf);
    assert_eq!(outcome.count, 0);
    assert!(matches!(outcome.status, Err(Error::UnexpectedEof)));

    let err = reader.read(&mut buf).expect_err("eof");
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
}

#[test]
fn excessive_input_in_same_chunk_keeps_output() {
    let mut stream = encode_blocks(b"payload", DEFAULT_BLOCK_SIZE).expect("encode");
    stream.push(0x42);

    let mut reader = Reader::new(stream.as_slice());
    let mut buf = [0u8; 64];
    let outcome = reader.read_with_status(&mut buf);

    assert_eq!(&buf[..outcome.count], b"payload");
    assert!(matches!(outcome.status, Err(Error::ExcessiveInput)));
}

#[test]
fn excessive_input_in_later_chunk() {
    let mut stream = encode_blocks(b"payload", DEFAULT_BLOCK_SIZE).expect("encode");
    let len = stream.len();
    stream.extend_from_slice(b"more");

    let mut reader = Reader::new(ChunkedSource::new(stream, len));
    let mut buf = [0u8; 64];

    let first = reader.read_with_status(&mut buf);
    assert_eq!(&buf[..first.count], b"payload");
    first.status.expect("first read");

    let second = reader.read_with_status(&mut buf);
    assert_eq!(second.count, 0);
    assert!(matches!(second.status, Err(Error::ExcessiveInput)));
}

#[test]
fn source_error_is_passed_through() {
    let mut reader = Reader::new(FailingSource);
    let mut buf = [0u8; 8];

    let outcome = reader.read_with_status(&mut buf);
    assert_eq!(outcome.count, 0);
    match outcome.status {
        Err(Error::Source(err)) => assert_eq!(err.kind(), io::ErrorKind::ConnectionReset),
        other => panic!("expected source error, got {other:?}"),
    }

    let err = reader.read(&mut buf).expect_err("source error");
    assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    assert_eq!(err.to_string(), "peer went away");
}

#[test]
fn engine_error_after_partial_output() {
    let mut stream = vec![b'Z', b'V', 0, 0, 3];
    stream.extend_from_slice(b"abc");
    stream.extend_from_slice(b"XYZ");

    let mut reader = Reader::new(stream.as_slice());
    let mut buf = [0u8; 16];
    let outcome = reader.read_with_status(&mut buf);

    assert_eq!(&buf[..outcome.count], b"abc");
    let err = outcome.status.expect_err("bad header");
    assert_eq!(err.engine_error().map(|e| e.code()), Some(-1));
}

#[test]
fn io_read_defers_error_until_next_call() {
    let mut stream = vec![b'Z', b'V', 0, 0, 3];
    stream.extend_from_slice(b"abc");
    stream.extend_from_slice(b"XYZ");

    let mut reader = Reader::new(stream.as_slice());
    let mut buf = [0u8; 16];

    assert_eq!(reader.read(&mut buf).expect("partial"), 3);
    assert_eq!(&buf[..3], b"abc");

    let err = reader.read(&mut buf).expect_err("deferred");
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}

#[test]
fn io_read_returns_zero_only_at_end() {
    let stream = encode_blocks(b"xy", DEFAULT_BLOCK_SIZE).expect("encode");
    let mut reader = Reader::new(ChunkedSource::new(stream, 1));
    let mut buf = [0u8; 4];
    let mut out = Vec::new();

    loop {
        let n = reader.read(&mut buf).expect("read");
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }

    assert_eq!(out, b"xy");
    assert!(reader.is_finished());
}

#[test]
fn double_close_is_error() {
    let mut reader = Reader::new(&[0u8][..]);
    reader.close().expect("first close");
    assert!(reader.is_closed());
    assert!(matches!(reader.close(), Err(Error::Closed)));
}

#[test]
fn read_after_close_is_error() {
    let stream = encode_blocks(b"closed", DEFAULT_BLOCK_SIZE).expect("encode");
    let mut reader = Reader::new(stream.as_slice());
    reader.close().expect("close");

    let mut buf = [0u8; 8];
    let outcome = reader.read_with_status(&mut buf);
    assert_eq!(outcome.count, 0);
    assert!(matches!(outcome.status, Err(Error::Closed)));

    let err = reader.read(&mut buf).expect_err("closed");
    assert_eq!(err.kind(), io::ErrorKind::Other);
}

#[test]
fn close_discards_buffered_output() {
    let input = vec![1u8; 4096];
    let stream = encode_blocks(&input, DEFAULT_BLOCK_SIZE).expect("encode");

    let mut reader = Reader::new(stream.as_slice());
    let mut buf = [0u8; 1];
    reader.read_with_status(&mut buf).status.expect("read");

    reader.close().expect("close");
    assert!(!reader.is_finished());
}

#[test]
fn close_releases_dictionary() {
    let dictionary = pattern_data(1024);
    let stream =
        encode_blocks_with_dictionary(&dictionary[..300], &dictionary, DEFAULT_BLOCK_SIZE)
            .expect("encode");

    let mut reader = Reader::with_dictionary(stream.as_slice(), &dictionary).expect("reader");
    assert_eq!(reader.dictionary(), Some(dictionary.as_slice()));

    let mut out = Vec::new();
    reader.read_to_end(&mut out).expect("read_to_end");
    assert_eq!(out, &dictionary[..300]);

    reader.close().expect("close");
    assert_eq!(reader.dictionary(), None);
}

#[test]
fn zero_capacity_is_rejected() {
    let result = Reader::with_capacity(0, io::empty());
    assert!(matches!(result, Err(Error::InvalidParameter(_))));
}

#[test]
fn empty_dictionary_is_rejected() {
    let result = Reader::with_dictionary(io::empty(), &[]);
    assert!(matches!(result, Err(Error::EmptyDictionary)));
}

#[test]
fn source_accessors() {
    let stream = encode_blocks(b"abc", DEFAULT_BLOCK_SIZE).expect("encode");
    let mut reader = Reader::new(ChunkedSource::new(stream, 2));

    assert_eq!(reader.inner().reads, 0);
    reader.inner_mut().chunk = 64;

    let mut out = Vec::new();
    reader.read_to_end(&mut out).expect("read_to_end");
    assert_eq!(out, b"abc");

    let source = reader.into_inner();
    assert_eq!(source.pos, source.data.len());
}
