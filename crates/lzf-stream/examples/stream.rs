// SPDX-License-Identifier: ISC
use lzf_stream::{ReadStatus, Reader};
use lzf_stream_encoder::encode_blocks_with_dictionary;

fn main() {
    let dictionary = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let input = b"GET /about.html HTTP/1.1\r\nHost: example.com\r\n\r\n";

    let encoded = encode_blocks_with_dictionary(input, dictionary, 4096).expect("encode");

    let mut reader = Reader::with_dictionary(encoded.as_slice(), dictionary).expect("reader");
    let mut decoded = Vec::new();
    let mut chunk = [0u8; 16];
    loop {
        let outcome = reader.read_with_status(&mut chunk);
        decoded.extend_from_slice(&chunk[..outcome.count]);
        match outcome.status.expect("read") {
            ReadStatus::More => {}
            ReadStatus::EndOfStream => break,
        }
    }
    reader.close().expect("close");

    assert_eq!(decoded, input);
    println!("encoded={} decoded={}", encoded.len(), decoded.len());
}
