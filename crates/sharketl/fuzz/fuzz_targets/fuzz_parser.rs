//! Fuzz target for the delimited-text parser.
//!
//! Arbitrary bytes must yield a table or an error, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sharketl::input::Parser;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    let parser = Parser::new();
    let _ = parser.parse_bytes(data, b',');
    let _ = parser.parse_bytes(data, b'\t');
});
