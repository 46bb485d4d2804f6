//! Fuzz target for the lenient date cleaner.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sharketl::transform::dates::clean_date;
use sharketl::transform::UNKNOWN_DATE;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let cleaned = clean_date(Some(text));
        assert_eq!(cleaned.is_unknown(), cleaned.to_string() == UNKNOWN_DATE);
    }
});
