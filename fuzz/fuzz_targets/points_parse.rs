//! Fuzz target for the ROI `points` cell parser.

#![no_main]

use labelsync::table::parse_points;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_points(2, text);
    }
});
