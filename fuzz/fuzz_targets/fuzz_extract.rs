#![no_main]

use libfuzzer_sys::fuzz_target;
use png_meta_io::{extract_from_stream, walk, ExtractOptions};
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Any input must produce a mapping or an error, never a panic
    let _ = extract_from_stream(Cursor::new(data), &ExtractOptions::new());
    let _ = extract_from_stream(Cursor::new(data), &ExtractOptions::new().skip_exif());

    if let Ok(structure) = walk(Cursor::new(data)) {
        // Recorded chunk ranges must stay inside the input
        for chunk in &structure.chunks {
            assert!(chunk.range.end_offset() <= data.len() as u64);
        }
    }
});
