#![no_main]

use libfuzzer_sys::fuzz_target;
use png_meta_io::exif::{default_decoder, ExifDecoder};

fuzz_target!(|data: &[u8]| {
    // Feed raw bytes straight to the EXIF decoder, with and without a filter
    let decoder = default_decoder();
    let _ = decoder.decode(data, None);
    let _ = decoder.decode(data, Some("IFD0,ANY_TAG"));
});
