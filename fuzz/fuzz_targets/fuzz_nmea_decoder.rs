//! Fuzz target: `NmeaDecoder::encode`
//!
//! Streams arbitrary bytes into the decoder.  It must never panic, and a
//! reported fix must be a real coordinate.
//!
//! cargo fuzz run fuzz_nmea_decoder

#![no_main]

use aurix::adapters::gps::NmeaDecoder;
use aurix::app::ports::FixDecoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = NmeaDecoder::new();
    for &byte in data {
        let _ = decoder.encode(byte);
    }
    if decoder.is_fix_valid() {
        assert!(decoder.latitude().is_finite());
        assert!(decoder.longitude().is_finite());
    }
});
