//! Fuzz target: bot HTTP response framing and `getUpdates` decoding.
//!
//! cargo fuzz run fuzz_update_parser

#![no_main]

use aurix::adapters::bot::{parse_http, parse_updates};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(response) = parse_http(data) {
        assert!(response.body.len() <= data.len());
        let _ = parse_updates(&response.body);
    }
    let _ = parse_updates(data);
});
