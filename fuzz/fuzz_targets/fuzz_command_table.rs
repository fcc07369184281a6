//! Fuzz target: `RemoteCommand::parse`
//!
//! Arbitrary message text must either map to exactly the table entry with
//! the same literal or to nothing.
//!
//! cargo fuzz run fuzz_command_table

#![no_main]

use aurix::app::commands::{COMMAND_TABLE, RemoteCommand};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    match RemoteCommand::parse(text) {
        Some(command) => assert_eq!(command.literal(), text),
        None => assert!(COMMAND_TABLE.iter().all(|(lit, _)| *lit != text)),
    }
});
