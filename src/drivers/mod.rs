//! Input debouncing and board-level drivers.

pub mod button;
pub mod watchdog;
