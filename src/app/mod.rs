//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the Aurix device: alert
//! composition, photo upload framing, location lookup, and remote command
//! handling.  All interaction with hardware and the network happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod alerts;
pub mod commands;
pub mod events;
pub mod location;
pub mod photo;
pub mod ports;
pub mod remote;
pub mod service;
