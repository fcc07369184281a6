//! Unified error types for the Aurix firmware.
//!
//! Nothing in the tick loop is fatal: every fallible step returns one of
//! these, the caller reports it through the event sink, and the rest of the
//! tick carries on.  All variants are `Copy` so they can be handed to the
//! sink without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.  Failure
/// events map onto it through
/// [`AppEvent::error`](crate::app::events::AppEvent::error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An input pin or the camera could not be read.
    HardwareRead(HardwareError),
    /// A network connect, send, or receive failed.
    Transport(TransportError),
    /// No location fix was obtained before the deadline.
    Unresolvable,
    /// An inbound message came from a chat other than the recipient.
    UnauthorizedSender,
    /// An inbound message did not match any command literal.
    UnrecognizedCommand,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareRead(e) => write!(f, "hardware: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Unresolvable => write!(f, "location unresolvable"),
            Self::UnauthorizedSender => write!(f, "unauthorized sender"),
            Self::UnrecognizedCommand => write!(f, "unrecognized command"),
        }
    }
}

// ---------------------------------------------------------------------------
// Hardware errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareError {
    /// GPIO level read returned an error.
    GpioReadFailed,
    /// An output pin rejected a level change.
    GpioWriteFailed,
    /// The camera driver returned no frame buffer.
    CaptureFailed,
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::CaptureFailed => write!(f, "camera capture failed"),
        }
    }
}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Self::HardwareRead(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// TCP/TLS connection to the bot host could not be established.
    ConnectFailed,
    /// Operation requires an open connection but none is present.
    NotConnected,
    /// Writing request bytes failed part-way.
    WriteFailed,
    /// Reading the response failed.
    ReadFailed,
    /// The server answered with a non-2xx status code.
    HttpStatus(u16),
    /// The response body could not be decoded.
    Malformed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::NotConnected => write!(f, "not connected"),
            Self::WriteFailed => write!(f, "write failed"),
            Self::ReadFailed => write!(f, "read failed"),
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Self::Malformed => write!(f, "malformed response"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

impl core::error::Error for Error {}
impl core::error::Error for HardwareError {}
impl core::error::Error for TransportError {}
