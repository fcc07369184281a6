//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DeviceService (domain)
//! ```
//!
//! Driven adapters (pins, camera, uplink socket, bot client, GPS, clock,
//! event sinks) implement these traits.  The
//! [`DeviceService`](super::service::DeviceService) consumes them via
//! generics, so the domain core never touches hardware directly.
//!
//! Only two ports may stall the tick: [`UplinkTransport::read_available`]
//! (bounded by its timeout) and [`TimePort::sleep`] (bounded by its
//! argument).  Everything else must return immediately.

use embassy_time::{Duration, Instant};

use crate::drivers::button::ButtonId;
use crate::error::{HardwareError, TransportError};
use crate::scheduler::Indicator;

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: buttons → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the alert buttons.
pub trait InputPort {
    /// `true` while the button is held.  Polarity is the adapter's concern.
    fn is_asserted(&mut self, button: ButtonId) -> Result<bool, HardwareError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator / illumination ports (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for LEDs and the buzzer.  Only the scheduler calls it.
pub trait IndicatorSink {
    /// Drive one output.  On error the pin level is unknown and the caller
    /// must write it again.
    fn set_indicator(&mut self, indicator: Indicator, on: bool) -> Result<(), HardwareError>;
}

/// Camera flash LED.
pub trait IlluminationPort {
    fn set_flash(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Camera port
// ───────────────────────────────────────────────────────────────

/// Frame acquisition.  Every frame handed out by [`capture_frame`] must be
/// given back through [`release_frame`].
///
/// [`capture_frame`]: CameraPort::capture_frame
/// [`release_frame`]: CameraPort::release_frame
pub trait CameraPort {
    /// Driver-owned frame buffer; derefs to the encoded JPEG bytes.
    type Frame: AsRef<[u8]>;

    /// Grab one frame.  `None` when the sensor produced nothing.
    fn capture_frame(&mut self) -> Option<Self::Frame>;

    /// Hand a frame buffer back to the driver.
    fn release_frame(&mut self, frame: Self::Frame);
}

// ───────────────────────────────────────────────────────────────
// Uplink transport (raw byte stream to the bot host)
// ───────────────────────────────────────────────────────────────

/// A single outbound stream connection (TLS on device, TCP on host).
pub trait UplinkTransport {
    /// Open a connection.  Any previous connection is dropped first.
    fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError>;

    /// Write one header line; the transport appends `\r\n`.
    fn send_header_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Write raw body bytes.
    fn send_bytes(&mut self, chunk: &[u8]) -> Result<(), TransportError>;

    /// Read whatever the peer sends until it closes the stream or `timeout`
    /// elapses, appending to `buf`.  Returns the number of bytes appended.
    fn read_available(
        &mut self,
        timeout: Duration,
        buf: &mut Vec<u8>,
    ) -> Result<usize, TransportError>;

    /// Close the connection.  Idempotent.
    fn close(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Messaging port (bot protocol)
// ───────────────────────────────────────────────────────────────

/// One inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub update_id: i64,
    pub chat_id: i64,
    pub text: String,
}

/// Text messaging through the bot channel.
pub trait MessagingPort {
    /// Send `text` to `chat_id`.  Fire-and-forget: callers never retry.
    fn send_message(&mut self, chat_id: i64, text: &str) -> Result<(), TransportError>;

    /// Updates with an id `>= since`, oldest first.
    fn get_updates(&mut self, since: i64) -> Result<Vec<Update>, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Location ports (GPS byte stream + sentence decoder)
// ───────────────────────────────────────────────────────────────

/// Raw byte stream from the GPS receiver.
pub trait LocationSource {
    fn has_pending_data(&mut self) -> bool;

    /// Next byte, or `None` if the buffer drained in the meantime.
    fn read_byte(&mut self) -> Option<u8>;
}

/// Incremental sentence decoder fed one byte at a time.
pub trait FixDecoder {
    /// Feed one byte.  Returns `true` when a complete sentence was accepted.
    fn encode(&mut self, byte: u8) -> bool;

    fn is_fix_valid(&self) -> bool;

    /// Decimal degrees, north positive.
    fn latitude(&self) -> f64;

    /// Decimal degrees, east positive.
    fn longitude(&self) -> f64;
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic clock.  The domain never reads the system clock directly.
pub trait TimePort {
    fn now(&self) -> Instant;

    /// Block for `duration`.  Used only by the bounded waits.
    fn sleep(&mut self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, test
/// recorder, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
