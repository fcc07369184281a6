//! Alert dispatcher.
//!
//! Turns button edges and remote commands into outbound messages.  Every
//! send is fire-and-forget: a failure is reported through the event sink
//! and the dispatcher moves straight on to the next step, so a dead photo
//! upload never holds back the text alert or the location that follows.
//!
//! | Kind    | Text | Photo | Location |
//! |---------|------|-------|----------|
//! | Panic   | yes  | no    | yes      |
//! | Defence | yes  | yes   | yes      |
//! | Safe    | yes  | yes   | yes      |

use embassy_time::{Duration, Instant};
use log::{info, warn};

use crate::app::commands::{help_text, RemoteCommand};
use crate::app::events::{AppEvent, Delivery};
use crate::app::location::LocationResult;
use crate::app::photo::UploadResult;
use crate::app::ports::EventSink;
use crate::config::DeviceConfig;
use crate::drivers::button::ButtonId;
use crate::error::{Error, HardwareError, TransportError};

/// Sent once after boot.
pub const BOOT_TEXT: &str = "Device online (Aurix). Use /start to see commands.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    Panic,
    Defence,
    Safe,
}

impl AlertKind {
    pub fn requires_photo(self) -> bool {
        !matches!(self, Self::Panic)
    }

    /// Fill in the template for this kind.
    pub fn compose(self, config: &DeviceConfig) -> String {
        match self {
            Self::Panic => format!(
                "🚨 PANIC!\nUser: {}\nMobile: {}",
                config.owner_name, config.owner_mobile
            ),
            Self::Defence => format!("⚠️ Defence mode activated\nUser: {}", config.owner_name),
            Self::Safe => format!("✅ User reports SAFE\nUser: {}", config.owner_name),
        }
    }
}

impl From<ButtonId> for AlertKind {
    fn from(button: ButtonId) -> Self {
        match button {
            ButtonId::Panic => Self::Panic,
            ButtonId::Defence => Self::Defence,
            ButtonId::Safe => Self::Safe,
        }
    }
}

/// The outbound side of the device as the dispatcher sees it.
///
/// Bundles the messaging, photo, and location collaborators so the
/// dispatcher can be driven by one object in production and a recorder in
/// tests.
pub trait AlertIo {
    fn send_message(&mut self, chat_id: i64, text: &str) -> Result<(), TransportError>;

    /// Flash, capture, and upload one photo.  May stall (bounded).
    fn capture_and_send(&mut self, config: &DeviceConfig, chat_id: i64) -> UploadResult;

    /// Wait up to `deadline` for a fix.  May stall (bounded).
    fn resolve_location(&mut self, deadline: Duration) -> LocationResult;

    fn now(&self) -> Instant;
}

/// Owns nothing but the tracking flag.
pub struct AlertDispatcher {
    tracking: bool,
    tracking_since: Option<Instant>,
}

impl Default for AlertDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertDispatcher {
    pub fn new() -> Self {
        Self {
            tracking: false,
            tracking_since: None,
        }
    }

    /// Text, then the photo when the kind wants one, then the location.
    pub fn dispatch(
        &mut self,
        kind: AlertKind,
        io: &mut impl AlertIo,
        config: &DeviceConfig,
        sink: &mut impl EventSink,
    ) {
        info!("Alert: dispatching {:?}", kind);
        let text = kind.compose(config);
        if Self::deliver(io, config, &text, Delivery::Alert(kind), sink) {
            sink.emit(&AppEvent::AlertSent(kind));
        }
        if kind.requires_photo() {
            Self::send_photo(io, config, sink);
        }
        Self::send_location(io, config, sink);
    }

    /// Carry out one authorised remote command.
    pub fn execute(
        &mut self,
        command: RemoteCommand,
        io: &mut impl AlertIo,
        config: &DeviceConfig,
        sink: &mut impl EventSink,
    ) {
        let reply = Delivery::Reply(command);
        match command {
            RemoteCommand::Help => {
                Self::deliver(io, config, &help_text(), reply, sink);
            }
            RemoteCommand::ShowInfo => {
                let details = format!(
                    "Name: {}\nMobile: {}",
                    config.owner_name, config.owner_mobile
                );
                Self::deliver(io, config, &details, reply, sink);
            }
            RemoteCommand::CapturePhoto => {
                Self::deliver(io, config, "Capturing photo...", reply, sink);
                Self::send_photo(io, config, sink);
            }
            RemoteCommand::SendLocation => Self::send_location(io, config, sink),
            RemoteCommand::StartTracking => {
                self.tracking = true;
                self.tracking_since = Some(io.now());
                sink.emit(&AppEvent::TrackingChanged(true));
                Self::deliver(
                    io,
                    config,
                    "Tracking enabled (manual). Use /stop to disable.",
                    reply,
                    sink,
                );
            }
            RemoteCommand::StopTracking => {
                self.tracking = false;
                self.tracking_since = None;
                sink.emit(&AppEvent::TrackingChanged(false));
                Self::deliver(io, config, "Tracking stopped.", reply, sink);
            }
        }
    }

    /// Tell the recipient the device is up.
    pub fn announce_boot(
        &mut self,
        io: &mut impl AlertIo,
        config: &DeviceConfig,
        sink: &mut impl EventSink,
    ) {
        Self::deliver(io, config, BOOT_TEXT, Delivery::Boot, sink);
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// When `/track` last enabled tracking.
    pub fn tracking_since(&self) -> Option<Instant> {
        self.tracking_since
    }

    // ── Steps ─────────────────────────────────────────────────

    fn deliver(
        io: &mut impl AlertIo,
        config: &DeviceConfig,
        text: &str,
        what: Delivery,
        sink: &mut impl EventSink,
    ) -> bool {
        match io.send_message(config.recipient_chat_id, text) {
            Ok(()) => true,
            Err(error) => {
                warn!("Alert: {:?} not delivered ({})", what, error);
                sink.emit(&AppEvent::DeliveryFailed { what, error });
                false
            }
        }
    }

    fn send_photo(io: &mut impl AlertIo, config: &DeviceConfig, sink: &mut impl EventSink) {
        match io.capture_and_send(config, config.recipient_chat_id) {
            UploadResult::Ok(response) => sink.emit(&AppEvent::PhotoUploaded {
                response_len: response.len(),
            }),
            UploadResult::CaptureFailed => sink.emit(&AppEvent::PhotoFailed(
                Error::HardwareRead(HardwareError::CaptureFailed),
            )),
            UploadResult::TransportFailed(e) => {
                sink.emit(&AppEvent::PhotoFailed(Error::Transport(e)));
            }
        }
    }

    fn send_location(io: &mut impl AlertIo, config: &DeviceConfig, sink: &mut impl EventSink) {
        let location = io.resolve_location(config.location_deadline());
        match location {
            LocationResult::Resolved {
                latitude,
                longitude,
            } => sink.emit(&AppEvent::LocationResolved {
                latitude,
                longitude,
            }),
            LocationResult::Unavailable => sink.emit(&AppEvent::LocationUnavailable),
        }
        Self::deliver(io, config, &location.message(), Delivery::Location, sink);
    }
}
