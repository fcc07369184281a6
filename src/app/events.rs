//! Outbound application events.
//!
//! The [`DeviceService`](super::service::DeviceService) and the pipeline
//! stages emit these through the [`EventSink`](super::ports::EventSink)
//! port.  They are the operator log: every failure the tick swallows shows
//! up here exactly once.

use crate::app::alerts::AlertKind;
use crate::app::commands::RemoteCommand;
use crate::drivers::button::ButtonId;
use crate::error::{Error, TransportError};

/// Which outbound message a delivery failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Boot,
    Alert(AlertKind),
    Location,
    Reply(RemoteCommand),
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service finished booting and announced itself.
    Started,

    /// A debounced button edge was accepted.
    ButtonPressed(ButtonId),

    /// The text part of an alert went out.
    AlertSent(AlertKind),

    /// An outbound message could not be delivered.  Never retried.
    DeliveryFailed { what: Delivery, error: TransportError },

    /// A photo upload completed; carries the response size.
    PhotoUploaded { response_len: usize },

    /// Capture or upload failed; the alert text was unaffected.
    PhotoFailed(Error),

    /// A fix was obtained for an outbound location message.
    LocationResolved { latitude: f64, longitude: f64 },

    /// No fix within the deadline.
    LocationUnavailable,

    /// Fetching bot updates failed; the next poll retries from the same id.
    PollFailed(TransportError),

    /// An authorised command was recognised.
    CommandReceived(RemoteCommand),

    /// A message from a chat other than the recipient was dropped.
    UnauthorizedSender { chat_id: i64 },

    /// Authorised text that matched no command was dropped.
    UnrecognizedCommand,

    /// `/track` or `/stop` changed the tracking flag.
    TrackingChanged(bool),
}

impl AppEvent {
    /// Where a failure event sits in the [`Error`] taxonomy.  `None` for
    /// everything that is not a failure.
    pub fn error(&self) -> Option<Error> {
        match self {
            Self::DeliveryFailed { error, .. } | Self::PollFailed(error) => {
                Some(Error::Transport(*error))
            }
            Self::PhotoFailed(error) => Some(*error),
            Self::LocationUnavailable => Some(Error::Unresolvable),
            Self::UnauthorizedSender { .. } => Some(Error::UnauthorizedSender),
            Self::UnrecognizedCommand => Some(Error::UnrecognizedCommand),
            Self::Started
            | Self::ButtonPressed(_)
            | Self::AlertSent(_)
            | Self::PhotoUploaded { .. }
            | Self::LocationResolved { .. }
            | Self::CommandReceived(_)
            | Self::TrackingChanged(_) => None,
        }
    }
}
