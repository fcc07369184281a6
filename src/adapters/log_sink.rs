//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Failures are logged at `warn` with their [`Error`] classification.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::error::Error;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink {
    failures: u32,
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventSink {
    pub fn new() -> Self {
        Self { failures: 0 }
    }

    /// Failure events seen since boot.
    pub fn failures(&self) -> u32 {
        self.failures
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        if let Some(error) = event.error() {
            self.failures = self.failures.saturating_add(1);
            log_failure(event, error);
            return;
        }
        match event {
            AppEvent::Started => info!("START | device online"),
            AppEvent::ButtonPressed(button) => info!("INPUT | {:?} pressed", button),
            AppEvent::AlertSent(kind) => info!("ALERT | {:?} sent", kind),
            AppEvent::PhotoUploaded { response_len } => {
                info!("PHOTO | uploaded ({} byte response)", response_len);
            }
            AppEvent::LocationResolved {
                latitude,
                longitude,
            } => info!("GPS   | fix {:.6},{:.6}", latitude, longitude),
            AppEvent::CommandReceived(cmd) => info!("CMD   | {}", cmd.literal()),
            AppEvent::TrackingChanged(on) => {
                info!("TRACK | {}", if *on { "enabled" } else { "disabled" });
            }
            // Failures are handled above.
            AppEvent::DeliveryFailed { .. }
            | AppEvent::PhotoFailed(_)
            | AppEvent::LocationUnavailable
            | AppEvent::PollFailed(_)
            | AppEvent::UnauthorizedSender { .. }
            | AppEvent::UnrecognizedCommand => {}
        }
    }
}

fn log_failure(event: &AppEvent, error: Error) {
    match event {
        AppEvent::DeliveryFailed { what, .. } => warn!("ALERT | {:?} not delivered: {}", what, error),
        AppEvent::PhotoFailed(_) => warn!("PHOTO | {}", error),
        AppEvent::UnauthorizedSender { chat_id } => warn!("CMD   | {} (chat {})", error, chat_id),
        AppEvent::PollFailed(_) | AppEvent::UnrecognizedCommand => warn!("CMD   | {}", error),
        _ => warn!("GPS   | {}", error),
    }
}
