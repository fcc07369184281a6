//! Location resolver.
//!
//! Turns the GPS byte stream into a [`LocationResult`] for one outbound
//! message.  [`resolve`] is one of the two places the tick is allowed to
//! stall: it polls until a valid fix appears or the deadline passes.
//! Bytes are drained in bounded chunks so a receiver that streams
//! continuously cannot keep the loop from checking the deadline.

use embassy_time::Duration;

use crate::app::ports::{FixDecoder, LocationSource, TimePort};

/// Most bytes handed to the decoder per drain.
pub const DRAIN_CHUNK: usize = 256;

/// Pause between drains while waiting for a fix.
pub const POLL_STEP: Duration = Duration::from_millis(10);

/// Phrase sent instead of a link when there is no fix.
pub const UNAVAILABLE_TEXT: &str = "GPS unavailable.";

/// Outcome of one location request.  Never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationResult {
    Resolved { latitude: f64, longitude: f64 },
    Unavailable,
}

impl LocationResult {
    /// Map link for a resolved fix.
    pub fn maps_link(&self) -> Option<String> {
        match *self {
            Self::Resolved {
                latitude,
                longitude,
            } => Some(format!(
                "http://maps.google.com/maps?q={latitude:.6},{longitude:.6}"
            )),
            Self::Unavailable => None,
        }
    }

    /// Text of the outbound location message.
    pub fn message(&self) -> String {
        match self.maps_link() {
            Some(link) => format!("Location: {link}"),
            None => UNAVAILABLE_TEXT.to_owned(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// Feed at most [`DRAIN_CHUNK`] pending bytes to the decoder without
/// waiting.  Returns the number of bytes consumed.
pub fn drain(source: &mut impl LocationSource, decoder: &mut impl FixDecoder) -> usize {
    let mut consumed = 0;
    while consumed < DRAIN_CHUNK && source.has_pending_data() {
        let Some(byte) = source.read_byte() else {
            break;
        };
        decoder.encode(byte);
        consumed += 1;
    }
    consumed
}

/// Poll until the decoder reports a valid fix or `deadline` elapses.
pub fn resolve(
    source: &mut impl LocationSource,
    decoder: &mut impl FixDecoder,
    clock: &mut impl TimePort,
    deadline: Duration,
) -> LocationResult {
    let started = clock.now();
    loop {
        drain(source, decoder);
        if decoder.is_fix_valid() {
            return LocationResult::Resolved {
                latitude: decoder.latitude(),
                longitude: decoder.longitude(),
            };
        }
        if clock.now().saturating_duration_since(started) >= deadline {
            log::warn!("Location: no fix within {} ms", deadline.as_millis());
            return LocationResult::Unavailable;
        }
        clock.sleep(POLL_STEP);
    }
}
