//! Hardware adapter — bridges GPIO pins to domain port traits.
//!
//! [`PinBank`] owns every digital pin the core touches and exposes them
//! through [`InputPort`], [`IndicatorSink`], and [`IlluminationPort`].
//! It is generic over the `embedded-hal` 1.0 digital traits: `main` hands
//! it ESP-IDF `PinDriver`s, tests hand it in-memory pins.

use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use crate::app::ports::{IlluminationPort, IndicatorSink, InputPort};
use crate::drivers::button::{ButtonId, BUTTON_COUNT};
use crate::error::HardwareError;
use crate::scheduler::{Indicator, INDICATOR_COUNT};

/// Concrete adapter that combines all GPIO behind port traits.
pub struct PinBank<I, O> {
    /// Indexed by [`ButtonId`].  Active-low.
    buttons: [I; BUTTON_COUNT],
    /// Indexed by [`Indicator`].  Active-high.
    indicators: [O; INDICATOR_COUNT],
    flash: O,
}

impl<I, O> PinBank<I, O> {
    pub fn new(buttons: [I; BUTTON_COUNT], indicators: [O; INDICATOR_COUNT], flash: O) -> Self {
        Self {
            buttons,
            indicators,
            flash,
        }
    }
}

// ── InputPort implementation ──────────────────────────────────

impl<I: InputPin, O> InputPort for PinBank<I, O> {
    fn is_asserted(&mut self, button: ButtonId) -> Result<bool, HardwareError> {
        self.buttons[button.index()]
            .is_low()
            .map_err(|_| HardwareError::GpioReadFailed)
    }
}

// ── Output ports ──────────────────────────────────────────────

fn drive<O: OutputPin>(pin: &mut O, on: bool) -> Result<(), O::Error> {
    if on { pin.set_high() } else { pin.set_low() }
}

impl<I, O: OutputPin> IndicatorSink for PinBank<I, O> {
    fn set_indicator(&mut self, indicator: Indicator, on: bool) -> Result<(), HardwareError> {
        drive(&mut self.indicators[indicator.index()], on).map_err(|_| {
            warn!("GPIO: failed to drive {:?} {}", indicator, if on { "high" } else { "low" });
            HardwareError::GpioWriteFailed
        })
    }
}

impl<I, O: OutputPin> IlluminationPort for PinBank<I, O> {
    fn set_flash(&mut self, on: bool) {
        if drive(&mut self.flash, on).is_err() {
            warn!("GPIO: failed to drive flash {}", if on { "high" } else { "low" });
        }
    }
}
