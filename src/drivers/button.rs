//! Debounced input router for the three alert buttons.
//!
//! ## Hardware
//!
//! Active-low momentary switches with internal pull-ups.  The pins are
//! sampled once per tick through an [`InputPort`]; no interrupts are used.
//!
//! ## Edge rule
//!
//! | Sample            | Since last edge of this button | Result         |
//! |-------------------|--------------------------------|----------------|
//! | released          | any                            | nothing        |
//! | held              | `< debounce`                   | nothing        |
//! | held              | `>= debounce` (or never)       | [`ButtonEdge`] |
//! | read error        | any                            | nothing        |
//!
//! A button held down therefore repeats once per debounce period.

use embassy_time::{Duration, Instant};
use heapless::Vec;

use crate::app::ports::InputPort;

/// Number of monitored buttons.
pub const BUTTON_COUNT: usize = 3;

/// Alert buttons, in polling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    Panic = 0,
    Defence = 1,
    Safe = 2,
}

impl ButtonId {
    pub const ALL: [ButtonId; BUTTON_COUNT] = [ButtonId::Panic, ButtonId::Defence, ButtonId::Safe];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One accepted press.  Consumed once by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEdge {
    pub source: ButtonId,
    pub timestamp: Instant,
}

pub struct InputRouter {
    debounce: Duration,
    last_emit: [Option<Instant>; BUTTON_COUNT],
}

impl InputRouter {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            last_emit: [None; BUTTON_COUNT],
        }
    }

    /// Sample every button once and return the accepted edges.
    pub fn poll(
        &mut self,
        now: Instant,
        inputs: &mut impl InputPort,
    ) -> Vec<ButtonEdge, BUTTON_COUNT> {
        let mut edges = Vec::new();
        for button in ButtonId::ALL {
            let asserted = match inputs.is_asserted(button) {
                Ok(level) => level,
                Err(e) => {
                    log::debug!("Input: {:?} read skipped ({})", button, e);
                    continue;
                }
            };
            if !asserted {
                continue;
            }

            let slot = &mut self.last_emit[button.index()];
            let settled = slot.is_none_or(|last| now.saturating_duration_since(last) >= self.debounce);
            if settled {
                *slot = Some(now);
                // Capacity equals the number of buttons, so this cannot fail.
                let _ = edges.push(ButtonEdge {
                    source: button,
                    timestamp: now,
                });
            }
        }
        edges
    }

    /// When `button` last produced an edge.
    pub fn last_emit(&self, button: ButtonId) -> Option<Instant> {
        self.last_emit[button.index()]
    }
}
