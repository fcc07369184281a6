//! Timed-event scheduler for the LEDs and the buzzer.
//!
//! Every indicator is driven by a small timer record owned by one
//! [`Scheduler`].  Nothing here blocks: the service calls
//! [`Scheduler::trigger`] for each accepted button edge and
//! [`Scheduler::advance`] once per tick, and every state change is derived
//! from comparing the tick's `now` against stored start instants.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Trigger Sources                          │
//! │                                                              │
//! │  ┌───────────┐        ┌───────────┐        ┌───────────┐     │
//! │  │   Panic   │        │  Defence  │        │   Safe    │     │
//! │  └─────┬─────┘        └─────┬─────┘        └─────┬─────┘     │
//! │        │                    │                    │           │
//! │        ▼                    ▼                    ▼           │
//! │  chirp + LED A        chirp + LED B       wait W, then       │
//! │  + LED D blink run                        LED C + buzzer     │
//! │        │                    │                    │           │
//! │        └────────────────────┼────────────────────┘           │
//! │                             ▼                                │
//! │                     IndicatorSink (level changes only)       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Period boundaries advance by exactly one period (`start += interval`)
//! rather than snapping to `now`, so windows stay exact however coarse the
//! ticks are, and a late tick completes every boundary it skipped.
//!
//! Re-triggering a timer that is still running is a no-op for every timer
//! kind.  A completed timer may always be re-armed.

use embassy_time::{Duration, Instant};
use log::{debug, info};

use crate::app::ports::IndicatorSink;
use crate::config::IndicatorTimings;
use crate::drivers::button::ButtonId;

// ═══════════════════════════════════════════════════════════════
//  Indicator identity
// ═══════════════════════════════════════════════════════════════

/// Number of scheduler-driven outputs.
pub const INDICATOR_COUNT: usize = 5;

/// Every output the scheduler owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    LedA = 0,
    LedB = 1,
    LedC = 2,
    LedD = 3,
    Buzzer = 4,
}

impl Indicator {
    pub const ALL: [Indicator; INDICATOR_COUNT] = [
        Indicator::LedA,
        Indicator::LedB,
        Indicator::LedC,
        Indicator::LedD,
        Indicator::Buzzer,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

const fn epoch() -> Instant {
    Instant::from_ticks(0)
}

// ═══════════════════════════════════════════════════════════════
//  Timer records
// ═══════════════════════════════════════════════════════════════

/// Single-shot timer: active for exactly `[start, start + duration)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    active: bool,
    start: Instant,
    duration: Duration,
}

impl TimedEvent {
    pub const fn idle() -> Self {
        Self {
            active: false,
            start: epoch(),
            duration: Duration::from_ticks(0),
        }
    }

    /// Arm at `at`.  Returns `false` (and changes nothing) while active.
    pub fn arm(&mut self, at: Instant, duration: Duration) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.start = at;
        self.duration = duration;
        true
    }

    /// Deactivate once `now - start >= duration`.  Returns `true` on the
    /// call that expired it.
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.active && now.saturating_duration_since(self.start) >= self.duration {
            self.active = false;
            return true;
        }
        false
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start(&self) -> Instant {
        self.start
    }
}

/// Repeating blink: toggles every `interval`, `2 × blinks` toggles in total,
/// starting and ending LOW.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkRun {
    active: bool,
    level: bool,
    toggles: u16,
    target: u16,
    start: Instant,
    interval: Duration,
}

impl BlinkRun {
    pub const fn idle() -> Self {
        Self {
            active: false,
            level: false,
            toggles: 0,
            target: 0,
            start: epoch(),
            interval: Duration::from_ticks(0),
        }
    }

    /// Start a run of `blinks` blinks.  No-op while active or for zero blinks.
    pub fn start(&mut self, at: Instant, blinks: u8, interval: Duration) -> bool {
        if self.active || blinks == 0 {
            return false;
        }
        self.active = true;
        self.level = false;
        self.toggles = 0;
        self.target = u16::from(blinks) * 2;
        self.start = at;
        self.interval = interval;
        true
    }

    /// Apply every toggle boundary up to `now`.
    pub fn advance(&mut self, now: Instant) {
        while self.active && now.saturating_duration_since(self.start) >= self.interval {
            self.start += self.interval;
            self.level = !self.level;
            self.toggles += 1;
            if self.toggles >= self.target {
                self.level = false;
                self.active = false;
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn level(&self) -> bool {
        self.level
    }

    pub fn toggles(&self) -> u16 {
        self.toggles
    }
}

/// Phase of the buzzer pattern.  `Beeping` carries the beeps completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzerPhase {
    Idle,
    Beeping(u8),
    Sustained,
}

/// N beeps (silent first half, sounding second half of each interval),
/// then one sustained tone, then idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuzzerPattern {
    phase: BuzzerPhase,
    phase_start: Instant,
}

impl BuzzerPattern {
    pub const fn idle() -> Self {
        Self {
            phase: BuzzerPhase::Idle,
            phase_start: epoch(),
        }
    }

    /// Start from the first beep.  Only an idle pattern can be started.
    pub fn start(&mut self, at: Instant) -> bool {
        if self.phase != BuzzerPhase::Idle {
            return false;
        }
        self.phase = BuzzerPhase::Beeping(0);
        self.phase_start = at;
        true
    }

    /// Apply every phase boundary up to `now`.
    pub fn advance(&mut self, now: Instant, timings: &IndicatorTimings) {
        let interval = timings.beep_interval();
        loop {
            let elapsed = now.saturating_duration_since(self.phase_start);
            match self.phase {
                BuzzerPhase::Idle => break,
                BuzzerPhase::Beeping(done) => {
                    if elapsed < interval {
                        break;
                    }
                    self.phase_start += interval;
                    let done = done.saturating_add(1);
                    self.phase = if done >= timings.buzzer_beeps {
                        BuzzerPhase::Sustained
                    } else {
                        BuzzerPhase::Beeping(done)
                    };
                }
                BuzzerPhase::Sustained => {
                    if elapsed < timings.sustained() {
                        break;
                    }
                    self.phase_start += timings.sustained();
                    self.phase = BuzzerPhase::Idle;
                }
            }
        }
    }

    /// Buzzer level this pattern asks for at `now` (after `advance`).
    pub fn output(&self, now: Instant, timings: &IndicatorTimings) -> bool {
        match self.phase {
            BuzzerPhase::Idle => false,
            BuzzerPhase::Beeping(_) => {
                let half = timings.beep_interval() / 2;
                now.saturating_duration_since(self.phase_start) >= half
            }
            BuzzerPhase::Sustained => true,
        }
    }

    pub fn phase(&self) -> BuzzerPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == BuzzerPhase::Idle
    }
}

/// "Wait W, then blink LED C and run the buzzer pattern."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayedSequence {
    waiting: bool,
    fired: bool,
    start: Instant,
}

impl DelayedSequence {
    pub const fn idle() -> Self {
        Self {
            waiting: false,
            fired: false,
            start: epoch(),
        }
    }

    pub fn trigger(&mut self, at: Instant) -> bool {
        if self.waiting {
            return false;
        }
        self.waiting = true;
        self.fired = false;
        self.start = at;
        true
    }

    /// The instant the sequence should fire, if it is due at `now`.
    fn due(&self, now: Instant, wait: Duration) -> Option<Instant> {
        (self.waiting && !self.fired && now.saturating_duration_since(self.start) >= wait)
            .then(|| self.start + wait)
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Owns every indicator timer.  The only writer of indicator outputs.
pub struct Scheduler {
    /// Single-shot blinks, indexed by [`Indicator`].  The `Buzzer` slot
    /// holds the press chirp; the `LedD` slot is unused (see `run`).
    blinks: [TimedEvent; INDICATOR_COUNT],
    /// Repeating blink on LED D.
    run: BlinkRun,
    buzzer: BuzzerPattern,
    delayed: DelayedSequence,
    /// Last level written to each output.
    levels: [bool; INDICATOR_COUNT],
    /// Outputs whose last write failed; rewritten on the next flush.
    stale: [bool; INDICATOR_COUNT],
    timings: IndicatorTimings,
}

impl Scheduler {
    pub fn new(timings: IndicatorTimings) -> Self {
        Self {
            blinks: [TimedEvent::idle(); INDICATOR_COUNT],
            run: BlinkRun::idle(),
            buzzer: BuzzerPattern::idle(),
            delayed: DelayedSequence::idle(),
            levels: [false; INDICATOR_COUNT],
            stale: [false; INDICATOR_COUNT],
            timings,
        }
    }

    /// Drive every output LOW.  Call once at boot so the physical pins
    /// agree with the recorded levels.
    pub fn reset_outputs(&mut self, sink: &mut impl IndicatorSink) {
        for indicator in Indicator::ALL {
            let i = indicator.index();
            self.levels[i] = false;
            self.stale[i] = sink.set_indicator(indicator, false).is_err();
        }
    }

    /// Arm the local annunciation for one accepted button edge.
    pub fn trigger(&mut self, button: ButtonId, now: Instant, sink: &mut impl IndicatorSink) {
        let t = self.timings;
        match button {
            ButtonId::Panic => {
                self.arm_blink(Indicator::Buzzer, now, ms(t.chirp_ms));
                self.arm_blink(Indicator::LedA, now, ms(t.led_a_ms));
                if self.run.start(now, t.led_d_blinks, t.led_d_interval()) {
                    info!("Scheduler: LED D run started ({} blinks)", t.led_d_blinks);
                }
            }
            ButtonId::Defence => {
                self.arm_blink(Indicator::Buzzer, now, ms(t.chirp_ms));
                self.arm_blink(Indicator::LedB, now, ms(t.led_b_ms));
            }
            ButtonId::Safe => {
                if self.delayed.trigger(now) {
                    info!("Scheduler: safe sequence armed ({} ms wait)", t.safe_wait_ms);
                } else {
                    debug!("Scheduler: safe sequence already pending");
                }
            }
        }
        self.flush(now, sink);
    }

    /// Advance every timer to `now` and write any level changes.
    pub fn advance(&mut self, now: Instant, sink: &mut impl IndicatorSink) {
        let t = self.timings;

        if let Some(at) = self.delayed.due(now, t.safe_wait()) {
            self.delayed.fired = true;
            self.arm_blink(Indicator::LedC, at, ms(t.led_c_ms));
            if self.buzzer.start(at) {
                info!("Scheduler: buzzer pattern started");
            }
        }

        for blink in &mut self.blinks {
            blink.expire(now);
        }
        self.run.advance(now);
        self.buzzer.advance(now, &t);

        if self.delayed.waiting
            && self.delayed.fired
            && !self.blinks[Indicator::LedC.index()].is_active()
            && self.buzzer.is_idle()
        {
            self.delayed.waiting = false;
            info!("Scheduler: safe sequence complete");
        }

        self.flush(now, sink);
    }

    fn arm_blink(&mut self, indicator: Indicator, at: Instant, duration: Duration) {
        if !self.blinks[indicator.index()].arm(at, duration) {
            debug!("Scheduler: {:?} already active, trigger ignored", indicator);
        }
    }

    /// Level each output should show at `now`.
    fn desired(&self, indicator: Indicator, now: Instant) -> bool {
        match indicator {
            Indicator::LedD => self.run.level(),
            Indicator::Buzzer => {
                self.blinks[indicator.index()].is_active()
                    || self.buzzer.output(now, &self.timings)
            }
            _ => self.blinks[indicator.index()].is_active(),
        }
    }

    fn flush(&mut self, now: Instant, sink: &mut impl IndicatorSink) {
        for indicator in Indicator::ALL {
            let i = indicator.index();
            let level = self.desired(indicator, now);
            if self.levels[i] == level && !self.stale[i] {
                continue;
            }
            match sink.set_indicator(indicator, level) {
                Ok(()) => {
                    self.levels[i] = level;
                    self.stale[i] = false;
                }
                // Keep the old level so the next pass tries again.
                Err(_) => self.stale[i] = true,
            }
        }
    }

    // ── Introspection ─────────────────────────────────────────

    /// Last level written to `indicator`.
    pub fn level(&self, indicator: Indicator) -> bool {
        self.levels[indicator.index()]
    }

    /// Whether the timer behind `indicator` is still running.
    pub fn is_active(&self, indicator: Indicator) -> bool {
        match indicator {
            Indicator::LedD => self.run.is_active(),
            Indicator::Buzzer => {
                self.blinks[indicator.index()].is_active() || !self.buzzer.is_idle()
            }
            _ => self.blinks[indicator.index()].is_active(),
        }
    }

    pub fn blink(&self, indicator: Indicator) -> &TimedEvent {
        &self.blinks[indicator.index()]
    }

    pub fn blink_run(&self) -> &BlinkRun {
        &self.run
    }

    pub fn buzzer_phase(&self) -> BuzzerPhase {
        self.buzzer.phase()
    }

    /// The safe-button sequence is pending or running.
    pub fn is_safe_sequence_armed(&self) -> bool {
        self.delayed.is_waiting()
    }

    /// Nothing is running and every output rests LOW.
    pub fn is_quiescent(&self) -> bool {
        Indicator::ALL.iter().all(|&i| !self.is_active(i) && !self.level(i))
            && !self.delayed.is_waiting()
    }

    pub fn timings(&self) -> &IndicatorTimings {
        &self.timings
    }
}

fn ms(millis: u32) -> Duration {
    Duration::from_millis(u64::from(millis))
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
