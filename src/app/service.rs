//! Device service — the hexagonal core.
//!
//! [`DeviceService`] owns the input router, the indicator scheduler, the
//! alert dispatcher, and the remote command dispatcher.  All I/O flows
//! through port traits bundled in [`Collaborators`], making the whole
//! tick testable with mock adapters.
//!
//! ```text
//!   InputPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │        DeviceService         │
//! IndicatorSink ◀─│ Router · Scheduler · Alerts  │ ◀─▶ MessagingPort
//!                 │ Remote                       │ ──▶ Camera / Uplink
//!                 └──────────────────────────────┘ ◀── GPS
//! ```
//!
//! Alerts and remote commands are queued and run by the tick that follows,
//! at most one stalling action (photo or location wait) per tick, so a
//! burst of requests never holds the loop past the watchdog.

use embassy_time::{Duration, Instant};
use heapless::Deque;
use log::{debug, info};

use crate::config::DeviceConfig;
use crate::drivers::button::{BUTTON_COUNT, InputRouter};
use crate::error::TransportError;
use crate::scheduler::Scheduler;

use super::alerts::{AlertDispatcher, AlertIo, AlertKind};
use super::commands::RemoteCommand;
use super::events::AppEvent;
use super::location::{self, LocationResult};
use super::photo::{self, UploadResult};
use super::ports::{
    CameraPort, EventSink, FixDecoder, IlluminationPort, IndicatorSink, InputPort,
    LocationSource, MessagingPort, TimePort, UplinkTransport,
};
use super::remote::{MAX_COMMANDS_PER_POLL, RemoteCommandDispatcher};

// ───────────────────────────────────────────────────────────────
// Collaborators
// ───────────────────────────────────────────────────────────────

/// Every adapter the service talks to.
///
/// `pins` covers buttons, indicators, and the flash so a single GPIO
/// bank can serve all three ports.
pub struct Collaborators<G, M, C, U, S, D, K> {
    pub pins: G,
    pub messenger: M,
    pub camera: C,
    pub uplink: U,
    pub gps: S,
    pub decoder: D,
    pub clock: K,
}

impl<G, M, C, U, S, D, K> AlertIo for Collaborators<G, M, C, U, S, D, K>
where
    G: IlluminationPort,
    M: MessagingPort,
    C: CameraPort,
    U: UplinkTransport,
    S: LocationSource,
    D: FixDecoder,
    K: TimePort,
{
    fn send_message(&mut self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.messenger.send_message(chat_id, text)
    }

    fn capture_and_send(&mut self, config: &DeviceConfig, chat_id: i64) -> UploadResult {
        photo::capture_and_send(
            &mut self.camera,
            &mut self.pins,
            &mut self.uplink,
            &mut self.clock,
            config,
            chat_id,
        )
    }

    fn resolve_location(&mut self, deadline: Duration) -> LocationResult {
        location::resolve(&mut self.gps, &mut self.decoder, &mut self.clock, deadline)
    }

    fn now(&self) -> Instant {
        self.clock.now()
    }
}

// ───────────────────────────────────────────────────────────────
// DeviceService
// ───────────────────────────────────────────────────────────────

/// The device service orchestrates all domain logic.
pub struct DeviceService {
    router: InputRouter,
    scheduler: Scheduler,
    alerts: AlertDispatcher,
    remote: RemoteCommandDispatcher,
    /// One slot per alert kind; a kind already waiting is not queued twice.
    pending_alerts: Deque<AlertKind, BUTTON_COUNT>,
    /// The last poll's commands, not yet run.
    pending_commands: Deque<RemoteCommand, MAX_COMMANDS_PER_POLL>,
    config: DeviceConfig,
    tick_count: u64,
}

impl DeviceService {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            router: InputRouter::new(config.debounce()),
            scheduler: Scheduler::new(config.indicators),
            alerts: AlertDispatcher::new(),
            remote: RemoteCommandDispatcher::new(
                config.bot_poll_interval(),
                config.recipient_chat_id,
            ),
            pending_alerts: Deque::new(),
            pending_commands: Deque::new(),
            config,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive every output LOW and announce the device to the recipient.
    pub fn start<G, M, C, U, S, D, K>(
        &mut self,
        io: &mut Collaborators<G, M, C, U, S, D, K>,
        sink: &mut impl EventSink,
    ) where
        G: InputPort + IndicatorSink + IlluminationPort,
        M: MessagingPort,
        C: CameraPort,
        U: UplinkTransport,
        S: LocationSource,
        D: FixDecoder,
        K: TimePort,
    {
        self.scheduler.reset_outputs(&mut io.pins);
        io.pins.set_flash(false);
        self.alerts.announce_boot(io, &self.config, sink);
        sink.emit(&AppEvent::Started);
        info!("DeviceService started");
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one pass: inputs → scheduler → GPS → remote poll → queued work.
    ///
    /// Only the last step can stall, and only for one bounded photo or
    /// location action.  Anything else waiting runs on later ticks.
    pub fn tick<G, M, C, U, S, D, K>(
        &mut self,
        io: &mut Collaborators<G, M, C, U, S, D, K>,
        sink: &mut impl EventSink,
    ) where
        G: InputPort + IndicatorSink + IlluminationPort,
        M: MessagingPort,
        C: CameraPort,
        U: UplinkTransport,
        S: LocationSource,
        D: FixDecoder,
        K: TimePort,
    {
        self.tick_count += 1;
        let now = io.clock.now();

        // 1. Sample buttons
        let edges = self.router.poll(now, &mut io.pins);

        // 2. Local annunciation first, so LEDs react before any network stall
        for edge in &edges {
            sink.emit(&AppEvent::ButtonPressed(edge.source));
            self.scheduler.trigger(edge.source, edge.timestamp, &mut io.pins);
        }
        self.scheduler.advance(now, &mut io.pins);

        // 3. Queue the remote alert for each edge
        for edge in &edges {
            let kind = AlertKind::from(edge.source);
            if self.pending_alerts.iter().any(|k| *k == kind) {
                debug!("Service: {:?} alert already pending", kind);
            } else {
                // Cannot fail: one slot per kind.
                let _ = self.pending_alerts.push_back(kind);
            }
        }

        // 4. Keep the fix decoder current between requests
        location::drain(&mut io.gps, &mut io.decoder);

        // 5. Fetch more commands once the last batch has run (rate-limited inside)
        if self.pending_commands.is_empty() {
            for command in self.remote.poll_once(io.clock.now(), &mut io.messenger, sink) {
                // Cannot fail: the queue is as deep as one poll.
                let _ = self.pending_commands.push_back(command);
            }
        }

        // 6. Alerts first, then commands, stopping after one stall
        self.run_pending(io, sink);
    }

    fn run_pending<G, M, C, U, S, D, K>(
        &mut self,
        io: &mut Collaborators<G, M, C, U, S, D, K>,
        sink: &mut impl EventSink,
    ) where
        G: InputPort + IndicatorSink + IlluminationPort,
        M: MessagingPort,
        C: CameraPort,
        U: UplinkTransport,
        S: LocationSource,
        D: FixDecoder,
        K: TimePort,
    {
        loop {
            let stalled = if let Some(kind) = self.pending_alerts.pop_front() {
                self.alerts.dispatch(kind, io, &self.config, sink);
                true
            } else if let Some(command) = self.pending_commands.pop_front() {
                self.alerts.execute(command, io, &self.config, sink);
                command.may_stall()
            } else {
                break;
            };
            self.scheduler.advance(io.clock.now(), &mut io.pins);
            if stalled {
                break;
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn alerts(&self) -> &AlertDispatcher {
        &self.alerts
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Alerts and commands waiting for a later tick.
    pub fn pending(&self) -> usize {
        self.pending_alerts.len() + self.pending_commands.len()
    }
}
