//! Mock adapters for integration tests.
//!
//! Records every output call so tests can assert on the full history
//! without touching real GPIO, sockets, or UARTs.  The camera and GPS use
//! the library's own simulation adapters.

use std::collections::VecDeque;

use aurix::adapters::camera::SimCamera;
use aurix::adapters::gps::{NmeaDecoder, SimGps};
use aurix::app::events::AppEvent;
use aurix::app::ports::{
    EventSink, IlluminationPort, IndicatorSink, InputPort, MessagingPort, TimePort, Update,
    UplinkTransport,
};
use aurix::app::service::{Collaborators, DeviceService};
use aurix::config::DeviceConfig;
use aurix::drivers::button::{BUTTON_COUNT, ButtonId};
use aurix::error::{HardwareError, TransportError};
use aurix::scheduler::Indicator;
use embassy_time::{Duration, Instant};

pub const OWNER_CHAT: i64 = 4242;

pub fn at(ms: u64) -> Instant {
    Instant::from_ticks(0) + Duration::from_millis(ms)
}

// ── MockPins ──────────────────────────────────────────────────

/// Buttons, indicators, and flash on one bank.
pub struct MockPins {
    pub held: [bool; BUTTON_COUNT],
    pub unreadable: Option<ButtonId>,
    /// Writes to this output fail.
    pub stuck: Option<Indicator>,
    pub indicator_calls: Vec<(Indicator, bool)>,
    pub flash_calls: Vec<bool>,
}

#[allow(dead_code)]
impl MockPins {
    pub fn new() -> Self {
        Self {
            held: [false; BUTTON_COUNT],
            unreadable: None,
            stuck: None,
            indicator_calls: Vec::new(),
            flash_calls: Vec::new(),
        }
    }

    pub fn press(&mut self, button: ButtonId) {
        self.held[button.index()] = true;
    }

    pub fn release_all(&mut self) {
        self.held = [false; BUTTON_COUNT];
    }

    pub fn writes_to(&self, indicator: Indicator) -> usize {
        self.indicator_calls
            .iter()
            .filter(|(i, _)| *i == indicator)
            .count()
    }

    pub fn last_level(&self, indicator: Indicator) -> Option<bool> {
        self.indicator_calls
            .iter()
            .rev()
            .find(|(i, _)| *i == indicator)
            .map(|&(_, on)| on)
    }
}

impl Default for MockPins {
    fn default() -> Self {
        Self::new()
    }
}

impl InputPort for MockPins {
    fn is_asserted(&mut self, button: ButtonId) -> Result<bool, HardwareError> {
        if self.unreadable == Some(button) {
            return Err(HardwareError::GpioReadFailed);
        }
        Ok(self.held[button.index()])
    }
}

impl IndicatorSink for MockPins {
    fn set_indicator(&mut self, indicator: Indicator, on: bool) -> Result<(), HardwareError> {
        self.indicator_calls.push((indicator, on));
        if self.stuck == Some(indicator) {
            return Err(HardwareError::GpioWriteFailed);
        }
        Ok(())
    }
}

impl IlluminationPort for MockPins {
    fn set_flash(&mut self, on: bool) {
        self.flash_calls.push(on);
    }
}

// ── MockMessenger ─────────────────────────────────────────────

/// Bot server stand-in: keeps a queue of pending updates and records
/// every message sent.
pub struct MockMessenger {
    pub sent: Vec<(i64, String)>,
    pub pending: VecDeque<Update>,
    pub polls: Vec<i64>,
    pub page: usize,
    pub fail_send: bool,
    pub fail_poll: bool,
    next_id: i64,
}

#[allow(dead_code)]
impl MockMessenger {
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            pending: VecDeque::new(),
            polls: Vec::new(),
            page: 10,
            fail_send: false,
            fail_poll: false,
            next_id: 100,
        }
    }

    pub fn inbound(&mut self, chat_id: i64, text: &str) {
        self.pending.push_back(Update {
            update_id: self.next_id,
            chat_id,
            text: text.to_owned(),
        });
        self.next_id += 1;
    }

    pub fn texts(&self) -> Vec<&str> {
        self.sent.iter().map(|(_, t)| t.as_str()).collect()
    }
}

impl Default for MockMessenger {
    fn default() -> Self {
        Self::new()
    }
}

impl MessagingPort for MockMessenger {
    fn send_message(&mut self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        if self.fail_send {
            return Err(TransportError::ConnectFailed);
        }
        self.sent.push((chat_id, text.to_owned()));
        Ok(())
    }

    fn get_updates(&mut self, since: i64) -> Result<Vec<Update>, TransportError> {
        self.polls.push(since);
        if self.fail_poll {
            return Err(TransportError::ReadFailed);
        }
        // The server forgets everything below the acknowledged offset.
        while self.pending.front().is_some_and(|u| u.update_id < since) {
            self.pending.pop_front();
        }
        Ok(self.pending.iter().take(self.page).cloned().collect())
    }
}

// ── MockUplink ────────────────────────────────────────────────

pub struct MockUplink {
    pub header_lines: Vec<String>,
    pub body: Vec<u8>,
    /// Length of every accepted `send_bytes` call.
    pub writes: Vec<usize>,
    pub response: Vec<u8>,
    pub connects: usize,
    pub closes: usize,
    pub fail_connect: bool,
    /// Fail the n-th `send_bytes` call (0-based).
    pub fail_send_at: Option<usize>,
    sends: usize,
}

#[allow(dead_code)]
impl MockUplink {
    pub fn new() -> Self {
        Self {
            header_lines: Vec::new(),
            body: Vec::new(),
            writes: Vec::new(),
            response: b"HTTP/1.1 200 OK\r\n\r\n{\"ok\":true}".to_vec(),
            connects: 0,
            closes: 0,
            fail_connect: false,
            fail_send_at: None,
            sends: 0,
        }
    }

    /// Value of the first request header called `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        let prefix = format!("{name}: ");
        self.header_lines
            .iter()
            .find_map(|line| line.strip_prefix(prefix.as_str()))
    }
}

impl Default for MockUplink {
    fn default() -> Self {
        Self::new()
    }
}

impl UplinkTransport for MockUplink {
    fn connect(&mut self, _host: &str, _port: u16) -> Result<(), TransportError> {
        if self.fail_connect {
            return Err(TransportError::ConnectFailed);
        }
        self.connects += 1;
        Ok(())
    }

    fn send_header_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.header_lines.push(line.to_owned());
        Ok(())
    }

    fn send_bytes(&mut self, chunk: &[u8]) -> Result<(), TransportError> {
        let n = self.sends;
        self.sends += 1;
        if self.fail_send_at == Some(n) {
            return Err(TransportError::WriteFailed);
        }
        self.body.extend_from_slice(chunk);
        self.writes.push(chunk.len());
        Ok(())
    }

    fn read_available(
        &mut self,
        _timeout: Duration,
        buf: &mut Vec<u8>,
    ) -> Result<usize, TransportError> {
        buf.extend_from_slice(&self.response);
        Ok(self.response.len())
    }

    fn close(&mut self) {
        self.closes += 1;
    }
}

// ── ManualClock ───────────────────────────────────────────────

/// Time only moves when a test sets it or something sleeps.
pub struct ManualClock {
    pub now: Instant,
    pub slept: Duration,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: at(0),
            slept: Duration::from_ticks(0),
        }
    }

    pub fn set(&mut self, now: Instant) {
        self.now = now;
    }
}

impl TimePort for ManualClock {
    fn now(&self) -> Instant {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.now += duration;
        self.slept += duration;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type TestIo =
    Collaborators<MockPins, MockMessenger, SimCamera, MockUplink, SimGps, NmeaDecoder, ManualClock>;

pub fn test_config() -> DeviceConfig {
    DeviceConfig::with_identity("Asha Rao", "+91 98450 00000", OWNER_CHAT, "123:secret")
        .expect("test identity fits")
}

/// A started service with a silent GPS.
pub fn rig() -> (DeviceService, TestIo, RecordingSink) {
    rig_with_gps(SimGps::silent())
}

pub fn rig_with_gps(gps: SimGps) -> (DeviceService, TestIo, RecordingSink) {
    let mut io = Collaborators {
        pins: MockPins::new(),
        messenger: MockMessenger::new(),
        camera: SimCamera::new(),
        uplink: MockUplink::new(),
        gps,
        decoder: NmeaDecoder::new(),
        clock: ManualClock::new(),
    };
    let mut sink = RecordingSink::default();
    let mut service = DeviceService::new(test_config());
    service.start(&mut io, &mut sink);
    (service, io, sink)
}
