//! WiFi station-mode adapter.
//!
//! Brings the station up at boot and keeps it up: the main loop calls
//! [`WifiStation::poll`] every pass, which notices a dropped link and
//! retries on an exponential backoff.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::BlockingWifi` over
//!   `EspWifi`.
//! - **all other targets**: an in-memory link that tests can drop or make
//!   fail.
//!
//! A dropped link is retried after 2 s, doubling per failed attempt up to
//! 60 s.  Alerts raised while offline fail fast and are reported, never
//! queued.

use core::fmt;

use embassy_time::{Duration, Instant};
use log::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "station SSID not compiled in"),
            Self::InvalidSsid => write!(f, "SSID must be 1-32 printable ASCII bytes"),
            Self::InvalidPassword => write!(
                f,
                "passphrase must be empty (open) or 8-64 bytes (WPA2)"
            ),
            Self::ConnectionFailed => write!(f, "station failed to associate"),
        }
    }
}

impl core::error::Error for ConnectivityError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connected,
    Reconnecting { attempt: u32 },
}

const INITIAL_BACKOFF_SECS: u64 = 2;
const MAX_BACKOFF_SECS: u64 = 60;

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

/// Validated station credentials.  An empty password means an open network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        let mut s = heapless::String::new();
        s.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        let mut p = heapless::String::new();
        p.push_str(password)
            .map_err(|_| ConnectivityError::InvalidPassword)?;
        Ok(Self {
            ssid: s,
            password: p,
        })
    }

    /// Credentials baked in at build time; `None` when the SSID is unset.
    pub fn from_build(ssid: Option<&str>, password: Option<&str>) -> Result<Self, ConnectivityError> {
        let ssid = ssid.filter(|s| !s.is_empty()).ok_or(ConnectivityError::NoCredentials)?;
        Self::new(ssid, password.unwrap_or(""))
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Station
// ───────────────────────────────────────────────────────────────

pub struct WifiStation {
    credentials: WifiCredentials,
    state: WifiState,
    backoff: Duration,
    next_retry: Option<Instant>,

    #[cfg(target_os = "espidf")]
    wifi: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,

    #[cfg(not(target_os = "espidf"))]
    sim: SimLink,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
struct SimLink {
    up: bool,
    fail_next: u32,
    attempts: u32,
}

impl WifiStation {
    #[cfg(target_os = "espidf")]
    pub fn new(
        credentials: WifiCredentials,
        wifi: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
    ) -> Self {
        Self {
            credentials,
            state: WifiState::Disconnected,
            backoff: Duration::from_secs(INITIAL_BACKOFF_SECS),
            next_retry: None,
            wifi,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(credentials: WifiCredentials) -> Self {
        Self {
            credentials,
            state: WifiState::Disconnected,
            backoff: Duration::from_secs(INITIAL_BACKOFF_SECS),
            next_retry: None,
            sim: SimLink::default(),
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }

    /// Wait before the next reconnect attempt.
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Blocking first connection at boot.
    pub fn connect(&mut self, now: Instant) -> Result<(), ConnectivityError> {
        info!("WiFi: connecting to '{}'", self.credentials.ssid());
        match self.platform_connect() {
            Ok(()) => {
                self.on_connected();
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed ({})", e);
                self.schedule_retry(now, 0);
                Err(e)
            }
        }
    }

    /// Watch the link and retry on the backoff schedule.
    pub fn poll(&mut self, now: Instant) {
        match self.state {
            WifiState::Connected => {
                if !self.platform_is_up() {
                    warn!("WiFi: connection lost, entering reconnect");
                    self.schedule_retry(now, 0);
                }
            }
            WifiState::Reconnecting { attempt } => {
                if self.next_retry.is_some_and(|at| now < at) {
                    return;
                }
                info!(
                    "WiFi: reconnect attempt {} (backoff {}s)",
                    attempt,
                    self.backoff.as_secs()
                );
                if self.platform_connect().is_ok() {
                    self.on_connected();
                } else {
                    let doubled = (self.backoff.as_secs() * 2).min(MAX_BACKOFF_SECS);
                    self.backoff = Duration::from_secs(doubled);
                    self.schedule_retry(now, attempt + 1);
                }
            }
            WifiState::Disconnected => {}
        }
    }

    fn on_connected(&mut self) {
        self.state = WifiState::Connected;
        self.backoff = Duration::from_secs(INITIAL_BACKOFF_SECS);
        self.next_retry = None;
        info!("WiFi: connected to '{}'", self.credentials.ssid());
    }

    fn schedule_retry(&mut self, now: Instant, attempt: u32) {
        self.state = WifiState::Reconnecting { attempt };
        self.next_retry = Some(now + self.backoff);
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if self.credentials.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: self
                .credentials
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .credentials
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        let fail = |e: esp_idf_svc::sys::EspError| {
            warn!("WiFi(espidf): {}", e);
            ConnectivityError::ConnectionFailed
        };
        self.wifi.set_configuration(&config).map_err(fail)?;
        if !self.wifi.is_started().map_err(fail)? {
            self.wifi.start().map_err(fail)?;
        }
        self.wifi.connect().map_err(fail)?;
        self.wifi.wait_netif_up().map_err(fail)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        self.sim.attempts += 1;
        if self.sim.fail_next > 0 {
            self.sim.fail_next -= 1;
            warn!("WiFi(sim): simulated failure (attempt {})", self.sim.attempts);
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.sim.up = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_up(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_up(&self) -> bool {
        self.sim.up
    }

    // ── Simulation hooks ──────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_link(&mut self) {
        self.sim.up = false;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next(&mut self, attempts: u32) {
        self.sim.fail_next = attempts;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_attempts(&self) -> u32 {
        self.sim.attempts
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
