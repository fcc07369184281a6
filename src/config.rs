//! Device configuration parameters
//!
//! All tunable parameters for the Aurix alert device.  The firmware has no
//! persistent store: `Default` is the compiled-in configuration, and `main`
//! overlays the secrets (bot token, recipient chat) from build-time
//! environment variables.

use embassy_time::Duration;
use heapless::String;
use serde::{Deserialize, Serialize};

/// Bot API host every request is sent to.
pub const DEFAULT_BOT_HOST: &str = "api.telegram.org";

/// Indicator timing constants consumed by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorTimings {
    // --- Single-shot blinks ---
    /// LED A on-time after a panic press (ms)
    pub led_a_ms: u32,
    /// LED B on-time after a defence press (ms)
    pub led_b_ms: u32,
    /// LED C on-time once the safe-button wait has elapsed (ms)
    pub led_c_ms: u32,

    // --- Repeating blink on LED D ---
    /// Number of full on/off blinks
    pub led_d_blinks: u8,
    /// Time between toggles (ms)
    pub led_d_interval_ms: u32,

    // --- Safe button sequence ---
    /// Wait between the safe press and the LED C / buzzer sequence (ms)
    pub safe_wait_ms: u32,

    // --- Buzzer ---
    /// Beeps in the first phase
    pub buzzer_beeps: u8,
    /// Length of one beep cycle; the buzzer sounds in its second half (ms)
    pub buzzer_beep_interval_ms: u32,
    /// Sustained tone after the beeps (ms)
    pub buzzer_sustained_ms: u32,
    /// Short acknowledgement chirp on panic / defence presses (ms)
    pub chirp_ms: u32,
}

impl IndicatorTimings {
    pub fn led_d_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.led_d_interval_ms))
    }

    pub fn safe_wait(&self) -> Duration {
        Duration::from_millis(u64::from(self.safe_wait_ms))
    }

    pub fn beep_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.buzzer_beep_interval_ms))
    }

    pub fn sustained(&self) -> Duration {
        Duration::from_millis(u64::from(self.buzzer_sustained_ms))
    }

    /// Full length of the buzzer pattern from arm to idle.
    pub fn buzzer_total(&self) -> Duration {
        self.beep_interval() * u32::from(self.buzzer_beeps) + self.sustained()
    }
}

impl Default for IndicatorTimings {
    fn default() -> Self {
        Self {
            led_a_ms: 1000,
            led_b_ms: 1000,
            led_c_ms: 1000,

            led_d_blinks: 10,
            led_d_interval_ms: 500,

            safe_wait_ms: 4000,

            buzzer_beeps: 4,
            buzzer_beep_interval_ms: 1000,
            buzzer_sustained_ms: 2000,
            chirp_ms: 50,
        }
    }
}

/// Core device configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    // --- Identity ---
    /// Owner name embedded in every alert
    pub owner_name: String<32>,
    /// Owner phone number embedded in panic alerts and `/show`
    pub owner_mobile: String<20>,

    // --- Messaging ---
    /// The single chat allowed to receive alerts and issue commands
    pub recipient_chat_id: i64,
    /// Bot API token (`<id>:<secret>`)
    pub bot_token: String<64>,
    /// Bot API host name
    pub bot_host: String<32>,

    // --- Timing ---
    /// Minimum spacing between edges of one button (ms)
    pub debounce_ms: u32,
    /// Minimum spacing between bot update polls (ms)
    pub bot_poll_interval_ms: u32,
    /// Upper bound on one location request (ms)
    pub location_deadline_ms: u32,
    /// Flash-on time before the frame is grabbed (ms)
    pub flash_warmup_ms: u32,
    /// Upper bound on reading the photo upload response (ms)
    pub photo_response_timeout_ms: u32,
    /// Size of each image chunk written to the uplink
    pub upload_chunk_bytes: u16,

    pub indicators: IndicatorTimings,
}

impl DeviceConfig {
    /// Defaults with the identity and bot fields filled in.
    ///
    /// `None` if any value exceeds its field's capacity.
    pub fn with_identity(
        owner_name: &str,
        owner_mobile: &str,
        recipient_chat_id: i64,
        bot_token: &str,
    ) -> Option<Self> {
        let mut c = Self::default();
        c.owner_name.push_str(owner_name).ok()?;
        c.owner_mobile.push_str(owner_mobile).ok()?;
        c.bot_token.push_str(bot_token).ok()?;
        c.recipient_chat_id = recipient_chat_id;
        Some(c)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(u64::from(self.debounce_ms))
    }

    pub fn bot_poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.bot_poll_interval_ms))
    }

    pub fn location_deadline(&self) -> Duration {
        Duration::from_millis(u64::from(self.location_deadline_ms))
    }

    pub fn flash_warmup(&self) -> Duration {
        Duration::from_millis(u64::from(self.flash_warmup_ms))
    }

    pub fn photo_response_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.photo_response_timeout_ms))
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let mut bot_host = String::new();
        // Fits: the constant is shorter than the capacity.
        let _ = bot_host.push_str(DEFAULT_BOT_HOST);

        Self {
            owner_name: String::new(),
            owner_mobile: String::new(),

            recipient_chat_id: 0,
            bot_token: String::new(),
            bot_host,

            debounce_ms: 200,
            bot_poll_interval_ms: 1000,
            location_deadline_ms: 3000,
            flash_warmup_ms: 300,
            photo_response_timeout_ms: 2000,
            upload_chunk_bytes: 1024,

            indicators: IndicatorTimings::default(),
        }
    }
}
