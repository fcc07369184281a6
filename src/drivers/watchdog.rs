//! Task watchdog (TWDT).
//!
//! Resets the board if the main loop stops calling [`Watchdog::feed`]
//! for longer than the configured timeout.  A blocked photo upload or GPS
//! wait is bounded well below [`DEFAULT_TIMEOUT`].

use embassy_time::Duration;
use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub struct Watchdog {
    timeout: Duration,
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    #[cfg(not(target_os = "espidf"))]
    feeds: u64,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Watchdog {
    /// Reconfigure the TWDT and subscribe the calling task.
    #[cfg(target_os = "espidf")]
    pub fn new(timeout: Duration) -> Self {
        use esp_idf_svc::sys::{esp, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure};

        let cfg = esp_task_wdt_config_t {
            timeout_ms: timeout.as_millis() as u32,
            idle_core_mask: 0,
            trigger_panic: true,
        };
        if let Err(e) = esp!(unsafe { esp_task_wdt_reconfigure(&cfg) }) {
            warn!("Watchdog: reconfigure failed ({}), keeping boot settings", e);
        }
        let subscribed = match esp!(unsafe { esp_task_wdt_add(core::ptr::null_mut()) }) {
            Ok(()) => {
                info!("Watchdog: subscribed ({} ms, panic on trigger)", timeout.as_millis());
                true
            }
            Err(e) => {
                warn!("Watchdog: subscribe failed ({})", e);
                false
            }
        };
        Self {
            timeout,
            subscribed,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(timeout: Duration) -> Self {
        info!("Watchdog(sim): {} ms, not enforced", timeout.as_millis());
        Self { timeout, feeds: 0 }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[cfg(target_os = "espidf")]
    pub fn feed(&mut self) {
        if self.subscribed {
            unsafe {
                esp_idf_svc::sys::esp_task_wdt_reset();
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn feed(&mut self) {
        self.feeds += 1;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn feeds(&self) -> u64 {
        self.feeds
    }
}
