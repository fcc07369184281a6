//! Aurix Firmware — Main Entry Point
//!
//! Hexagonal architecture with a single cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  PinBank          LogEventSink   BotClient     Esp32Clock      │
//! │  (Input+Indicator (EventSink)    (Messaging)   (TimePort)      │
//! │   +Illumination)  EspCamera      TlsClient     UartGps+Nmea    │
//! │                   (Camera)       (Uplink)      (Location)      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              DeviceService (pure logic)                │    │
//! │  │  InputRouter · Scheduler · Alerts · Remote commands    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  WifiStation (reconnect backoff) · Watchdog                    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{self, UartDriver};
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{info, warn};

use aurix::adapters::bot::BotClient;
use aurix::adapters::camera::EspCamera;
use aurix::adapters::gps::{NmeaDecoder, UartGps};
use aurix::adapters::hardware::PinBank;
use aurix::adapters::log_sink::LogEventSink;
use aurix::adapters::time::Esp32Clock;
use aurix::adapters::tls_client::TlsClient;
use aurix::adapters::wifi::{WifiCredentials, WifiStation};
use aurix::app::ports::TimePort;
use aurix::app::service::{Collaborators, DeviceService};
use aurix::config::DeviceConfig;
use aurix::drivers::watchdog::Watchdog;
use aurix::pins;

/// Pause between loop passes.
const LOOP_PERIOD_MS: u32 = 10;

type Button = PinDriver<'static, AnyIOPin, Input>;
type Line = PinDriver<'static, AnyOutputPin, Output>;

fn button(gpio: i32) -> Result<Button> {
    // SAFETY: each GPIO number in `pins` is claimed exactly once, here.
    let mut pin = PinDriver::input(unsafe { AnyIOPin::new(gpio) })?;
    pin.set_pull(Pull::Up)?;
    Ok(pin)
}

fn output(gpio: i32) -> Result<Line> {
    // SAFETY: as above.
    Ok(PinDriver::output(unsafe { AnyOutputPin::new(gpio) })?)
}

/// Compiled-in identity and secrets.
fn build_config() -> Result<DeviceConfig> {
    let chat_id = option_env!("AURIX_CHAT_ID")
        .unwrap_or("0")
        .parse::<i64>()
        .context("AURIX_CHAT_ID is not an integer")?;
    DeviceConfig::with_identity(
        option_env!("AURIX_OWNER_NAME").unwrap_or(""),
        option_env!("AURIX_OWNER_MOBILE").unwrap_or(""),
        chat_id,
        option_env!("AURIX_BOT_TOKEN").unwrap_or(""),
    )
    .context("identity value exceeds its configured capacity")
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Aurix v{}                           ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = build_config()?;
    if config.recipient_chat_id == 0 || config.bot_token.is_empty() {
        warn!("No bot token or recipient chat compiled in; deliveries will fail");
    }

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let clock = Esp32Clock::new();

    // ── 2. GPIO ───────────────────────────────────────────────
    let pin_bank = PinBank::new(
        [
            button(pins::PANIC_BUTTON_GPIO)?,
            button(pins::DEFENCE_BUTTON_GPIO)?,
            button(pins::SAFE_BUTTON_GPIO)?,
        ],
        [
            output(pins::LED_A_GPIO)?,
            output(pins::LED_B_GPIO)?,
            output(pins::LED_C_GPIO)?,
            output(pins::LED_D_GPIO)?,
            output(pins::BUZZER_GPIO)?,
        ],
        output(pins::FLASH_GPIO)?,
    );

    // ── 3. Network ────────────────────────────────────────────
    let wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;
    let credentials = WifiCredentials::from_build(
        option_env!("AURIX_WIFI_SSID"),
        option_env!("AURIX_WIFI_PASS"),
    )?;
    let mut station = WifiStation::new(credentials, wifi);
    if let Err(e) = station.connect(clock.now()) {
        warn!("WiFi unavailable at boot ({}); retrying in the loop", e);
    }

    // ── 4. Peripherals behind the ports ───────────────────────
    let camera = EspCamera::init()
        .inspect_err(|e| warn!("Camera unavailable ({}); alerts go out without photos", e))
        .ok();

    // SAFETY: the GPS UART pins are not used anywhere else.
    let (gps_tx, gps_rx) = unsafe {
        (
            AnyIOPin::new(pins::GPS_UART_TX_GPIO),
            AnyIOPin::new(pins::GPS_UART_RX_GPIO),
        )
    };
    let uart = UartDriver::new(
        peripherals.uart1,
        gps_tx,
        gps_rx,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &uart::config::Config::default().baudrate(Hertz(pins::GPS_BAUD)),
    )?;

    let messenger = BotClient::new(
        TlsClient::new(),
        &config.bot_host,
        &config.bot_token,
        config.photo_response_timeout(),
    )?;

    let mut io = Collaborators {
        pins: pin_bank,
        messenger,
        camera,
        uplink: TlsClient::new(),
        gps: UartGps::new(uart),
        decoder: NmeaDecoder::new(),
        clock,
    };
    let mut sink = LogEventSink::new();
    let mut watchdog = Watchdog::default();

    // ── 5. Service ────────────────────────────────────────────
    let mut service = DeviceService::new(config);
    service.start(&mut io, &mut sink);
    info!("System ready. Entering main loop.");

    loop {
        station.poll(io.clock.now());
        service.tick(&mut io, &mut sink);
        watchdog.feed();
        FreeRtos::delay_ms(LOOP_PERIOD_MS);
    }
}
