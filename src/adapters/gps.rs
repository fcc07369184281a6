//! GPS adapter: UART byte source plus an NMEA fix decoder.
//!
//! - [`NmeaDecoder`] implements [`FixDecoder`] on top of the `nmea0183`
//!   streaming parser, taking the position from `RMC` and `GGA` sentences
//!   of any talker.  The parser drops sentences with a bad checksum.
//! - **`target_os = "espidf"`**: [`UartGps`] reads the receiver through
//!   `esp_idf_hal::uart::UartDriver` without blocking.
//! - **all other targets**: [`SimGps`] replays a canned byte stream.

use nmea0183::{GPSQuality, ParseResult, Parser};

use crate::app::ports::{FixDecoder, LocationSource};

// ───────────────────────────────────────────────────────────────
// NMEA decoder
// ───────────────────────────────────────────────────────────────

pub struct NmeaDecoder {
    parser: Parser,
    valid: bool,
    latitude: f64,
    longitude: f64,
    sentences: u32,
    rejected: u32,
}

impl Default for NmeaDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl NmeaDecoder {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            valid: false,
            latitude: 0.0,
            longitude: 0.0,
            sentences: 0,
            rejected: 0,
        }
    }

    /// Sentences accepted so far.
    pub fn sentences(&self) -> u32 {
        self.sentences
    }

    /// Sentences dropped for a bad checksum or shape.
    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    fn apply(&mut self, result: ParseResult) {
        match result {
            ParseResult::RMC(Some(rmc)) => {
                self.set_fix(rmc.latitude.as_f64(), rmc.longitude.as_f64());
            }
            ParseResult::GGA(Some(gga)) if gga.gps_quality != GPSQuality::NoFix => {
                self.set_fix(gga.latitude.as_f64(), gga.longitude.as_f64());
            }
            // Void RMC or a GGA without a fix.
            ParseResult::RMC(_) | ParseResult::GGA(_) => self.valid = false,
            _ => {}
        }
    }

    fn set_fix(&mut self, latitude: f64, longitude: f64) {
        self.valid = true;
        self.latitude = latitude;
        self.longitude = longitude;
    }
}

impl FixDecoder for NmeaDecoder {
    fn encode(&mut self, byte: u8) -> bool {
        match self.parser.parse_from_byte(byte) {
            Some(Ok(result)) => {
                self.sentences += 1;
                self.apply(result);
                true
            }
            Some(Err(reason)) => {
                self.rejected += 1;
                log::trace!("GPS: sentence rejected ({})", reason);
                false
            }
            None => false,
        }
    }

    fn is_fix_valid(&self) -> bool {
        self.valid
    }

    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }
}

// ───────────────────────────────────────────────────────────────
// UART source (ESP-IDF)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct UartGps<'d> {
    uart: esp_idf_hal::uart::UartDriver<'d>,
}

#[cfg(target_os = "espidf")]
impl<'d> UartGps<'d> {
    pub fn new(uart: esp_idf_hal::uart::UartDriver<'d>) -> Self {
        Self { uart }
    }
}

#[cfg(target_os = "espidf")]
impl LocationSource for UartGps<'_> {
    fn has_pending_data(&mut self) -> bool {
        self.uart.remaining_read().is_ok_and(|n| n > 0)
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte, esp_idf_hal::delay::NON_BLOCK) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation source
// ───────────────────────────────────────────────────────────────

/// Canned fix over central Bengaluru.
pub const SIM_RMC: &str =
    "$GPRMC,101530,A,1258.2960,N,07735.6740,E,0.0,0.0,181026,,,A*7A\r\n";

/// Host-side GPS: streams a fixed byte sequence once.
pub struct SimGps {
    data: std::vec::Vec<u8>,
    pos: usize,
}

impl SimGps {
    pub fn new(data: impl Into<std::vec::Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// A receiver that never says anything.
    pub fn silent() -> Self {
        Self::new(std::vec::Vec::new())
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl LocationSource for SimGps {
    fn has_pending_data(&mut self) -> bool {
        self.pos < self.data.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        let byte = self.data.get(self.pos).copied()?;
        self.pos += 1;
        Some(byte)
    }
}
