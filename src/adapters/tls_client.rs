//! TLS client uplink adapter.
//!
//! Implements [`UplinkTransport`] — one outbound stream connection to the
//! bot host.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: ESP-TLS (`esp_idf_svc::tls::EspTls`)
//!   verified against the built-in certificate bundle.
//! - **all other targets**: plaintext `std::net::TcpStream` for host-side
//!   testing against a local listener.
//!
//! ## Connection model
//!
//! 1. `connect()` drops any previous session and opens a new one.
//! 2. Header lines and body bytes are written synchronously.
//! 3. `read_available()` collects the response until the peer closes or
//!    the caller's timeout passes; each underlying read is bounded by
//!    [`READ_SLICE`], so the overshoot past the timeout is at most one
//!    slice.
//! 4. `close()` tears the session down.

use embassy_time::Duration;
use log::{debug, info, warn};

use crate::app::ports::UplinkTransport;
use crate::error::TransportError;

#[cfg(not(target_os = "espidf"))]
use std::io::{Read, Write};

/// Upper bound on one blocking socket read.
pub const READ_SLICE: Duration = Duration::from_millis(200);

const RX_CHUNK: usize = 512;

// ───────────────────────────────────────────────────────────────
// TlsClient
// ───────────────────────────────────────────────────────────────

pub struct TlsClient {
    #[cfg(target_os = "espidf")]
    session: Option<esp_idf_svc::tls::EspTls<esp_idf_svc::tls::InternalSocket>>,

    #[cfg(not(target_os = "espidf"))]
    stream: Option<std::net::TcpStream>,
}

impl Default for TlsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TlsClient {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "espidf")]
            session: None,
            #[cfg(not(target_os = "espidf"))]
            stream: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        #[cfg(target_os = "espidf")]
        {
            self.session.is_some()
        }
        #[cfg(not(target_os = "espidf"))]
        {
            self.stream.is_some()
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        use esp_idf_svc::tls::{Config, EspTls};

        let mut tls = EspTls::new().map_err(|_| TransportError::ConnectFailed)?;
        let config = Config {
            common_name: Some(host),
            use_crt_bundle_attach: true,
            timeout_ms: READ_SLICE.as_millis() as u32,
            ..Default::default()
        };
        tls.connect(host, port, &config).map_err(|e| {
            warn!("TLS(espidf): connect to {}:{} failed ({})", host, port, e);
            TransportError::ConnectFailed
        })?;
        self.session = Some(tls);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        let stream = std::net::TcpStream::connect((host, port)).map_err(|e| {
            warn!("TLS(sim): connect to {}:{} failed ({})", host, port, e);
            TransportError::ConnectFailed
        })?;
        stream
            .set_read_timeout(Some(std::time::Duration::from_millis(READ_SLICE.as_millis())))
            .map_err(|_| TransportError::ConnectFailed)?;
        self.stream = Some(stream);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let tls = self.session.as_mut().ok_or(TransportError::NotConnected)?;
        tls.write_all(data).map_err(|_| TransportError::WriteFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        stream.write_all(data).map_err(|_| TransportError::WriteFailed)
    }

    /// One bounded read.  `Ok(None)` means "nothing yet", `Ok(Some(0))`
    /// means the peer closed.
    #[cfg(target_os = "espidf")]
    fn platform_read(&mut self, buf: &mut [u8]) -> Result<Option<usize>, TransportError> {
        let tls = self.session.as_mut().ok_or(TransportError::NotConnected)?;
        match tls.read(buf) {
            Ok(n) => Ok(Some(n)),
            // ESP-TLS reports its receive timeout as an error.
            Err(_) => Ok(None),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_read(&mut self, buf: &mut [u8]) -> Result<Option<usize>, TransportError> {
        use std::io::ErrorKind;

        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        match stream.read(buf) {
            Ok(n) => Ok(Some(n)),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(None),
            Err(_) => Err(TransportError::ReadFailed),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// UplinkTransport
// ───────────────────────────────────────────────────────────────

impl UplinkTransport for TlsClient {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        self.close();
        self.platform_connect(host, port)?;
        info!("Uplink: connected to {}:{}", host, port);
        Ok(())
    }

    fn send_header_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.platform_write(line.as_bytes())?;
        self.platform_write(b"\r\n")
    }

    fn send_bytes(&mut self, chunk: &[u8]) -> Result<(), TransportError> {
        self.platform_write(chunk)
    }

    fn read_available(
        &mut self,
        timeout: Duration,
        buf: &mut Vec<u8>,
    ) -> Result<usize, TransportError> {
        let started = std::time::Instant::now();
        let limit = std::time::Duration::from_millis(timeout.as_millis());
        let mut chunk = [0u8; RX_CHUNK];
        let mut appended = 0;

        while started.elapsed() < limit {
            match self.platform_read(&mut chunk)? {
                Some(0) => break,
                Some(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    appended += n;
                }
                None => {}
            }
        }
        debug!("Uplink: read {} bytes", appended);
        Ok(appended)
    }

    fn close(&mut self) {
        #[cfg(target_os = "espidf")]
        {
            self.session = None;
        }
        #[cfg(not(target_os = "espidf"))]
        {
            if let Some(stream) = self.stream.take() {
                let _ = stream.shutdown(std::net::Shutdown::Both);
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
