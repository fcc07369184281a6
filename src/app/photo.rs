//! Photo capture and multipart upload.
//!
//! ## Request layout
//!
//! ```text
//! POST /bot<token>/sendPhoto HTTP/1.1
//! Host: <bot host>
//! Content-Type: multipart/form-data; boundary=<BOUNDARY>
//! Content-Length: <head + image + tail>
//! Connection: close
//!
//! --<BOUNDARY>                      ┐
//! chat_id part                      │ head
//! --<BOUNDARY>                      │
//! photo part headers                ┘
//! <JPEG bytes, UPLOAD_CHUNK at a time>
//! --<BOUNDARY>--                      tail
//! ```
//!
//! The frame buffer is held by a [`FrameGuard`] for the whole upload and
//! handed back to the camera on every exit path.

use crate::app::ports::{CameraPort, IlluminationPort, TimePort, UplinkTransport};
use crate::config::DeviceConfig;
use crate::error::TransportError;

/// The bot API only listens on HTTPS.
pub const BOT_PORT: u16 = 443;

/// Fixed multipart boundary token.
pub const BOUNDARY: &str = "AurixPhotoBoundary7MA4YWxk";

/// Outcome of one capture-and-upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResult {
    /// Upload finished; carries the raw HTTP response.
    Ok(Vec<u8>),
    /// The camera returned no frame.
    CaptureFailed,
    /// Connect, write, or read failed.
    TransportFailed(TransportError),
}

// ── Multipart framing ─────────────────────────────────────────

/// The text around the image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multipart {
    head: String,
    tail: String,
}

impl Multipart {
    pub fn new(chat_id: i64) -> Self {
        let head = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"chat_id\"\r\n\r\n\
             {chat_id}\r\n\
             --{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"photo\"; filename=\"aurix.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\n"
        );
        let tail = format!("\r\n--{BOUNDARY}--\r\n");
        Self { head, tail }
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn tail(&self) -> &str {
        &self.tail
    }

    /// Body length for an image of `image_len` bytes.
    pub fn content_length(&self, image_len: usize) -> usize {
        self.head.len() + image_len + self.tail.len()
    }
}

// ── Frame guard ───────────────────────────────────────────────

/// Returns the frame to the camera when dropped.
pub struct FrameGuard<'a, C: CameraPort> {
    camera: &'a mut C,
    frame: Option<C::Frame>,
}

impl<'a, C: CameraPort> FrameGuard<'a, C> {
    pub fn new(camera: &'a mut C, frame: C::Frame) -> Self {
        Self {
            camera,
            frame: Some(frame),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match &self.frame {
            Some(frame) => frame.as_ref(),
            None => &[],
        }
    }
}

impl<C: CameraPort> Drop for FrameGuard<'_, C> {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.camera.release_frame(frame);
        }
    }
}

// ── Capture + upload ──────────────────────────────────────────

/// Flash, grab one frame, and upload it to `chat_id`.
///
/// Stalls for the flash warm-up plus at most the response timeout.
pub fn capture_and_send<C, L, U, T>(
    camera: &mut C,
    flash: &mut L,
    uplink: &mut U,
    clock: &mut T,
    config: &DeviceConfig,
    chat_id: i64,
) -> UploadResult
where
    C: CameraPort,
    L: IlluminationPort,
    U: UplinkTransport,
    T: TimePort,
{
    flash.set_flash(true);
    clock.sleep(config.flash_warmup());
    let frame = camera.capture_frame();
    flash.set_flash(false);

    let Some(frame) = frame else {
        log::warn!("Photo: camera returned no frame");
        return UploadResult::CaptureFailed;
    };
    let guard = FrameGuard::new(camera, frame);

    match upload(uplink, guard.bytes(), config, chat_id) {
        Ok(response) => UploadResult::Ok(response),
        Err(e) => UploadResult::TransportFailed(e),
    }
}

fn upload(
    uplink: &mut impl UplinkTransport,
    image: &[u8],
    config: &DeviceConfig,
    chat_id: i64,
) -> Result<Vec<u8>, TransportError> {
    uplink.connect(&config.bot_host, BOT_PORT)?;
    let result = send_request(uplink, image, config, chat_id);
    uplink.close();
    result
}

fn send_request(
    uplink: &mut impl UplinkTransport,
    image: &[u8],
    config: &DeviceConfig,
    chat_id: i64,
) -> Result<Vec<u8>, TransportError> {
    let body = Multipart::new(chat_id);

    uplink.send_header_line(&format!("POST /bot{}/sendPhoto HTTP/1.1", config.bot_token))?;
    uplink.send_header_line(&format!("Host: {}", config.bot_host))?;
    uplink.send_header_line(&format!(
        "Content-Type: multipart/form-data; boundary={BOUNDARY}"
    ))?;
    uplink.send_header_line(&format!(
        "Content-Length: {}",
        body.content_length(image.len())
    ))?;
    uplink.send_header_line("Connection: close")?;
    uplink.send_header_line("")?;

    uplink.send_bytes(body.head().as_bytes())?;
    let chunk = usize::from(config.upload_chunk_bytes.max(1));
    for piece in image.chunks(chunk) {
        uplink.send_bytes(piece)?;
    }
    uplink.send_bytes(body.tail().as_bytes())?;

    let mut response = Vec::new();
    uplink.read_available(config.photo_response_timeout(), &mut response)?;
    log::info!("Photo: uploaded {} bytes, {} byte response", image.len(), response.len());
    Ok(response)
}
