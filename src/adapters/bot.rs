//! Bot API messaging adapter.
//!
//! Implements [`MessagingPort`] by speaking the bot HTTP API over any
//! [`UplinkTransport`]: one short-lived `Connection: close` request per
//! call, JSON bodies via `serde_json`.
//!
//! | Call            | Request                                         |
//! |-----------------|-------------------------------------------------|
//! | `send_message`  | `POST /bot<token>/sendMessage` + JSON body      |
//! | `get_updates`   | `GET /bot<token>/getUpdates?offset=<since>&...` |
//!
//! Responses may be framed with `Content-Length`, chunked transfer
//! encoding, or just the connection close; all three are handled.

use embassy_time::Duration;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::app::photo::BOT_PORT;
use crate::app::ports::{MessagingPort, Update, UplinkTransport};
use crate::error::TransportError;

/// Most updates requested per `getUpdates` call.
pub const UPDATES_PAGE: u8 = 10;

// ───────────────────────────────────────────────────────────────
// Wire types
// ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct RawUpdate {
    update_id: i64,
    message: Option<RawMessage>,
}

#[derive(Deserialize)]
struct RawMessage {
    chat: RawChat,
    text: Option<String>,
}

#[derive(Deserialize)]
struct RawChat {
    id: i64,
}

/// Decode a `getUpdates` body into updates.
///
/// Non-message updates keep their id (so the offset moves past them) but
/// carry chat 0 and empty text, which the dispatcher drops.
pub fn parse_updates(body: &[u8]) -> Result<Vec<Update>, TransportError> {
    let response: ApiResponse<Vec<RawUpdate>> =
        serde_json::from_slice(body).map_err(|_| TransportError::Malformed)?;
    if !response.ok {
        warn!(
            "Bot: getUpdates rejected ({})",
            response.description.as_deref().unwrap_or("no description")
        );
        return Err(TransportError::Malformed);
    }
    Ok(response
        .result
        .unwrap_or_default()
        .into_iter()
        .map(|raw| match raw.message {
            Some(msg) => Update {
                update_id: raw.update_id,
                chat_id: msg.chat.id,
                text: msg.text.unwrap_or_default(),
            },
            None => Update {
                update_id: raw.update_id,
                chat_id: 0,
                text: String::new(),
            },
        })
        .collect())
}

// ───────────────────────────────────────────────────────────────
// HTTP response framing
// ───────────────────────────────────────────────────────────────

/// Status code and decoded body of one HTTP/1.1 response.
#[derive(Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Split a raw response into status and body, undoing chunked encoding.
pub fn parse_http(raw: &[u8]) -> Result<HttpResponse, TransportError> {
    let head_end = find(raw, b"\r\n\r\n").ok_or(TransportError::Malformed)?;
    let head = core::str::from_utf8(&raw[..head_end]).map_err(|_| TransportError::Malformed)?;
    let body = &raw[head_end + 4..];

    let mut lines = head.split("\r\n");
    let status = lines
        .next()
        .and_then(|line| line.split(' ').nth(1))
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or(TransportError::Malformed)?;

    let mut chunked = false;
    let mut content_length = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("transfer-encoding") {
            chunked = value.eq_ignore_ascii_case("chunked");
        } else if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().ok();
        }
    }

    let body = if chunked {
        dechunk(body)?
    } else if let Some(len) = content_length {
        body.get(..len).ok_or(TransportError::Malformed)?.to_vec()
    } else {
        body.to_vec()
    };
    Ok(HttpResponse { status, body })
}

fn dechunk(mut data: &[u8]) -> Result<Vec<u8>, TransportError> {
    let mut out = Vec::new();
    loop {
        let line_end = find(data, b"\r\n").ok_or(TransportError::Malformed)?;
        let size_field = core::str::from_utf8(&data[..line_end])
            .map_err(|_| TransportError::Malformed)?
            .split(';')
            .next()
            .unwrap_or("")
            .trim();
        let size = usize::from_str_radix(size_field, 16).map_err(|_| TransportError::Malformed)?;
        data = &data[line_end + 2..];
        if size == 0 {
            return Ok(out);
        }
        let chunk = data.get(..size).ok_or(TransportError::Malformed)?;
        out.extend_from_slice(chunk);
        data = data.get(size + 2..).ok_or(TransportError::Malformed)?;
    }
}

// ───────────────────────────────────────────────────────────────
// BotClient
// ───────────────────────────────────────────────────────────────

pub struct BotClient<T> {
    transport: T,
    host: heapless::String<32>,
    token: heapless::String<64>,
    response_timeout: Duration,
}

impl<T: UplinkTransport> BotClient<T> {
    pub fn new(
        transport: T,
        host: &str,
        token: &str,
        response_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let mut h = heapless::String::new();
        h.push_str(host).map_err(|_| TransportError::Malformed)?;
        let mut t = heapless::String::new();
        t.push_str(token).map_err(|_| TransportError::Malformed)?;
        Ok(Self {
            transport,
            host: h,
            token: t,
            response_timeout,
        })
    }

    /// The underlying transport (tests inspect what was written).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn request(
        &mut self,
        method: &str,
        path_and_query: &str,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse, TransportError> {
        self.transport.connect(&self.host, BOT_PORT)?;
        let result = self.exchange(method, path_and_query, body);
        self.transport.close();

        let response = result?;
        if !(200..300).contains(&response.status) {
            warn!("Bot: {} {} -> HTTP {}", method, redact(path_and_query), response.status);
            return Err(TransportError::HttpStatus(response.status));
        }
        Ok(response)
    }

    fn exchange(
        &mut self,
        method: &str,
        path_and_query: &str,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse, TransportError> {
        let t = &mut self.transport;
        t.send_header_line(&format!("{method} /bot{}/{path_and_query} HTTP/1.1", self.token))?;
        t.send_header_line(&format!("Host: {}", self.host))?;
        if let Some(body) = body {
            t.send_header_line("Content-Type: application/json")?;
            t.send_header_line(&format!("Content-Length: {}", body.len()))?;
        }
        t.send_header_line("Connection: close")?;
        t.send_header_line("")?;
        if let Some(body) = body {
            t.send_bytes(body)?;
        }

        let mut raw = Vec::new();
        t.read_available(self.response_timeout, &mut raw)?;
        parse_http(&raw)
    }
}

/// Path for logging; the token never appears in logs.
fn redact(path_and_query: &str) -> &str {
    path_and_query.split('?').next().unwrap_or(path_and_query)
}

impl<T: UplinkTransport> MessagingPort for BotClient<T> {
    fn send_message(&mut self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        let body = serde_json::to_vec(&SendMessage { chat_id, text })
            .map_err(|_| TransportError::Malformed)?;
        self.request("POST", "sendMessage", Some(&body))?;
        debug!("Bot: message sent to {}", chat_id);
        Ok(())
    }

    fn get_updates(&mut self, since: i64) -> Result<Vec<Update>, TransportError> {
        let query = format!("getUpdates?offset={since}&limit={UPDATES_PAGE}&timeout=0");
        let response = self.request("GET", &query, None)?;
        parse_updates(&response.body)
    }
}
