//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements                      | Connects to              |
//! |--------------|---------------------------------|--------------------------|
//! | `hardware`   | InputPort, IndicatorSink,       | GPIO via embedded-hal    |
//! |              | IlluminationPort                |                          |
//! | `camera`     | CameraPort                      | esp32-camera / synthetic |
//! | `tls_client` | UplinkTransport                 | ESP-TLS / TcpStream      |
//! | `bot`        | MessagingPort                   | Bot HTTP API             |
//! | `gps`        | LocationSource, FixDecoder      | UART NMEA receiver       |
//! | `time`       | TimePort                        | ESP32 system timer       |
//! | `log_sink`   | EventSink                       | Serial log output        |
//! | `wifi`       | —                               | ESP-IDF WiFi STA         |

pub mod bot;
pub mod camera;
pub mod gps;
pub mod hardware;
pub mod log_sink;
pub mod time;
pub mod tls_client;
pub mod wifi;
