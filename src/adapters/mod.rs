//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements       | Connects to                 |
//! |------------|------------------|-----------------------------|
//! | `hardware` | InputPort        | ESP32 ADC, GPIO             |
//! |            | ActuatorPort     | ESP32 LEDC, GPIO            |
//! | `log_sink` | EventSink        | Serial log output           |
//! | `mqtt`     | PublishPort      | ESP-IDF MQTT client         |
//! | `wifi`     | (startup only)   | ESP-IDF WiFi STA            |

pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub(super) mod utils;
pub mod wifi;
