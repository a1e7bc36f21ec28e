//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Telemetry lines go out at `debug` since the broker already carries
//! them; everything the operator needs to see is `info` or louder.
//! Each event produces exactly one line, at [`severity`].

use log::{log, Level};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// Log level for an event.
pub fn severity(event: &AppEvent) -> Level {
    match event {
        AppEvent::Telemetry(_) => Level::Debug,
        AppEvent::FaultTripped { .. } => Level::Error,
        AppEvent::StartIgnored | AppEvent::PublishFailed(_) | AppEvent::InputDegraded(_) => {
            Level::Warn
        }
        AppEvent::StateChanged { .. }
        | AppEvent::FaultCleared
        | AppEvent::CommandApplied(_)
        | AppEvent::Started(_) => Level::Info,
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        let level = severity(event);
        match event {
            AppEvent::Telemetry(t) => {
                log!(
                    level,
                    "TELEM | {} | T={:.2}\u{00b0}C | I={:.2}A | speed={} | faults=0b{:08b}",
                    t.status.as_str(),
                    t.temperature_c,
                    t.current_a,
                    t.speed,
                    t.fault_flags,
                );
            }
            AppEvent::StateChanged { from, to } => {
                log!(level, "STATE | {} -> {}", from.name(), to.name());
            }
            AppEvent::FaultTripped {
                temperature_c,
                current_a,
            } => {
                log!(
                    level,
                    "FAULT | overload latched at T={:.2}\u{00b0}C I={:.2}A, press STOP to reset",
                    temperature_c,
                    current_a
                );
            }
            AppEvent::FaultCleared => {
                log!(level, "FAULT | cleared by STOP");
            }
            AppEvent::StartIgnored => {
                log!(level, "START | ignored while overload is latched, STOP to reset");
            }
            AppEvent::CommandApplied(cmd) => {
                log!(level, "CMD   | remote {}", cmd.as_str());
            }
            AppEvent::PublishFailed(e) => {
                log!(level, "MQTT  | telemetry dropped: {}", e);
            }
            AppEvent::InputDegraded(e) => {
                log!(level, "INPUT | {}", e);
            }
            AppEvent::Started(state) => {
                log!(level, "START | initial_state={}", state.name());
            }
        }
    }
}
