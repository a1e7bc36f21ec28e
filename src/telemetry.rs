//! Telemetry publisher.
//!
//! Every `publish_interval_ticks` control ticks the publisher takes a
//! [`TelemetrySnapshot`] from the service, encodes it as a small JSON
//! object and hands it to the [`PublishPort`]:
//!
//! ```json
//! {"status":"RUNNING","temp":27.31,"current":1.42,"speed":40}
//! ```
//!
//! Cadence is counted in ticks, not wall time.  A refused publish is
//! logged, counted and reported as [`AppEvent::PublishFailed`]; the
//! snapshot is dropped and the next attempt waits for the next interval.

use log::{debug, warn};
use serde::Serialize;

use crate::app::events::{AppEvent, RunStatus, TelemetrySnapshot};
use crate::app::ports::{EventSink, PublishPort};
use crate::app::service::AppService;
use crate::config::SystemConfig;
use crate::error::CommsError;

/// Encoded payload capacity.  The four-field object is well under this.
pub const PAYLOAD_CAPACITY: usize = 128;

pub type Payload = heapless::Vec<u8, PAYLOAD_CAPACITY>;

#[derive(Serialize)]
struct WirePayload {
    status: RunStatus,
    temp: f32,
    current: f32,
    speed: u32,
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Encode a snapshot into the wire JSON.  Floats carry two decimals.
pub fn encode_payload(snapshot: &TelemetrySnapshot) -> Result<Payload, CommsError> {
    let wire = WirePayload {
        status: snapshot.status,
        temp: round2(snapshot.temperature_c),
        current: round2(snapshot.current_a),
        speed: if snapshot.status == RunStatus::Running {
            snapshot.speed
        } else {
            0
        },
    };
    let bytes = serde_json::to_vec(&wire).map_err(|_| CommsError::PayloadTooLarge)?;
    Payload::from_slice(&bytes).map_err(|()| CommsError::PayloadTooLarge)
}

pub struct TelemetryPublisher {
    topic: heapless::String<32>,
    interval_ticks: u32,
    ticks_since_publish: u32,
    published: u32,
    failed: u32,
}

impl TelemetryPublisher {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            topic: config.telemetry_topic.clone(),
            interval_ticks: config.publish_interval_ticks.max(1),
            ticks_since_publish: 0,
            published: 0,
            failed: 0,
        }
    }

    /// Count one control tick; publish when the interval is reached.
    ///
    /// Returns `true` if a publish was attempted this tick.
    pub fn tick(
        &mut self,
        app: &AppService,
        port: &mut impl PublishPort,
        sink: &mut impl EventSink,
    ) -> bool {
        self.ticks_since_publish += 1;
        if self.ticks_since_publish < self.interval_ticks {
            return false;
        }
        self.ticks_since_publish = 0;

        let snapshot = app.telemetry_snapshot();
        match encode_payload(&snapshot).and_then(|p| port.publish(&self.topic, &p)) {
            Ok(()) => {
                self.published = self.published.wrapping_add(1);
                debug!("telemetry #{} -> {}", self.published, self.topic);
                sink.emit(&AppEvent::Telemetry(snapshot));
            }
            Err(e) => {
                self.failed = self.failed.wrapping_add(1);
                warn!("telemetry publish failed ({}), {} dropped so far", e, self.failed);
                sink.emit(&AppEvent::PublishFailed(e));
            }
        }
        true
    }

    pub fn published(&self) -> u32 {
        self.published
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }
}
