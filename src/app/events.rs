//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) and the control loop
//! emit these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them.

use serde::Serialize;

use crate::app::commands::AppCommand;
use crate::error::{CommsError, SensorError};
use crate::fsm::StateId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Snapshot handed to the publish port.
    Telemetry(TelemetrySnapshot),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// The overload interlock latched.
    FaultTripped { temperature_c: f32, current_a: f32 },

    /// An operator Stop cleared the latch.
    FaultCleared,

    /// Start was requested while the latch was set.
    StartIgnored,

    /// A remote command was accepted and applied.
    CommandApplied(AppCommand),

    /// The publish port refused a telemetry message.
    PublishFailed(CommsError),

    /// The potentiometer read failed; the previous value is reused.
    InputDegraded(SensorError),

    /// The application service has started (carries initial state).
    Started(StateId),
}

/// Reported run status.  A latched fault reports `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Stopped,
}

impl RunStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Stopped => "STOPPED",
        }
    }
}

/// Read-only view of the controller at publish time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySnapshot {
    pub status: RunStatus,
    pub temperature_c: f32,
    pub current_a: f32,
    /// Pulse step per tick; `0` whenever not running.
    pub speed: u32,
    /// Latched fault bitmask (log only, not published).
    pub fault_flags: u8,
}
