//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (inputs, actuators, the broker client, event sinks)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! and [`ControlLoop`](crate::control_loop::ControlLoop) consume them via
//! generics, so the domain core never touches hardware directly.
//!
//! Every call made through these ports from the control loop must return
//! promptly: the loop has a fixed 20 ms budget and nothing here may block
//! on the network.

use crate::error::{CommsError, SensorError};

// ───────────────────────────────────────────────────────────────
// Identifiers
// ───────────────────────────────────────────────────────────────

/// Operator push-buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    Start,
    Stop,
}

/// Analog inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalogChannel {
    SpeedPot,
}

/// Status LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Green: sweep running.
    Run,
    /// Red: overload latched.
    Fault,
    /// Yellow: broker session up.
    Link,
}

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: polled once per tick.
pub trait InputPort {
    /// `true` while the button is held.
    fn read_button(&mut self, id: ButtonId) -> bool;

    /// Raw reading in `0..=adc_max`.
    fn read_analog(&mut self, channel: AnalogChannel) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command outputs.
pub trait ActuatorPort {
    fn set_indicator(&mut self, id: Indicator, on: bool);

    /// Command the servo to `pulse_us`.  `0` disables the output.
    fn set_actuator_position(&mut self, pulse_us: u32);
}

// ───────────────────────────────────────────────────────────────
// Broker ports (driven adapter: domain → remote channel)
// ───────────────────────────────────────────────────────────────

/// Outbound telemetry.
///
/// Implementations hand the message off and return; delivery happens
/// asynchronously.  An error means the message was dropped.
pub trait PublishPort {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
