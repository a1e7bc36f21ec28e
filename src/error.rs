//! Unified error types for the SweepGuard firmware.
//!
//! [`Error`] covers what can stop the firmware from booting: peripheral
//! init, configuration, and the broker client.  `main` lifts it into
//! `anyhow` with `?`.
//!
//! The per-subsystem enums are `Copy` so they pass through the ports and
//! the supervisor without allocation.  Nothing raised per tick is fatal;
//! it is logged and the tick degrades (stale input, skipped telemetry).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Startup failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The broker client could not be created.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<crate::config::ConfigError> for Error {
    fn from(e: crate::config::ConfigError) -> Self {
        match e {
            crate::config::ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error or timed out.
    AdcReadFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Safety faults
// ---------------------------------------------------------------------------

/// Safety faults are not errors in the usual sense: tripping one is a
/// designed transition into the latched `Fault` state.  They are kept in a
/// bitfield so the supervisor can report what tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SafetyFault {
    /// Temperature and current both at or above their limits.
    Overload = 0b0000_0001,
}

impl SafetyFault {
    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SafetyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overload => write!(f, "thermal + electrical overload"),
        }
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// Client creation failed or a topic name was rejected.
    MqttConnectFailed,
    /// No broker session is up.
    NotConnected,
    /// The client refused to queue the message.
    MqttPublishFailed,
    /// Payload did not fit the serialisation buffer.
    PayloadTooLarge,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MqttConnectFailed => write!(f, "MQTT connect failed"),
            Self::NotConnected => write!(f, "broker not connected"),
            Self::MqttPublishFailed => write!(f, "MQTT publish failed"),
            Self::PayloadTooLarge => write!(f, "payload too large"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comms_error_converts_into_error() {
        let e: Error = CommsError::MqttConnectFailed.into();
        assert_eq!(e, Error::Comms(CommsError::MqttConnectFailed));
    }

    #[test]
    fn config_error_maps_to_config_variant() {
        let e: Error = crate::config::ConfigError::ValidationFailed("x").into();
        assert_eq!(e, Error::Config("x"));
    }

    #[test]
    fn display_prefixes_subsystem() {
        let e = Error::Comms(CommsError::MqttConnectFailed);
        assert_eq!(format!("{e}"), "comms: MQTT connect failed");
        assert_eq!(format!("{}", Error::Init("LEDC")), "init: LEDC");
    }

    #[test]
    fn lifts_into_anyhow() {
        fn boot() -> anyhow::Result<()> {
            Err(Error::Init("ADC1"))?
        }
        assert_eq!(boot().unwrap_err().to_string(), "init: ADC1");
    }
}
