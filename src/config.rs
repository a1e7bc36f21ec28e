//! System configuration parameters
//!
//! All tunable parameters for the SweepGuard controller: servo pulse
//! bounds, sweep step range, ADC span, fault thresholds, the simulated
//! thermal/load model, loop timing and the telemetry channel.
//! Fixed at build time and immutable once the control loop starts.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Broker URL used when `SWEEPGUARD_BROKER_URL` is not set at build time.
pub const DEFAULT_BROKER_URL: &str = "mqtt://test.mosquitto.org:1883";

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Servo ---
    /// Pulse width at one end of travel (0°), microseconds
    pub min_pulse_us: u32,
    /// Pulse width at the other end of travel (180°), microseconds
    pub max_pulse_us: u32,

    // --- Speed ---
    /// Pulse increment per tick with the potentiometer at its minimum
    pub min_step: u32,
    /// Pulse increment per tick with the potentiometer at its maximum
    pub max_step: u32,
    /// Full-scale raw ADC reading (12-bit)
    pub adc_max: u16,

    // --- Safety ---
    /// Temperature (Celsius) at or above which the overload check arms
    pub fault_temp_c: f32,
    /// Current draw (Amps) at or above which the overload check arms
    pub fault_current_a: f32,

    // --- Simulated plant ---
    /// Resting temperature the model cools towards (Celsius)
    pub ambient_temp_c: f32,
    /// Heat added per tick per 100 units of speed
    pub heat_gain_coef: f32,
    /// Fraction of the above-ambient delta lost per tick while running
    pub heat_loss_coef: f32,
    /// Per-tick linear cool-down while stopped (Celsius)
    pub cooling_step_c: f32,
    /// Current drawn by the running servo at zero load (Amps)
    pub base_current_a: f32,
    /// Additional current at full speed (Amps)
    pub load_coef: f32,
    /// Upper bound (exclusive) of running-current jitter (Amps)
    pub jitter_max_a: f32,
    /// Current drawn while stopped (Amps)
    pub idle_current_a: f32,
    /// Upper bound (exclusive) of idle-current jitter (Amps)
    pub idle_jitter_max_a: f32,

    // --- Timing ---
    /// Control loop period (milliseconds)
    pub tick_period_ms: u32,
    /// Telemetry cadence, counted in control ticks
    pub publish_interval_ticks: u32,
    /// Task watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,

    // --- Telemetry channel ---
    /// MQTT broker URL
    pub broker_url: heapless::String<64>,
    /// Topic the status snapshot is published to
    pub telemetry_topic: heapless::String<32>,
    /// Topic remote START / STOP commands arrive on
    pub command_topic: heapless::String<32>,
    /// Sustained remote command rate (per second)
    pub command_rate_per_sec: u64,
    /// Remote command burst capacity
    pub command_burst: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Servo (SG90 travel)
            min_pulse_us: 500,
            max_pulse_us: 2400,

            // Speed
            min_step: 5,
            max_step: 80,
            adc_max: 4095,

            // Safety
            fault_temp_c: 34.0,
            fault_current_a: 1.70,

            // Simulated plant
            ambient_temp_c: 25.0,
            heat_gain_coef: 0.12,
            heat_loss_coef: 0.01,
            cooling_step_c: 0.02,
            base_current_a: 0.5,
            load_coef: 1.2,
            jitter_max_a: 0.10,
            idle_current_a: 0.05,
            idle_jitter_max_a: 0.005,

            // Timing
            tick_period_ms: 20,          // 50 Hz
            publish_interval_ticks: 25,  // 0.5 s
            watchdog_timeout_ms: 2_000,

            // Telemetry channel
            broker_url: bounded(option_env!("SWEEPGUARD_BROKER_URL").unwrap_or(DEFAULT_BROKER_URL)),
            telemetry_topic: bounded("device/telemetry"),
            command_topic: bounded("device/commands"),
            command_rate_per_sec: 5,
            command_burst: 5,
        }
    }
}

impl SystemConfig {
    /// Check every invariant the control loop depends on.
    ///
    /// A failure here is a build-time mistake, not a runtime condition:
    /// `main` refuses to enter the loop with an invalid configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_pulse_us >= self.max_pulse_us {
            return Err(ConfigError::ValidationFailed("min_pulse_us must be below max_pulse_us"));
        }
        if self.min_step == 0 || self.min_step > self.max_step {
            return Err(ConfigError::ValidationFailed("step range must satisfy 0 < min_step <= max_step"));
        }
        if self.max_step >= self.max_pulse_us - self.min_pulse_us {
            return Err(ConfigError::ValidationFailed("max_step must be smaller than the pulse span"));
        }
        if self.adc_max == 0 {
            return Err(ConfigError::ValidationFailed("adc_max must be non-zero"));
        }
        if !positive(self.fault_temp_c) || !positive(self.fault_current_a) {
            return Err(ConfigError::ValidationFailed("fault thresholds must be finite and positive"));
        }
        if !self.ambient_temp_c.is_finite() || !positive(self.cooling_step_c) {
            return Err(ConfigError::ValidationFailed("ambient and cooling step must be finite"));
        }
        let coefs = [
            self.heat_gain_coef,
            self.heat_loss_coef,
            self.base_current_a,
            self.load_coef,
            self.jitter_max_a,
            self.idle_current_a,
            self.idle_jitter_max_a,
        ];
        if coefs.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(ConfigError::ValidationFailed("model coefficients must be finite and non-negative"));
        }
        if self.tick_period_ms == 0 || self.publish_interval_ticks == 0 {
            return Err(ConfigError::ValidationFailed("tick period and publish interval must be non-zero"));
        }
        if self.watchdog_timeout_ms <= self.tick_period_ms {
            return Err(ConfigError::ValidationFailed("watchdog timeout must exceed one tick"));
        }
        if self.broker_url.is_empty() || self.telemetry_topic.is_empty() || self.command_topic.is_empty() {
            return Err(ConfigError::ValidationFailed("broker URL and topics must be set"));
        }
        if self.command_rate_per_sec == 0 || self.command_burst == 0 {
            return Err(ConfigError::ValidationFailed("command rate limit must be non-zero"));
        }
        Ok(())
    }

    /// Control loop period in seconds.
    pub fn tick_period_secs(&self) -> f32 {
        self.tick_period_ms as f32 / 1000.0
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

/// Copy a compile-time string into a fixed-capacity buffer, truncating
/// at the capacity.  `validate()` catches the resulting empty string if
/// nothing fits.
fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// Errors from [`SystemConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}
