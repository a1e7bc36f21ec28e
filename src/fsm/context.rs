//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It contains the controller state owned by the control loop,
//! the inputs sampled this tick, the actuator commands the handlers
//! request, and configuration.  Think of it as the "blackboard" in a
//! blackboard architecture.

use crate::config::SystemConfig;

// ---------------------------------------------------------------------------
// Controller state (lives for the whole process, mutated once per tick)
// ---------------------------------------------------------------------------

/// Sweep direction along the pulse axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Pulse width increasing.
    Up,
    /// Pulse width decreasing.
    Down,
}

impl Direction {
    /// `+1` / `-1` multiplier for the per-tick step.
    pub const fn sign(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// Everything the sweep controller carries from one tick to the next.
///
/// Invariants: `min_pulse_us <= pulse_us <= max_pulse_us`, and
/// `fault_latched` implies `!running`.  The FSM `on_enter` handlers are
/// the only writers of the two flags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerState {
    pub running: bool,
    pub fault_latched: bool,
    /// Last commanded servo pulse width (µs).
    pub pulse_us: u32,
    pub direction: Direction,
    /// Simulated motor temperature (°C).
    pub temperature_c: f32,
    /// Simulated current draw (A).
    pub current_a: f32,
}

impl ControllerState {
    /// Power-on state: parked at the lower pulse bound, ambient, no load.
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            running: false,
            fault_latched: false,
            pulse_us: config.min_pulse_us,
            direction: Direction::Up,
            temperature_c: config.ambient_temp_c,
            current_a: 0.0,
        }
    }

    /// Whether the servo is being swept this tick.
    pub fn is_active(&self) -> bool {
        self.running && !self.fault_latched
    }
}

// ---------------------------------------------------------------------------
// Inputs (sampled fresh every tick, never retained beyond the next one)
// ---------------------------------------------------------------------------

/// One tick's worth of operator input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSample {
    pub start_pressed: bool,
    pub stop_pressed: bool,
    /// Raw potentiometer reading, `0..=adc_max`.
    pub pot_raw: u16,
}

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; applied by the service)
// ---------------------------------------------------------------------------

/// What the servo output should do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServoCommand {
    /// Leave the last commanded position untouched.
    #[default]
    Hold,
    /// Drive to this pulse width (µs).
    Drive(u32),
    /// Zero the PWM output.
    Off,
}

/// Commands that state handlers write to request actuator actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorCommands {
    pub servo: ServoCommand,
    /// Green "running" indicator.
    pub run_led: bool,
    /// Red "fault latched" indicator.
    pub fault_led: bool,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,

    // -- Controller --
    pub state: ControllerState,
    /// Speed (pulse step per tick) computed from this tick's pot reading.
    pub speed: u32,

    // -- Inputs --
    pub input: InputSample,
    /// Previous tick's inputs, for press-edge detection in logs.
    pub prev_input: InputSample,

    // -- Actuator outputs --
    pub commands: ActuatorCommands,

    // -- Configuration --
    pub config: SystemConfig,

    // -- Safety --
    /// Latched safety fault bitmask (see `SafetyFault::mask()`).
    pub fault_flags: u8,
}

impl FsmContext {
    /// Create a new context with the given configuration.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            state: ControllerState::new(&config),
            speed: config.min_step,
            input: InputSample::default(),
            prev_input: InputSample::default(),
            commands: ActuatorCommands::default(),
            config,
            fault_flags: 0,
        }
    }

    /// True on the first tick Start is seen held.
    pub fn start_edge(&self) -> bool {
        self.input.start_pressed && !self.prev_input.start_pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_state() {
        let cfg = SystemConfig::default();
        let s = ControllerState::new(&cfg);
        assert!(!s.running);
        assert!(!s.fault_latched);
        assert_eq!(s.pulse_us, cfg.min_pulse_us);
        assert_eq!(s.direction, Direction::Up);
        assert!((s.temperature_c - cfg.ambient_temp_c).abs() < f32::EPSILON);
        assert!(s.current_a.abs() < f32::EPSILON);
    }

    #[test]
    fn active_requires_running_and_no_fault() {
        let mut s = ControllerState::new(&SystemConfig::default());
        assert!(!s.is_active());
        s.running = true;
        assert!(s.is_active());
        s.fault_latched = true;
        assert!(!s.is_active());
    }

    #[test]
    fn start_edge_only_on_first_tick() {
        let mut ctx = FsmContext::new(SystemConfig::default());
        ctx.input.start_pressed = true;
        assert!(ctx.start_edge());
        ctx.prev_input = ctx.input;
        assert!(!ctx.start_edge());
    }
}
