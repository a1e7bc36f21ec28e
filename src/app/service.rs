//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the FSM, safety supervisor, plant model and shared
//! context.  It exposes a clean, hardware-agnostic API.  All I/O flows
//! through port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!    InputPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                  │        AppService         │
//! ActuatorPort ◀── │ FSM · Model · Sweep · Safety │
//!                  └──────────────────────────┘
//! ```
//!
//! ## Tick order
//!
//! 1. Start / Stop (FSM `on_update`; Stop wins when both are held)
//! 2. Speed from the potentiometer
//! 3. Plant model advance (temperature, then current)
//! 4. Sweep position update and servo drive, only while running
//! 5. Overload evaluation; a trip forces `Fault` and zeroes the servo

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::control::mapping::map_value;
use crate::control::sweep::advance_pulse;
use crate::error;
use crate::fsm::context::{ControllerState, FsmContext, InputSample, ServoCommand};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::safety::SafetySupervisor;
use crate::sensors::PhysicalModel;

use super::commands::AppCommand;
use super::events::{AppEvent, RunStatus, TelemetrySnapshot};
use super::ports::{ActuatorPort, AnalogChannel, ButtonId, EventSink, Indicator, InputPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    safety: SafetySupervisor,
    model: PhysicalModel,
    /// Indicator levels last written to the port (`None` = never written).
    applied_run_led: Option<bool>,
    applied_fault_led: Option<bool>,
    /// Last good potentiometer reading, reused when a read fails.
    last_pot_raw: u16,
    pot_degraded: bool,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM — call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> error::Result<Self> {
        let model = PhysicalModel::new(&config);
        Self::with_model(config, model)
    }

    /// Construct with an explicit plant model (deterministic jitter in tests).
    pub fn with_model(config: SystemConfig, model: PhysicalModel) -> error::Result<Self> {
        config.validate()?;
        let safety = SafetySupervisor::new(&config);
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Stopped);

        Ok(Self {
            fsm,
            ctx,
            safety,
            model,
            applied_run_led: None,
            applied_fault_led: None,
            last_pot_raw: 0,
            pot_degraded: false,
            tick_count: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in `Stopped` and sync the indicators.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        self.apply_actuators(hw);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {:?}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Sample inputs and run one full control cycle.
    ///
    /// The `hw` parameter satisfies **both** [`InputPort`] and
    /// [`ActuatorPort`]; this avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(&mut self, hw: &mut (impl InputPort + ActuatorPort), sink: &mut impl EventSink) {
        let sample = self.sample_inputs(hw, sink);
        self.step(sample, hw, sink);
    }

    /// Run one control cycle against an already-sampled input.
    pub fn step(&mut self, input: InputSample, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.tick_count += 1;
        self.ctx.input = input;
        self.ctx.commands.servo = ServoCommand::Hold;

        // 1. Operator transitions
        if let Some((from, to)) = self.fsm.tick(&mut self.ctx) {
            self.on_transition(from, to, sink);
        }
        if self.fsm.current_state() == StateId::Fault && self.ctx.start_edge() {
            sink.emit(&AppEvent::StartIgnored);
        }

        // 2. Speed
        let cfg = &self.ctx.config;
        self.ctx.speed = map_value(
            i32::from(input.pot_raw.min(cfg.adc_max)),
            0,
            i32::from(cfg.adc_max),
            cfg.min_step as i32,
            cfg.max_step as i32,
        ) as u32;

        // 3. Plant model
        let active = self.ctx.state.is_active();
        self.model.advance(&mut self.ctx.state, self.ctx.speed, active);

        // 4. Sweep + drive
        if active {
            let (pulse, direction) = advance_pulse(
                self.ctx.state.pulse_us,
                self.ctx.state.direction,
                self.ctx.speed,
                self.ctx.config.min_pulse_us,
                self.ctx.config.max_pulse_us,
            );
            self.ctx.state.pulse_us = pulse;
            self.ctx.state.direction = direction;
            self.ctx.commands.servo = ServoCommand::Drive(pulse);
        }
        self.apply_actuators(hw);

        // 5. Overload interlock
        if self.safety.evaluate(&self.ctx.state) {
            self.ctx.fault_flags = self.safety.faults();
            let from = self.fsm.current_state();
            if self.fsm.force_transition(StateId::Fault, &mut self.ctx) {
                sink.emit(&AppEvent::StateChanged { from, to: StateId::Fault });
            }
            sink.emit(&AppEvent::FaultTripped {
                temperature_c: self.ctx.state.temperature_c,
                current_a: self.ctx.state.current_a,
            });
            self.apply_actuators(hw);
        }

        self.ctx.prev_input = input;
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply a remote command with button semantics.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        let from = self.fsm.current_state();
        let target = match (cmd, from) {
            (AppCommand::Start, StateId::Fault) => {
                sink.emit(&AppEvent::StartIgnored);
                return;
            }
            (AppCommand::Start, _) => StateId::Running,
            (AppCommand::Stop, _) => StateId::Stopped,
        };

        if self.fsm.force_transition(target, &mut self.ctx) {
            self.on_transition(from, target, sink);
        } else {
            debug!("remote {} while already {:?}", cmd.as_str(), from);
        }
        sink.emit(&AppEvent::CommandApplied(cmd));
        self.apply_actuators(hw);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current context.
    pub fn telemetry_snapshot(&self) -> TelemetrySnapshot {
        let running = self.ctx.state.running;
        TelemetrySnapshot {
            status: if running { RunStatus::Running } else { RunStatus::Stopped },
            temperature_c: self.ctx.state.temperature_c,
            current_a: self.ctx.state.current_a,
            speed: if running { self.ctx.speed } else { 0 },
            fault_flags: self.ctx.fault_flags,
        }
    }

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// The controller state carried between ticks.
    pub fn controller_state(&self) -> &ControllerState {
        &self.ctx.state
    }

    /// Speed computed on the most recent tick (regardless of run state).
    pub fn speed(&self) -> u32 {
        self.ctx.speed
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Latched fault bitmask (0 = clear).
    pub fn fault_flags(&self) -> u8 {
        self.ctx.fault_flags
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn sample_inputs(&mut self, hw: &mut impl InputPort, sink: &mut impl EventSink) -> InputSample {
        let start_pressed = hw.read_button(ButtonId::Start);
        let stop_pressed = hw.read_button(ButtonId::Stop);

        match hw.read_analog(AnalogChannel::SpeedPot) {
            Ok(raw) => {
                if self.pot_degraded {
                    info!("speed pot readings recovered");
                    self.pot_degraded = false;
                }
                self.last_pot_raw = raw.min(self.ctx.config.adc_max);
            }
            Err(e) => {
                if !self.pot_degraded {
                    warn!("speed pot read failed ({e}), holding last value {}", self.last_pot_raw);
                    sink.emit(&AppEvent::InputDegraded(e));
                    self.pot_degraded = true;
                }
            }
        }

        InputSample {
            start_pressed,
            stop_pressed,
            pot_raw: self.last_pot_raw,
        }
    }

    fn on_transition(&mut self, from: StateId, to: StateId, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::StateChanged { from, to });
        if to == StateId::Stopped && self.safety.has_faults() {
            self.safety.reset();
            self.ctx.fault_flags = 0;
            sink.emit(&AppEvent::FaultCleared);
        }
    }

    /// Translate FSM actuator commands into port calls.
    ///
    /// The servo command is consumed; indicators are written only when
    /// their level changes.
    fn apply_actuators(&mut self, hw: &mut impl ActuatorPort) {
        match core::mem::take(&mut self.ctx.commands.servo) {
            ServoCommand::Hold => {}
            ServoCommand::Drive(pulse_us) => hw.set_actuator_position(pulse_us),
            ServoCommand::Off => hw.set_actuator_position(0),
        }

        let run = self.ctx.commands.run_led;
        if self.applied_run_led != Some(run) {
            hw.set_indicator(Indicator::Run, run);
            self.applied_run_led = Some(run);
        }
        let fault = self.ctx.commands.fault_led;
        if self.applied_fault_led != Some(fault) {
            hw.set_indicator(Indicator::Fault, fault);
            self.applied_fault_led = Some(fault);
        }
    }
}
