//! Overload safety supervisor.
//!
//! The supervisor runs **every tick after the actuator has been driven**
//! and accumulates a latched fault bitmask.  When a bit is newly set the
//! caller forces the FSM into `Fault`, whose `on_enter` zeroes the servo.
//!
//! ## Fault lifecycle
//!
//! 1. Temperature and current both reach their limits (AND, not OR).
//! 2. The supervisor sets the `Overload` bit and logs it.
//! 3. The bit stays set however far the readings later fall.
//! 4. Only an operator Stop calls [`SafetySupervisor::reset`].
//!
//! A single elevated reading never trips: a current spike without heat
//! build-up, or a hot motor drawing little current, is tolerated.

use crate::config::SystemConfig;
use crate::error::SafetyFault;
use crate::fsm::context::ControllerState;
use log::{error, info};

/// Safety supervisor.
pub struct SafetySupervisor {
    fault_temp_c: f32,
    fault_current_a: f32,
    /// Latched fault bitmask.
    faults: u8,
    /// Number of times the interlock has tripped since boot.
    trips: u32,
}

impl SafetySupervisor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            fault_temp_c: config.fault_temp_c,
            fault_current_a: config.fault_current_a,
            faults: 0,
            trips: 0,
        }
    }

    /// Whether the given readings constitute an overload.
    pub fn is_overloaded(&self, temperature_c: f32, current_a: f32) -> bool {
        temperature_c >= self.fault_temp_c && current_a >= self.fault_current_a
    }

    /// Evaluate the interlock against this tick's simulated readings.
    /// Returns `true` only on the tick a fault bit is newly latched.
    pub fn evaluate(&mut self, state: &ControllerState) -> bool {
        if !self.is_overloaded(state.temperature_c, state.current_a) {
            return false;
        }
        self.latch(SafetyFault::Overload, state)
    }

    /// Clear every latched fault.  Called on operator Stop only.
    pub fn reset(&mut self) {
        if self.faults != 0 {
            info!("SAFETY FAULT CLEARED by operator (was 0b{:08b})", self.faults);
        }
        self.faults = 0;
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// True if **any** fault is latched.
    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    /// Check if a specific fault is latched.
    pub fn has_fault(&self, fault: SafetyFault) -> bool {
        self.faults & fault.mask() != 0
    }

    pub fn trip_count(&self) -> u32 {
        self.trips
    }

    // ── Internal ──────────────────────────────────────────────────

    fn latch(&mut self, fault: SafetyFault, state: &ControllerState) -> bool {
        if self.faults & fault.mask() != 0 {
            return false;
        }
        self.faults |= fault.mask();
        self.trips = self.trips.saturating_add(1);
        error!(
            "SAFETY FAULT SET: {fault} (temp={:.2}C current={:.2}A)",
            state.temperature_c, state.current_a
        );
        true
    }
}
