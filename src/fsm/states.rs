//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  STOPPED ──[start]──▶ RUNNING
//!     ▲                    │
//!     └──────[stop]────────┘
//!
//!  Any state ──[overload]──▶ FAULT ──[stop]──▶ STOPPED
//!                            (start ignored)
//! ```
//!
//! The `on_enter` handlers are the only writers of `running` and
//! `fault_latched`, which keeps the two flags consistent with the
//! current state by construction.

use super::context::{FsmContext, ServoCommand};
use super::{StateDescriptor, StateId};
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Stopped
        StateDescriptor {
            id: StateId::Stopped,
            name: "Stopped",
            on_enter: Some(stopped_enter),
            on_exit: None,
            on_update: stopped_update,
        },
        // Index 1 — Running
        StateDescriptor {
            id: StateId::Running,
            name: "Running",
            on_enter: Some(running_enter),
            on_exit: Some(running_exit),
            on_update: running_update,
        },
        // Index 2 — Fault
        StateDescriptor {
            id: StateId::Fault,
            name: "Fault",
            on_enter: Some(fault_enter),
            on_exit: Some(fault_exit),
            on_update: fault_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  STOPPED
// ═══════════════════════════════════════════════════════════════════════════

fn stopped_enter(ctx: &mut FsmContext) {
    // Servo keeps its last pulse (or stays at 0 after a fault).
    ctx.state.running = false;
    ctx.state.fault_latched = false;
    ctx.commands.run_led = false;
    ctx.commands.fault_led = false;
    info!("STOPPED: servo parked at {} us", ctx.state.pulse_us);
}

fn stopped_update(ctx: &mut FsmContext) -> Option<StateId> {
    // Stop is evaluated after Start within a tick, so holding both
    // leaves the controller stopped.
    if ctx.input.start_pressed && !ctx.input.stop_pressed {
        return Some(StateId::Running);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUNNING — sweeping between the pulse bounds
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter(ctx: &mut FsmContext) {
    ctx.state.running = true;
    ctx.commands.run_led = true;
    info!(
        "RUNNING: sweep from {} us, step {}",
        ctx.state.pulse_us, ctx.speed
    );
}

fn running_exit(ctx: &mut FsmContext) {
    info!(
        "RUNNING: sweep halted after {} ticks at {} us",
        ctx.ticks_in_state, ctx.state.pulse_us
    );
}

fn running_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.input.stop_pressed {
        return Some(StateId::Stopped);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  FAULT — overload latched, output zeroed
// ═══════════════════════════════════════════════════════════════════════════

fn fault_enter(ctx: &mut FsmContext) {
    ctx.state.running = false;
    ctx.state.fault_latched = true;
    ctx.commands.servo = ServoCommand::Off;
    ctx.commands.run_led = false;
    ctx.commands.fault_led = true;
    warn!(
        "FAULT: servo output zeroed, fault_flags=0b{:08b}",
        ctx.fault_flags
    );
}

fn fault_exit(_ctx: &mut FsmContext) {
    info!("FAULT: cleared by operator stop");
}

fn fault_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.input.stop_pressed {
        return Some(StateId::Stopped);
    }
    // A start press here is reported by the service as StartIgnored.
    None
}
