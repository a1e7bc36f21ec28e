//! Broker event queue.
//!
//! The MQTT client delivers its callbacks on its own task.  Those
//! callbacks never touch controller state: they translate what happened
//! into a [`BrokerEvent`] and push it here.  The control loop drains the
//! queue once per tick, before sampling inputs.
//!
//! ```text
//! ┌──────────────┐  BrokerEvent  ┌──────────────┐
//! │ MQTT client  │──────────────▶│ Control loop │
//! │ task (cb)    │  try_send     │ drain / tick │
//! └──────────────┘               └──────────────┘
//! ```
//!
//! Uses an `embassy-sync` bounded channel in a static so the callback
//! can reach it without heap allocation.  Both ends are non-blocking; a
//! full queue drops the newest event and counts it.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::app::commands::AppCommand;

/// Channel depth.  At 50 Hz draining this absorbs a burst of 8 events
/// arriving within one tick.
pub const BROKER_EVENT_DEPTH: usize = 8;

/// Something the broker client reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerEvent {
    /// Session established (or re-established by the client itself).
    Connected,
    /// Session lost.
    Disconnected,
    /// A well-formed command arrived on the command topic.
    Command(AppCommand),
    /// The broker acknowledged a QoS 1 message.
    Published(u32),
}

static BROKER_EVENTS: Channel<CriticalSectionRawMutex, BrokerEvent, BROKER_EVENT_DEPTH> =
    Channel::new();

static DROPPED: AtomicU32 = AtomicU32::new(0);

/// Push an event into the queue.  Never blocks.
/// Returns `false` if the queue is full (event dropped).
pub fn push_event(event: BrokerEvent) -> bool {
    if BROKER_EVENTS.try_send(event).is_ok() {
        return true;
    }
    DROPPED.fetch_add(1, Ordering::Relaxed);
    false
}

/// Drain all pending events into a callback, in FIFO order.
pub fn drain_events(mut handler: impl FnMut(BrokerEvent)) {
    while let Ok(event) = BROKER_EVENTS.try_receive() {
        handler(event);
    }
}

/// Events dropped because the queue was full.
pub fn dropped_events() -> u32 {
    DROPPED.load(Ordering::Relaxed)
}
