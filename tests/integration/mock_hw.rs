//! Mock adapters for integration tests.
//!
//! `MockHardware` serves scripted inputs and records every actuator call
//! so tests can assert on the full command history without touching the
//! GPIO/LEDC sim store.  `MockBroker` records publishes and can be told
//! to refuse them.  `RecordingSink` keeps every emitted event.

use sweepguard::app::events::AppEvent;
use sweepguard::app::ports::{
    ActuatorPort, AnalogChannel, ButtonId, EventSink, Indicator, InputPort, PublishPort,
};
use sweepguard::error::{CommsError, SensorError};

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Indicator(Indicator, bool),
    Position(u32),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub start: bool,
    pub stop: bool,
    pub pot: Result<u16, SensorError>,
    pub calls: Vec<ActuatorCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            start: false,
            stop: false,
            pot: Ok(0),
            calls: Vec::new(),
        }
    }

    pub fn release_buttons(&mut self) {
        self.start = false;
        self.stop = false;
    }

    pub fn positions(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Position(p) => Some(*p),
                ActuatorCall::Indicator(..) => None,
            })
            .collect()
    }

    pub fn last_position(&self) -> Option<u32> {
        self.positions().last().copied()
    }

    pub fn indicator_on(&self, id: Indicator) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Indicator(i, on) if *i == id => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl InputPort for MockHardware {
    fn read_button(&mut self, id: ButtonId) -> bool {
        match id {
            ButtonId::Start => self.start,
            ButtonId::Stop => self.stop,
        }
    }

    fn read_analog(&mut self, _channel: AnalogChannel) -> Result<u16, SensorError> {
        self.pot
    }
}

impl ActuatorPort for MockHardware {
    fn set_indicator(&mut self, id: Indicator, on: bool) {
        self.calls.push(ActuatorCall::Indicator(id, on));
    }

    fn set_actuator_position(&mut self, pulse_us: u32) {
        self.calls.push(ActuatorCall::Position(pulse_us));
    }
}

// ── MockBroker ────────────────────────────────────────────────

pub struct MockBroker {
    pub published: Vec<(String, Vec<u8>)>,
    pub fail_with: Option<CommsError>,
}

#[allow(dead_code)]
impl MockBroker {
    pub fn new() -> Self {
        Self {
            published: Vec::new(),
            fail_with: None,
        }
    }

    pub fn last_json(&self) -> Option<serde_json::Value> {
        self.published
            .last()
            .map(|(_, p)| serde_json::from_slice(p).expect("payload is JSON"))
    }
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishPort for MockBroker {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if let Some(e) = self.fail_with {
            return Err(e);
        }
        self.published.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
