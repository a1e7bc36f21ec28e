//! MQTT broker adapter.
//!
//! Implements [`PublishPort`] over the ESP-IDF MQTT client.  A dedicated
//! event thread drains the client's connection: it subscribes to the
//! command topic each time a session comes up, translates everything else
//! into [`BrokerEvent`]s for the control loop's queue, and flips the
//! connected flag.  It never touches controller state.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//! - **all other targets**: an in-memory recorder for host-side tests.
//!
//! ## Delivery
//!
//! Publishing uses `enqueue` at QoS 1, which hands the message to the
//! client's outbox and returns immediately.  The control loop only
//! `try_lock`s the shared client; while the event thread holds it for a
//! subscribe, that tick's telemetry is dropped.  The client reconnects on
//! its own after a drop.

use core::time::Duration;
use std::time::Instant;

#[cfg(target_os = "espidf")]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(target_os = "espidf")]
use std::sync::{Arc, Mutex, TryLockError};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    Details, EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
};
use log::{debug, info, warn};

use crate::app::commands::{AppCommand, MAX_COMMAND_LEN};
use crate::app::ports::PublishPort;
use crate::config::SystemConfig;
use crate::error::CommsError;
use crate::events::BrokerEvent;
#[cfg(target_os = "espidf")]
use crate::events::push_event;

use super::utils::is_topic_name;

/// Client identifier presented to the broker.
pub const CLIENT_ID: &str = "sweepguard";

/// Largest telemetry payload the adapter will hand to the client.
pub const MAX_PAYLOAD_LEN: usize = 256;

#[cfg(target_os = "espidf")]
const EVENT_TASK_STACK: usize = 6 * 1024;

const CONNECT_POLL: Duration = Duration::from_millis(50);

/// Translate an inbound message into a queue event.
///
/// Only complete messages on `command_topic` that parse as a command
/// produce an event; everything else is dropped with a log line.
pub fn classify_message(topic: Option<&str>, data: &[u8], command_topic: &str) -> Option<BrokerEvent> {
    if topic != Some(command_topic) {
        debug!("mqtt: ignoring message on {:?}", topic);
        return None;
    }
    match AppCommand::parse(data) {
        Some(cmd) => Some(BrokerEvent::Command(cmd)),
        None => {
            let shown = &data[..data.len().min(MAX_COMMAND_LEN)];
            warn!(
                "mqtt: unrecognised command payload {:?}",
                core::str::from_utf8(shown).unwrap_or("<binary>")
            );
            None
        }
    }
}

fn check_topics(config: &SystemConfig) -> Result<(), CommsError> {
    for topic in [config.telemetry_topic.as_str(), config.command_topic.as_str()] {
        if !is_topic_name(topic) {
            warn!("mqtt: '{}' is not a publishable topic name", topic);
            return Err(CommsError::MqttConnectFailed);
        }
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Event thread (device)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
struct EventWorker {
    client: Arc<Mutex<EspMqttClient<'static>>>,
    connected: Arc<AtomicBool>,
    command_topic: heapless::String<32>,
}

#[cfg(target_os = "espidf")]
impl EventWorker {
    fn run(self, mut connection: EspMqttConnection) {
        loop {
            // The event is released before any client call; the client
            // task waits on it.
            let session_up = match connection.next() {
                Ok(event) => self.dispatch(event.payload()),
                Err(_) => break,
            };
            if session_up {
                self.subscribe_commands();
                push_event(BrokerEvent::Connected);
            }
        }
        info!("mqtt: connection closed, event thread exiting");
    }

    /// Returns `true` when a session just came up.
    fn dispatch(&self, payload: EventPayload<'_, esp_idf_svc::sys::EspError>) -> bool {
        match payload {
            EventPayload::Connected(_) => {
                self.connected.store(true, Ordering::Release);
                return true;
            }
            EventPayload::Disconnected => {
                self.connected.store(false, Ordering::Release);
                push_event(BrokerEvent::Disconnected);
            }
            EventPayload::Published(id) => {
                push_event(BrokerEvent::Published(id));
            }
            EventPayload::Received {
                topic,
                data,
                details: Details::Complete,
                ..
            } => {
                if let Some(ev) = classify_message(topic, data, self.command_topic.as_str()) {
                    push_event(ev);
                }
            }
            EventPayload::Received { .. } => {
                warn!("mqtt: fragmented message dropped");
            }
            EventPayload::Error(e) => {
                warn!("mqtt: client error {:?}", e);
            }
            _ => {}
        }
        false
    }

    fn subscribe_commands(&self) {
        let Ok(mut client) = self.client.lock() else {
            warn!("mqtt: client lock poisoned, not subscribing");
            return;
        };
        match client.subscribe(self.command_topic.as_str(), QoS::AtLeastOnce) {
            Ok(_) => info!("mqtt: subscribed to {}", self.command_topic),
            Err(e) => warn!("mqtt: subscribe {} failed: {}", self.command_topic, e),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

pub struct MqttAdapter {
    #[cfg(target_os = "espidf")]
    client: Arc<Mutex<EspMqttClient<'static>>>,
    #[cfg(target_os = "espidf")]
    connected: Arc<AtomicBool>,

    #[cfg(not(target_os = "espidf"))]
    connected: bool,
    #[cfg(not(target_os = "espidf"))]
    command_topic: heapless::String<32>,
    #[cfg(not(target_os = "espidf"))]
    published: Vec<(String, Vec<u8>)>,
    #[cfg(not(target_os = "espidf"))]
    subscriptions: Vec<String>,

    publish_count: u32,
}

impl MqttAdapter {
    /// Create the client, start its event thread and begin connecting to
    /// `config.broker_url`.
    ///
    /// Returns once the thread is running; the session itself comes up
    /// later and is reported as [`BrokerEvent::Connected`] after the
    /// command subscription has been issued.
    #[cfg(target_os = "espidf")]
    pub fn new(config: &SystemConfig) -> Result<Self, CommsError> {
        check_topics(config)?;

        let conf = MqttClientConfiguration {
            client_id: Some(CLIENT_ID),
            keep_alive_interval: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let (client, connection) =
            EspMqttClient::new(config.broker_url.as_str(), &conf).map_err(|e| {
                warn!("mqtt: client init failed: {}", e);
                CommsError::MqttConnectFailed
            })?;

        let client = Arc::new(Mutex::new(client));
        let connected = Arc::new(AtomicBool::new(false));
        let worker = EventWorker {
            client: Arc::clone(&client),
            connected: Arc::clone(&connected),
            command_topic: config.command_topic.clone(),
        };

        std::thread::Builder::new()
            .name("mqtt-events".into())
            .stack_size(EVENT_TASK_STACK)
            .spawn(move || worker.run(connection))
            .map_err(|e| {
                warn!("mqtt: event thread spawn failed: {}", e);
                CommsError::MqttConnectFailed
            })?;

        info!("mqtt: client started for {}", config.broker_url);
        Ok(Self {
            client,
            connected,
            publish_count: 0,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(config: &SystemConfig) -> Result<Self, CommsError> {
        check_topics(config)?;
        info!("mqtt(sim): client for {}", config.broker_url);
        Ok(Self {
            connected: false,
            command_topic: config.command_topic.clone(),
            published: Vec::new(),
            subscriptions: Vec::new(),
            publish_count: 0,
        })
    }

    pub fn is_connected(&self) -> bool {
        #[cfg(target_os = "espidf")]
        {
            self.connected.load(Ordering::Acquire)
        }
        #[cfg(not(target_os = "espidf"))]
        {
            self.connected
        }
    }

    /// Poll until the first session is up or `timeout` passes.
    ///
    /// Used once at startup, before the control loop and the watchdog
    /// exist.  Returns whether the session came up.
    pub fn wait_connected(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_connected() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep(CONNECT_POLL.min(deadline - now));
        }
    }

    /// Messages handed to the client since startup.
    pub fn publish_count(&self) -> u32 {
        self.publish_count
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        let mut client = match self.client.try_lock() {
            Ok(client) => client,
            Err(TryLockError::WouldBlock) => {
                debug!("mqtt: client busy, telemetry skipped");
                return Err(CommsError::MqttPublishFailed);
            }
            Err(TryLockError::Poisoned(_)) => return Err(CommsError::MqttPublishFailed),
        };
        client
            .enqueue(topic, QoS::AtLeastOnce, false, payload)
            .map(|id| debug!("mqtt: enqueued id={} on {}", id, topic))
            .map_err(|e| {
                debug!("mqtt: enqueue failed: {}", e);
                CommsError::MqttPublishFailed
            })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        self.published.push((topic.into(), payload.to_vec()));
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    /// Stand-in for the event thread: a session coming up subscribes to
    /// the command topic.
    pub fn sim_set_connected(&mut self, connected: bool) {
        if connected && !self.connected {
            self.subscriptions.push(self.command_topic.as_str().into());
        }
        self.connected = connected;
    }

    pub fn sim_published(&self) -> &[(String, Vec<u8>)] {
        &self.published
    }

    pub fn sim_subscriptions(&self) -> &[String] {
        &self.subscriptions
    }
}

impl PublishPort for MqttAdapter {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if !self.is_connected() {
            return Err(CommsError::NotConnected);
        }
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(CommsError::PayloadTooLarge);
        }
        self.platform_publish(topic, payload)?;
        self.publish_count = self.publish_count.wrapping_add(1);
        Ok(())
    }
}
