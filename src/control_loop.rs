//! One iteration of the main loop, minus the sleep.
//!
//! ```text
//! drain broker events ─▶ gate + apply commands ─▶ AppService::tick ─▶ publisher
//! ```
//!
//! `main` wraps [`ControlLoop::run_once`] with the watchdog feed and the
//! tick scheduler.  Host tests drive [`ControlLoop::run_once_with`] with
//! an explicit event list instead of the global queue.
//!
//! Session events only move the Link indicator; the broker adapter owns
//! its subscriptions.

use log::{info, warn};

use crate::app::commands::CommandGate;
use crate::app::ports::{ActuatorPort, EventSink, Indicator, InputPort, PublishPort};
use crate::app::service::AppService;
use crate::events::{self, BrokerEvent};
use crate::telemetry::TelemetryPublisher;

pub struct ControlLoop<H, B, S>
where
    H: InputPort + ActuatorPort,
    B: PublishPort,
    S: EventSink,
{
    app: AppService,
    publisher: TelemetryPublisher,
    gate: CommandGate,
    hw: H,
    broker: B,
    sink: S,
    link_up: bool,
    last_dropped: u32,
}

impl<H, B, S> ControlLoop<H, B, S>
where
    H: InputPort + ActuatorPort,
    B: PublishPort,
    S: EventSink,
{
    /// Take ownership of the pieces and start the service.
    pub fn new(mut app: AppService, mut hw: H, broker: B, mut sink: S) -> Self {
        let cfg = app.config();
        let publisher = TelemetryPublisher::new(cfg);
        let gate = CommandGate::new(cfg.command_rate_per_sec, cfg.command_burst);

        app.start(&mut hw, &mut sink);
        hw.set_indicator(Indicator::Link, false);

        Self {
            app,
            publisher,
            gate,
            hw,
            broker,
            sink,
            link_up: false,
            last_dropped: 0,
        }
    }

    /// One tick fed from the global broker queue.
    pub fn run_once(&mut self) {
        events::drain_events(|ev| self.on_broker_event(ev));

        let dropped = events::dropped_events();
        if dropped != self.last_dropped {
            warn!("broker queue overflowed, {} events lost in total", dropped);
            self.last_dropped = dropped;
        }

        self.run_tick();
    }

    /// One tick with an explicit set of broker events.
    pub fn run_once_with(&mut self, broker_events: impl IntoIterator<Item = BrokerEvent>) {
        for ev in broker_events {
            self.on_broker_event(ev);
        }
        self.run_tick();
    }

    fn run_tick(&mut self) {
        self.app.tick(&mut self.hw, &mut self.sink);
        self.publisher.tick(&self.app, &mut self.broker, &mut self.sink);
    }

    fn on_broker_event(&mut self, ev: BrokerEvent) {
        match ev {
            BrokerEvent::Connected => {
                info!("broker session up");
                self.link_up = true;
                self.hw.set_indicator(Indicator::Link, true);
            }
            BrokerEvent::Disconnected => {
                if self.link_up {
                    warn!("broker session lost, sweep continues offline");
                }
                self.link_up = false;
                self.hw.set_indicator(Indicator::Link, false);
            }
            BrokerEvent::Command(cmd) => {
                if self.gate.admit(cmd) {
                    self.app.handle_command(cmd, &mut self.hw, &mut self.sink);
                }
            }
            BrokerEvent::Published(_) => {}
        }
    }

    pub fn app(&self) -> &AppService {
        &self.app
    }

    pub fn publisher(&self) -> &TelemetryPublisher {
        &self.publisher
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn broker_mut(&mut self) -> &mut B {
        &mut self.broker
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn link_up(&self) -> bool {
        self.link_up
    }

    pub fn commands_rejected(&self) -> u32 {
        self.gate.rejected()
    }
}
