//! SweepGuard Firmware — Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink        MqttAdapter        │
//! │  (Input+Actuator)       (EventSink)         (Publish)          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  FSM · Sweep · Plant model · Safety                    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ControlLoop (events → tick → telemetry) · TickScheduler       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup and connectivity
//!
//! Wi-Fi and the broker session are brought up once, before the loop.
//! Boot waits up to [`BROKER_WAIT`] for the first session.  If the
//! network or the broker is unavailable, the sweep still starts and runs
//! offline: the interlock never depends on the network.  Telemetry is
//! refused until the MQTT client's own reconnect brings a session up.
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::{Context, Result};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use sweepguard::adapters::hardware::HardwareAdapter;
use sweepguard::adapters::log_sink::LogEventSink;
use sweepguard::adapters::mqtt::MqttAdapter;
use sweepguard::adapters::wifi::{self, WifiCredentials};
use sweepguard::app::service::AppService;
use sweepguard::config::SystemConfig;
use sweepguard::control::mapping::pulse_to_duty;
use sweepguard::control_loop::ControlLoop;
use sweepguard::drivers::{hw_init, watchdog::Watchdog};
use sweepguard::error::Error;
use sweepguard::scheduler::TickScheduler;

/// Longest boot waits for the first broker session.
const BROKER_WAIT: Duration = Duration::from_secs(10);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("SweepGuard v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::default();
    config.validate().map_err(|e| {
        error!("configuration rejected: {}", e);
        Error::from(e)
    })?;

    // ── 3. Peripherals ────────────────────────────────────────
    // The servo channel comes up at the min-pulse duty and holds it until
    // the first Running tick drives the sweep.
    hw_init::init_peripherals(pulse_to_duty(config.min_pulse_us)).map_err(|e| {
        error!("HAL init failed: {}", e);
        Error::from(e)
    })?;

    // ── 4. Network ────────────────────────────────────────────
    let peripherals = Peripherals::take().context("Peripherals::take")?;
    let sysloop = EspSystemEventLoop::take().context("event loop")?;
    let nvs = EspDefaultNvsPartition::take().context("nvs")?;

    // Held for the life of the program; dropping it stops the station.
    let _wifi = match option_env!("SWEEPGUARD_WIFI_SSID") {
        Some(ssid) => {
            let creds = WifiCredentials::new(ssid, option_env!("SWEEPGUARD_WIFI_PASS").unwrap_or(""))
                .map_err(|e| anyhow::anyhow!("wifi credentials: {}", e))?;
            match wifi::connect_station(peripherals.modem, sysloop, nvs, &creds) {
                Ok(w) => Some(w),
                Err(e) => {
                    warn!("{}; running offline", e);
                    None
                }
            }
        }
        None => {
            warn!("no SWEEPGUARD_WIFI_SSID at build time; running offline");
            None
        }
    };

    let broker = MqttAdapter::new(&config).map_err(Error::from)?;
    if broker.wait_connected(BROKER_WAIT) {
        info!("broker session up, subscribed to {}", config.command_topic);
    } else {
        warn!(
            "no broker session after {} s; starting offline",
            BROKER_WAIT.as_secs()
        );
    }

    // ── 5. Control loop ───────────────────────────────────────
    let hw = HardwareAdapter::new(config.adc_max);
    let app = AppService::new(config.clone())?;
    let mut control = ControlLoop::new(app, hw, broker, LogEventSink::new());

    let mut watchdog = Watchdog::new(config.watchdog_timeout_ms);
    let mut scheduler = TickScheduler::new(Duration::from_millis(u64::from(config.tick_period_ms)));

    info!(
        "entering control loop: {} ms tick, telemetry every {} ticks on {}",
        config.tick_period_ms, config.publish_interval_ticks, config.telemetry_topic
    );

    loop {
        control.run_once();
        watchdog.feed();
        scheduler.wait();
    }
}
