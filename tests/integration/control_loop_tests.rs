//! ControlLoop: broker events, remote commands and telemetry cadence.

use crate::mock_hw::{MockBroker, MockHardware, RecordingSink};

use sweepguard::app::commands::AppCommand;
use sweepguard::app::events::AppEvent;
use sweepguard::app::ports::Indicator;
use sweepguard::app::service::AppService;
use sweepguard::config::SystemConfig;
use sweepguard::control_loop::ControlLoop;
use sweepguard::error::CommsError;
use sweepguard::events::BrokerEvent;
use sweepguard::fsm::StateId;
use sweepguard::sensors::PhysicalModel;

type Loop = ControlLoop<MockHardware, MockBroker, RecordingSink>;

const QUIET: [BrokerEvent; 0] = [];

fn make_loop(cfg: SystemConfig) -> Loop {
    let model = PhysicalModel::with_entropy(&cfg, || 0);
    let app = AppService::with_model(cfg, model).expect("valid config");
    ControlLoop::new(app, MockHardware::new(), MockBroker::new(), RecordingSink::new())
}

fn idle(ctl: &mut Loop, ticks: usize) {
    for _ in 0..ticks {
        ctl.run_once_with(QUIET);
    }
}

// ── Telemetry cadence ────────────────────────────────────────

#[test]
fn publishes_every_25_ticks() {
    let mut ctl = make_loop(SystemConfig::default());
    idle(&mut ctl, 24);
    assert!(ctl.broker().published.is_empty());
    idle(&mut ctl, 1);
    assert_eq!(ctl.broker().published.len(), 1);
    idle(&mut ctl, 50);
    assert_eq!(ctl.broker().published.len(), 3);
    assert!(ctl.broker().published.iter().all(|(t, _)| t == "device/telemetry"));
}

// ── Scenario E ───────────────────────────────────────────────

#[test]
fn stopped_payload_reports_zero_speed_at_full_pot() {
    let mut ctl = make_loop(SystemConfig::default());
    ctl.hardware_mut().pot = Ok(4095);
    idle(&mut ctl, 25);
    let v = ctl.broker().last_json().unwrap();
    assert_eq!(v["status"], "STOPPED");
    assert_eq!(v["speed"], 0);
    assert_eq!(ctl.app().speed(), 80);
}

#[test]
fn running_payload_carries_speed_and_plant() {
    let mut ctl = make_loop(SystemConfig::default());
    ctl.hardware_mut().pot = Ok(4095);
    ctl.hardware_mut().start = true;
    idle(&mut ctl, 25);
    let v = ctl.broker().last_json().unwrap();
    assert_eq!(v["status"], "RUNNING");
    assert_eq!(v["speed"], 80);
    assert_eq!(v.as_object().unwrap().len(), 4);
    assert!(v["temp"].as_f64().unwrap() > 25.0);
    assert!((v["current"].as_f64().unwrap() - 1.7).abs() < 0.005);
}

#[test]
fn publish_failure_is_reported_and_loop_continues() {
    let mut ctl = make_loop(SystemConfig::default());
    ctl.broker_mut().fail_with = Some(CommsError::NotConnected);
    ctl.hardware_mut().start = true;
    idle(&mut ctl, 50);

    assert_eq!(ctl.publisher().failed(), 2);
    assert_eq!(ctl.publisher().published(), 0);
    assert_eq!(
        ctl.sink().count(|e| *e == AppEvent::PublishFailed(CommsError::NotConnected)),
        2
    );
    assert_eq!(ctl.app().state(), StateId::Running);
    assert_eq!(ctl.app().tick_count(), 50);

    ctl.broker_mut().fail_with = None;
    idle(&mut ctl, 25);
    assert_eq!(ctl.publisher().published(), 1);
}

// ── Broker session ───────────────────────────────────────────

#[test]
fn session_events_only_move_the_link_led() {
    let mut ctl = make_loop(SystemConfig::default());
    assert!(!ctl.hardware().indicator_on(Indicator::Link));

    ctl.run_once_with([BrokerEvent::Connected]);
    assert!(ctl.link_up());
    assert!(ctl.hardware().indicator_on(Indicator::Link));

    ctl.run_once_with([BrokerEvent::Disconnected]);
    assert!(!ctl.link_up());
    assert!(!ctl.hardware().indicator_on(Indicator::Link));

    ctl.run_once_with([BrokerEvent::Connected]);
    assert!(ctl.link_up());
    // Publishing is the only thing the loop asks of the broker.
    assert!(ctl.broker().published.is_empty());
    assert_eq!(ctl.app().state(), StateId::Stopped);
}

// ── Remote commands ──────────────────────────────────────────

#[test]
fn remote_start_and_stop_drive_the_fsm() {
    let mut ctl = make_loop(SystemConfig::default());
    ctl.run_once_with([BrokerEvent::Command(AppCommand::Start)]);
    assert_eq!(ctl.app().state(), StateId::Running);
    assert!(ctl.hardware().indicator_on(Indicator::Run));
    assert_eq!(ctl.hardware().last_position(), Some(505));

    ctl.run_once_with([BrokerEvent::Command(AppCommand::Stop)]);
    assert_eq!(ctl.app().state(), StateId::Stopped);
    assert_eq!(
        ctl.sink().count(|e| matches!(e, AppEvent::CommandApplied(_))),
        2
    );
}

#[test]
fn remote_start_obeys_the_latch_and_stop_clears_it() {
    let mut ctl = make_loop(SystemConfig::default());
    ctl.hardware_mut().pot = Ok(4095);
    ctl.run_once_with([BrokerEvent::Command(AppCommand::Start)]);
    for _ in 0..400 {
        if ctl.app().state() == StateId::Fault {
            break;
        }
        ctl.run_once_with(QUIET);
    }
    assert_eq!(ctl.app().state(), StateId::Fault);

    ctl.run_once_with([BrokerEvent::Command(AppCommand::Start)]);
    assert_eq!(ctl.app().state(), StateId::Fault);
    assert_eq!(ctl.sink().count(|e| *e == AppEvent::StartIgnored), 1);

    ctl.run_once_with([BrokerEvent::Command(AppCommand::Stop)]);
    assert_eq!(ctl.app().state(), StateId::Stopped);
    assert!(!ctl.app().controller_state().fault_latched);
}

#[test]
fn start_flood_is_rate_limited() {
    let mut ctl = make_loop(SystemConfig::default());
    let flood = [BrokerEvent::Command(AppCommand::Start); 8];
    ctl.run_once_with(flood);
    assert_eq!(ctl.commands_rejected(), 3);
    assert_eq!(
        ctl.sink().count(|e| matches!(e, AppEvent::CommandApplied(_))),
        5
    );
    assert_eq!(ctl.app().state(), StateId::Running);
}

#[test]
fn stop_gets_through_after_a_start_burst() {
    let mut ctl = make_loop(SystemConfig::default());
    let mut burst = vec![BrokerEvent::Command(AppCommand::Start); 5];
    burst.push(BrokerEvent::Command(AppCommand::Stop));
    ctl.run_once_with(burst);

    assert_eq!(ctl.app().state(), StateId::Stopped);
    assert_eq!(ctl.commands_rejected(), 0);
    assert!(!ctl.hardware().indicator_on(Indicator::Run));

    // Still gets through once the bucket is empty.
    ctl.run_once_with([BrokerEvent::Command(AppCommand::Start); 3]);
    ctl.run_once_with([BrokerEvent::Command(AppCommand::Stop)]);
    assert_eq!(ctl.app().state(), StateId::Stopped);
}
