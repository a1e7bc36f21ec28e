//! AppService end to end: buttons and pot in, servo and LEDs out.

use crate::mock_hw::{MockHardware, RecordingSink};

use sweepguard::app::events::{AppEvent, RunStatus};
use sweepguard::app::ports::Indicator;
use sweepguard::app::service::AppService;
use sweepguard::config::SystemConfig;
use sweepguard::error::SensorError;
use sweepguard::fsm::StateId;
use sweepguard::sensors::PhysicalModel;

fn no_jitter() -> u32 {
    0
}

fn make_app(cfg: SystemConfig) -> (AppService, MockHardware, RecordingSink) {
    let model = PhysicalModel::with_entropy(&cfg, no_jitter);
    let mut app = AppService::with_model(cfg, model).expect("valid config");
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    app.start(&mut hw, &mut sink);
    (app, hw, sink)
}

fn press_start(app: &mut AppService, hw: &mut MockHardware, sink: &mut RecordingSink) {
    hw.start = true;
    app.tick(hw, sink);
    hw.release_buttons();
}

/// Run at full speed until the interlock latches; returns ticks taken.
fn run_until_fault(app: &mut AppService, hw: &mut MockHardware, sink: &mut RecordingSink) -> u32 {
    hw.pot = Ok(4095);
    press_start(app, hw, sink);
    for n in 1..=1000 {
        if app.state() == StateId::Fault {
            return n;
        }
        app.tick(hw, sink);
    }
    panic!("interlock never tripped");
}

// ── Scenario B: speed endpoints ──────────────────────────────

#[test]
fn pot_endpoints_map_to_step_bounds() {
    let (mut app, mut hw, mut sink) = make_app(SystemConfig::default());
    hw.pot = Ok(0);
    app.tick(&mut hw, &mut sink);
    assert_eq!(app.speed(), 5);
    hw.pot = Ok(4095);
    app.tick(&mut hw, &mut sink);
    assert_eq!(app.speed(), 80);
}

// ── Sweep travel ─────────────────────────────────────────────

#[test]
fn stopped_boot_never_drives_the_servo() {
    let (mut app, mut hw, mut sink) = make_app(SystemConfig::default());
    hw.pot = Ok(4095);
    for _ in 0..50 {
        app.tick(&mut hw, &mut sink);
    }
    assert_eq!(app.state(), StateId::Stopped);
    assert!(hw.positions().is_empty(), "boot duty was overwritten");
    assert_eq!(app.controller_state().pulse_us, 500);

    press_start(&mut app, &mut hw, &mut sink);
    assert_eq!(hw.positions().first(), Some(&580));
}

#[test]
fn sweep_reflects_at_both_ends() {
    let (mut app, mut hw, mut sink) = make_app(SystemConfig::default());
    hw.pot = Ok(4095);
    press_start(&mut app, &mut hw, &mut sink);
    for _ in 0..60 {
        app.tick(&mut hw, &mut sink);
    }
    let positions = hw.positions();
    assert!(positions.iter().all(|p| (500..=2400).contains(p)), "{positions:?}");
    assert!(positions.contains(&2400), "never reached the top");
    let top = positions.iter().position(|p| *p == 2400).unwrap();
    assert_eq!(positions[top + 1], 2320, "did not reverse after the top");
}

#[test]
fn stop_holds_last_position() {
    let (mut app, mut hw, mut sink) = make_app(SystemConfig::default());
    hw.pot = Ok(2048);
    press_start(&mut app, &mut hw, &mut sink);
    for _ in 0..5 {
        app.tick(&mut hw, &mut sink);
    }
    let parked = app.controller_state().pulse_us;
    let drives = hw.positions().len();

    hw.stop = true;
    app.tick(&mut hw, &mut sink);
    hw.release_buttons();
    for _ in 0..20 {
        app.tick(&mut hw, &mut sink);
    }

    assert_eq!(app.state(), StateId::Stopped);
    assert_eq!(hw.positions().len(), drives, "servo re-driven while stopped");
    assert_eq!(app.controller_state().pulse_us, parked);
    assert!(!hw.indicator_on(Indicator::Run));
}

#[test]
fn stop_wins_when_both_buttons_held() {
    let (mut app, mut hw, mut sink) = make_app(SystemConfig::default());
    hw.start = true;
    hw.stop = true;
    for _ in 0..5 {
        app.tick(&mut hw, &mut sink);
    }
    assert_eq!(app.state(), StateId::Stopped);
    assert!(hw.positions().is_empty());
}

// ── Fault interlock ──────────────────────────────────────────

#[test]
fn sustained_full_speed_trips_the_interlock() {
    let (mut app, mut hw, mut sink) = make_app(SystemConfig::default());
    let ticks = run_until_fault(&mut app, &mut hw, &mut sink);

    // 25 + 9.6 * (1 - 0.99^n) >= 34 at n ~ 276
    assert!((250..=300).contains(&ticks), "tripped after {ticks} ticks");

    let s = app.controller_state();
    assert!(s.fault_latched);
    assert!(!s.running);
    assert!(s.temperature_c >= 34.0 && s.current_a >= 1.70);
    assert_eq!(hw.last_position(), Some(0));
    assert!(hw.indicator_on(Indicator::Fault));
    assert!(!hw.indicator_on(Indicator::Run));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FaultTripped { .. })), 1);
}

#[test]
fn latch_holds_after_the_plant_cools() {
    let (mut app, mut hw, mut sink) = make_app(SystemConfig::default());
    run_until_fault(&mut app, &mut hw, &mut sink);
    let drives = hw.positions().len();

    for _ in 0..1000 {
        app.tick(&mut hw, &mut sink);
    }
    let s = app.controller_state();
    assert!(s.temperature_c < 34.0, "plant should have cooled");
    assert!(s.fault_latched);
    assert_eq!(app.state(), StateId::Fault);
    assert_eq!(hw.positions().len(), drives);
    assert_eq!(app.telemetry_snapshot().status, RunStatus::Stopped);
}

#[test]
fn start_is_ignored_while_latched() {
    let (mut app, mut hw, mut sink) = make_app(SystemConfig::default());
    run_until_fault(&mut app, &mut hw, &mut sink);

    press_start(&mut app, &mut hw, &mut sink);
    app.tick(&mut hw, &mut sink);

    assert_eq!(app.state(), StateId::Fault);
    assert!(!app.controller_state().running);
    assert_eq!(sink.count(|e| *e == AppEvent::StartIgnored), 1);
}

// ── Scenario A: Stop clears the latch ────────────────────────

#[test]
fn stop_clears_the_latch_on_the_next_tick() {
    let (mut app, mut hw, mut sink) = make_app(SystemConfig::default());
    run_until_fault(&mut app, &mut hw, &mut sink);

    hw.stop = true;
    app.tick(&mut hw, &mut sink);

    let s = app.controller_state();
    assert!(!s.running);
    assert!(!s.fault_latched);
    assert_eq!(app.state(), StateId::Stopped);
    assert_eq!(app.fault_flags(), 0);
    assert!(!hw.indicator_on(Indicator::Fault));
    assert_eq!(sink.count(|e| *e == AppEvent::FaultCleared), 1);

    // Start works again afterwards.
    hw.release_buttons();
    press_start(&mut app, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Running);
}

// ── AND rule ─────────────────────────────────────────────────

#[test]
fn hot_but_low_current_never_trips() {
    // Temperature passes 26 quickly; current tops out at 1.70 with no jitter.
    let cfg = SystemConfig {
        fault_temp_c: 26.0,
        fault_current_a: 1.9,
        ..SystemConfig::default()
    };
    let (mut app, mut hw, mut sink) = make_app(cfg);
    hw.pot = Ok(4095);
    press_start(&mut app, &mut hw, &mut sink);
    for _ in 0..2000 {
        app.tick(&mut hw, &mut sink);
    }
    assert!(app.controller_state().temperature_c > 26.0);
    assert_eq!(app.state(), StateId::Running);
}

#[test]
fn high_current_but_cool_never_trips() {
    // Equilibrium at full speed is ~34.6 C, well under 40.
    let cfg = SystemConfig {
        fault_temp_c: 40.0,
        ..SystemConfig::default()
    };
    let (mut app, mut hw, mut sink) = make_app(cfg);
    hw.pot = Ok(4095);
    press_start(&mut app, &mut hw, &mut sink);
    for _ in 0..2000 {
        app.tick(&mut hw, &mut sink);
    }
    assert!(app.controller_state().current_a >= 1.70);
    assert_eq!(app.state(), StateId::Running);
}

// ── Scenario D: cool-down ────────────────────────────────────

#[test]
fn stopped_plant_cools_to_ambient_then_holds() {
    let (mut app, mut hw, mut sink) = make_app(SystemConfig::default());
    hw.pot = Ok(4095);
    press_start(&mut app, &mut hw, &mut sink);
    for _ in 0..100 {
        app.tick(&mut hw, &mut sink);
    }
    hw.stop = true;
    app.tick(&mut hw, &mut sink);
    hw.release_buttons();

    let mut prev = app.controller_state().temperature_c;
    assert!(prev > 25.0);
    let mut reached = false;
    for _ in 0..2000 {
        app.tick(&mut hw, &mut sink);
        let t = app.controller_state().temperature_c;
        if reached {
            assert_eq!(t, 25.0);
        } else {
            assert!(t < prev, "temperature rose from {prev} to {t}");
            reached = t == 25.0;
        }
        prev = t;
    }
    assert!(reached, "never reached ambient");
}

// ── Degraded inputs ──────────────────────────────────────────

#[test]
fn pot_failure_reuses_last_reading() {
    let (mut app, mut hw, mut sink) = make_app(SystemConfig::default());
    hw.pot = Ok(4095);
    app.tick(&mut hw, &mut sink);
    hw.pot = Err(SensorError::AdcReadFailed);
    for _ in 0..5 {
        app.tick(&mut hw, &mut sink);
    }
    assert_eq!(app.speed(), 80);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::InputDegraded(_))), 1);
}
