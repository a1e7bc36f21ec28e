//! First-order thermal / electrical load model standing in for real
//! motor sensors.
//!
//! Advanced once per tick.  Temperature is integrated before current so
//! that later ticks compound on the same ordering every time.
//!
//! ## Dual-target entropy
//!
//! On ESP-IDF: jitter comes from the hardware RNG (`esp_random`).
//! On host/test: from `RandomState`'s per-instance SipHash keys.
//! Either source can be swapped for a deterministic one with
//! [`PhysicalModel::with_entropy`].

use crate::config::SystemConfig;
use crate::fsm::context::ControllerState;

/// Source of raw 32-bit noise for the current jitter.
pub type EntropyFn = fn() -> u32;

/// Jitter resolution: draws are taken in steps of `max / JITTER_STEPS`.
const JITTER_STEPS: u32 = 1000;

#[derive(Debug, Clone, Copy)]
struct ModelParams {
    ambient_c: f32,
    heat_gain: f32,
    heat_loss: f32,
    cooling_step: f32,
    base_current: f32,
    load_coef: f32,
    max_step: f32,
    jitter_max: f32,
    idle_current: f32,
    idle_jitter_max: f32,
}

pub struct PhysicalModel {
    params: ModelParams,
    entropy: EntropyFn,
}

impl PhysicalModel {
    pub fn new(config: &SystemConfig) -> Self {
        Self::with_entropy(config, platform_entropy)
    }

    /// Build a model drawing jitter from `entropy` instead of the
    /// platform RNG.
    pub fn with_entropy(config: &SystemConfig, entropy: EntropyFn) -> Self {
        Self {
            params: ModelParams {
                ambient_c: config.ambient_temp_c,
                heat_gain: config.heat_gain_coef,
                heat_loss: config.heat_loss_coef,
                cooling_step: config.cooling_step_c,
                base_current: config.base_current_a,
                load_coef: config.load_coef,
                max_step: config.max_step as f32,
                jitter_max: config.jitter_max_a,
                idle_current: config.idle_current_a,
                idle_jitter_max: config.idle_jitter_max_a,
            },
            entropy,
        }
    }

    /// Advance temperature and current by one tick.
    ///
    /// `active` is `running && !fault_latched`.  While active the servo
    /// heats in proportion to `speed` and loses heat towards ambient;
    /// otherwise it cools linearly and never drops below ambient.
    pub fn advance(&self, state: &mut ControllerState, speed: u32, active: bool) {
        let p = &self.params;

        if active {
            let speed = speed as f32;
            state.temperature_c += (speed / 100.0) * p.heat_gain
                - (state.temperature_c - p.ambient_c) * p.heat_loss;
            state.current_a = p.base_current + (speed / p.max_step) * p.load_coef + self.jitter(p.jitter_max);
        } else {
            if state.temperature_c > p.ambient_c {
                state.temperature_c = (state.temperature_c - p.cooling_step).max(p.ambient_c);
            }
            state.current_a = p.idle_current + self.jitter(p.idle_jitter_max);
        }
    }

    /// A draw in `[0, max)`.
    fn jitter(&self, max: f32) -> f32 {
        let draw = (self.entropy)() % JITTER_STEPS;
        draw as f32 / JITTER_STEPS as f32 * max
    }
}

#[cfg(target_os = "espidf")]
fn platform_entropy() -> u32 {
    // SAFETY: esp_random reads the hardware RNG register; no preconditions.
    unsafe { esp_idf_svc::sys::esp_random() }
}

#[cfg(not(target_os = "espidf"))]
fn platform_entropy() -> u32 {
    use std::hash::{BuildHasher, Hasher};
    let mut h = std::collections::hash_map::RandomState::new().build_hasher();
    h.write_u8(0);
    h.finish() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_at(temp: f32) -> ControllerState {
        let mut s = ControllerState::new(&SystemConfig::default());
        s.temperature_c = temp;
        s
    }

    fn zero() -> u32 {
        0
    }

    fn top() -> u32 {
        JITTER_STEPS - 1
    }

    #[test]
    fn running_heats_by_speed() {
        let cfg = SystemConfig::default();
        let m = PhysicalModel::with_entropy(&cfg, zero);
        let mut s = state_at(25.0);
        m.advance(&mut s, 80, true);
        // 0.8 * 0.12 - 0
        assert!((s.temperature_c - 25.096).abs() < 1e-4);
    }

    #[test]
    fn running_loses_heat_above_ambient() {
        let cfg = SystemConfig::default();
        let m = PhysicalModel::with_entropy(&cfg, zero);
        let mut s = state_at(35.0);
        m.advance(&mut s, 5, true);
        // 35 + 0.05 * 0.12 - 10 * 0.01
        assert!((s.temperature_c - 34.906).abs() < 1e-4);
    }

    #[test]
    fn running_current_tracks_speed() {
        let cfg = SystemConfig::default();
        let m = PhysicalModel::with_entropy(&cfg, zero);
        let mut s = state_at(25.0);
        m.advance(&mut s, 80, true);
        assert!((s.current_a - 1.7).abs() < 1e-5);
        m.advance(&mut s, 40, true);
        assert!((s.current_a - 1.1).abs() < 1e-5);
    }

    #[test]
    fn jitter_stays_below_bound() {
        let cfg = SystemConfig::default();
        let m = PhysicalModel::with_entropy(&cfg, top);
        let mut s = state_at(25.0);
        m.advance(&mut s, 80, true);
        let excess = s.current_a - 1.7;
        assert!(excess > 0.0 && excess < cfg.jitter_max_a);

        m.advance(&mut s, 80, false);
        let excess = s.current_a - cfg.idle_current_a;
        assert!(excess >= 0.0 && excess < cfg.idle_jitter_max_a);
    }

    #[test]
    fn platform_jitter_is_bounded_and_varies() {
        let cfg = SystemConfig::default();
        let m = PhysicalModel::new(&cfg);
        let mut s = state_at(25.0);
        let mut seen = Vec::new();
        for _ in 0..200 {
            m.advance(&mut s, 40, true);
            let jitter = s.current_a - 1.1;
            assert!((-1e-5..cfg.jitter_max_a).contains(&jitter), "jitter {jitter} out of range");
            seen.push(s.current_a.to_bits());
        }
        seen.sort_unstable();
        seen.dedup();
        assert!(seen.len() > 1, "jitter never changed");
    }

    #[test]
    fn idle_cools_linearly_to_ambient_then_holds() {
        let cfg = SystemConfig::default();
        let m = PhysicalModel::with_entropy(&cfg, zero);
        let mut s = state_at(25.05);
        m.advance(&mut s, 80, false);
        assert!((s.temperature_c - 25.03).abs() < 1e-4);
        m.advance(&mut s, 80, false);
        assert!((s.temperature_c - 25.01).abs() < 1e-4);
        m.advance(&mut s, 80, false);
        assert!((s.temperature_c - 25.0).abs() < f32::EPSILON);
        m.advance(&mut s, 80, false);
        assert!((s.temperature_c - 25.0).abs() < f32::EPSILON);
    }

    #[test]
    fn idle_current_is_baseline() {
        let cfg = SystemConfig::default();
        let m = PhysicalModel::with_entropy(&cfg, zero);
        let mut s = state_at(30.0);
        s.current_a = 1.8;
        m.advance(&mut s, 80, false);
        assert!((s.current_a - cfg.idle_current_a).abs() < 1e-6);
    }

    #[test]
    fn idle_below_ambient_is_left_alone() {
        let cfg = SystemConfig::default();
        let m = PhysicalModel::with_entropy(&cfg, zero);
        let mut s = state_at(20.0);
        m.advance(&mut s, 5, false);
        assert!((s.temperature_c - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn sustained_full_speed_reaches_fault_region() {
        let cfg = SystemConfig::default();
        let m = PhysicalModel::with_entropy(&cfg, zero);
        let mut s = state_at(25.0);
        let mut ticks = 0;
        while s.temperature_c < cfg.fault_temp_c {
            m.advance(&mut s, 80, true);
            ticks += 1;
            assert!(ticks < 10_000, "model never heated to the fault threshold");
        }
        assert!(s.current_a >= cfg.fault_current_a);
    }
}
