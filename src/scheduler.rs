//! Fixed-period tick scheduler.
//!
//! Holds the next absolute deadline rather than sleeping a fixed
//! duration after each tick, so the time spent inside a tick never
//! accumulates into drift.
//!
//! ```text
//!   deadline      deadline + P    deadline + 2P
//!      │──tick──┐sleep │──tick────┐sleep│
//!      ▼        ▼      ▼          ▼     ▼
//! ─────┴────────┴──────┴──────────┴─────┴──────▶ t
//! ```
//!
//! A tick that overruns by more than one whole period re-anchors the
//! schedule to "now" instead of firing a burst of catch-up ticks.

use std::time::{Duration, Instant};

use log::warn;

/// Sleep-until-deadline scheduler for the control loop.
pub struct TickScheduler {
    period: Duration,
    next_deadline: Instant,
    overruns: u32,
}

impl TickScheduler {
    /// First deadline is one period from now.
    pub fn new(period: Duration) -> Self {
        Self::starting_at(Instant::now(), period)
    }

    pub fn starting_at(origin: Instant, period: Duration) -> Self {
        Self {
            period,
            next_deadline: origin + period,
            overruns: 0,
        }
    }

    /// Block the calling task until the next tick boundary.
    pub fn wait(&mut self) {
        let delay = self.plan(Instant::now());
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    /// Work out how long to sleep at `now` and advance the deadline.
    pub fn plan(&mut self, now: Instant) -> Duration {
        let deadline = self.next_deadline;

        if now < deadline {
            self.next_deadline = deadline + self.period;
            return deadline - now;
        }

        let late = now - deadline;
        if late > self.period {
            self.overruns = self.overruns.saturating_add(1);
            warn!(
                "control tick overran by {} ms, re-anchoring schedule ({} overruns)",
                late.as_millis(),
                self.overruns
            );
            self.next_deadline = now + self.period;
        } else {
            self.next_deadline = deadline + self.period;
        }
        Duration::ZERO
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn overruns(&self) -> u32 {
        self.overruns
    }
}
