//! Inbound commands to the application service.
//!
//! These represent actions requested over the broker's command topic.
//! The [`AppService`](super::service::AppService) applies them with the
//! same semantics as the physical buttons.

use burster::Limiter;
use core::time::Duration;
use log::warn;

/// Longest payload the parser will look at.
pub const MAX_COMMAND_LEN: usize = 32;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Same as pressing the green button.  Ignored while a fault is latched.
    Start,
    /// Same as pressing the red button.  Clears a latched fault.
    Stop,
}

impl AppCommand {
    /// Parse a command payload.
    ///
    /// Accepts `START` / `STOP` in any case with surrounding whitespace,
    /// optionally as a JSON string (`"start"`).  Anything else is `None`.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        if payload.len() > MAX_COMMAND_LEN {
            return None;
        }
        let text = core::str::from_utf8(payload).ok()?.trim();
        let word = text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .map_or(text, str::trim);

        if word.eq_ignore_ascii_case("START") {
            Some(Self::Start)
        } else if word.eq_ignore_ascii_case("STOP") {
            Some(Self::Stop)
        } else {
            None
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Stop => "STOP",
        }
    }
}

/// Token-bucket admission for remote commands.
///
/// Only `Start` draws from the bucket; `Stop` is always admitted.
pub struct CommandGate {
    limiter: burster::TokenBucket<fn() -> Duration>,
    rejected: u32,
}

impl CommandGate {
    /// `rate` commands per second sustained, `burst` back-to-back.
    pub fn new(rate: u64, burst: u64) -> Self {
        Self {
            limiter: burster::TokenBucket::new_with_time_provider(
                rate,
                burst,
                platform_now as fn() -> Duration,
            ),
            rejected: 0,
        }
    }

    /// Consume one token for a `Start`; returns `false` (and logs) when
    /// exhausted.  `Stop` passes without touching the bucket.
    pub fn admit(&mut self, cmd: AppCommand) -> bool {
        if cmd == AppCommand::Stop || self.limiter.try_consume(1).is_ok() {
            return true;
        }
        self.rejected = self.rejected.saturating_add(1);
        warn!("command {} dropped: rate limit exceeded ({} total)", cmd.as_str(), self.rejected);
        false
    }

    pub fn rejected(&self) -> u32 {
        self.rejected
    }
}

// ── Platform time for rate limiter ───────────────────────────

#[cfg(target_os = "espidf")]
fn platform_now() -> Duration {
    // SAFETY: esp_timer_get_time reads the monotonic high-resolution timer.
    let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
    Duration::from_micros(us as u64)
}

#[cfg(not(target_os = "espidf"))]
fn platform_now() -> Duration {
    use std::time::Instant;
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    START.get_or_init(Instant::now).elapsed()
}
