//! Task watchdog (TWDT) guard for the control task.
//!
//! The control loop feeds once per tick after publishing.  A stall longer
//! than `timeout_ms` (a hung broker call, a wedged ADC) panics and resets
//! the board, which brings the servo back up released and the latch clear.
//!
//! Dropping the guard unsubscribes the task.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{
    esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_delete, esp_task_wdt_reconfigure,
    esp_task_wdt_reset, ESP_OK,
};
use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    Active,
    /// `esp_task_wdt_add` failed; feeding is a no-op.
    Unavailable,
}

pub struct Watchdog {
    timeout_ms: u32,
    subscription: Subscription,
    feeds: u64,
}

impl Watchdog {
    /// Reconfigure the TWDT for `timeout_ms` and subscribe the calling task.
    pub fn new(timeout_ms: u32) -> Self {
        let subscription = Self::subscribe(timeout_ms);
        match subscription {
            Subscription::Active => info!("watchdog: armed, {} ms", timeout_ms),
            Subscription::Unavailable => warn!("watchdog: not armed, loop stalls go undetected"),
        }
        Self {
            timeout_ms,
            subscription,
            feeds: 0,
        }
    }

    #[cfg(target_os = "espidf")]
    fn subscribe(timeout_ms: u32) -> Subscription {
        let cfg = esp_task_wdt_config_t {
            timeout_ms,
            idle_core_mask: 0,
            trigger_panic: true,
        };
        // SAFETY: plain FFI calls with a stack-local config; the null task
        // handle means "the calling task".
        let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
        if ret != ESP_OK {
            warn!("watchdog: reconfigure returned {}", ret);
        }
        let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
        if ret == ESP_OK {
            Subscription::Active
        } else {
            warn!("watchdog: subscribe failed ({})", ret);
            Subscription::Unavailable
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn subscribe(_timeout_ms: u32) -> Subscription {
        Subscription::Active
    }

    pub fn feed(&mut self) {
        if self.subscription != Subscription::Active {
            return;
        }
        #[cfg(target_os = "espidf")]
        unsafe {
            esp_task_wdt_reset();
        }
        self.feeds = self.feeds.wrapping_add(1);
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn subscription(&self) -> Subscription {
        self.subscription
    }

    pub fn feeds(&self) -> u64 {
        self.feeds
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        if self.subscription == Subscription::Active {
            #[cfg(target_os = "espidf")]
            unsafe {
                esp_task_wdt_delete(core::ptr::null_mut());
            }
        }
    }
}
