//! Discrete status LEDs (run / fault / link), active high.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: plain GPIO outputs via hw_init.
//! On host/test: the hw_init sim store.

use crate::app::ports::Indicator;
use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::pins;

pub struct IndicatorLeds {
    levels: [bool; 3],
}

impl Default for IndicatorLeds {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorLeds {
    pub fn new() -> Self {
        Self { levels: [false; 3] }
    }

    pub fn set(&mut self, id: Indicator, on: bool) -> Result<(), ActuatorError> {
        hw_init::gpio_write(Self::gpio(id), on)?;
        self.levels[id as usize] = on;
        Ok(())
    }

    pub fn is_on(&self, id: Indicator) -> bool {
        self.levels[id as usize]
    }

    const fn gpio(id: Indicator) -> i32 {
        match id {
            Indicator::Run => pins::LED_RUN_GPIO,
            Indicator::Fault => pins::LED_FAULT_GPIO,
            Indicator::Link => pins::LED_LINK_GPIO,
        }
    }
}
