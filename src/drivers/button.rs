//! Polled push-button driver.
//!
//! ## Hardware
//!
//! Active-low momentary switch with internal pull-up.  The control loop
//! samples the level once per tick; a button is "pressed" for as long as
//! the pin reads low.  At a 20 ms tick the sampling interval is already
//! coarser than typical contact bounce, so no separate debounce stage is
//! needed.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin};
use log::warn;

use crate::drivers::hw_init;

/// A GPIO input configured by `hw_init::init_peripherals`.
pub struct GpioInput {
    pin: i32,
}

impl GpioInput {
    pub fn new(pin: i32) -> Self {
        Self { pin }
    }
}

impl ErrorType for GpioInput {
    type Error = Infallible;
}

impl InputPin for GpioInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(hw_init::gpio_read(self.pin))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!hw_init::gpio_read(self.pin))
    }
}

pub struct Button<P: InputPin> {
    pin: P,
    name: &'static str,
}

impl<P: InputPin> Button<P> {
    pub fn new(pin: P, name: &'static str) -> Self {
        Self { pin, name }
    }

    /// `true` while held.  A read error counts as released.
    pub fn is_pressed(&mut self) -> bool {
        match self.pin.is_low() {
            Ok(low) => low,
            Err(e) => {
                warn!("button {}: read failed ({:?})", self.name, e);
                false
            }
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
