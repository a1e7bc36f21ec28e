//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the buttons, the speed potentiometer, the servo driver and the
//! indicator LEDs, exposing them through [`InputPort`] and
//! [`ActuatorPort`].  This is the only module in the system that touches
//! actual hardware.  On non-espidf targets, the underlying drivers use
//! cfg-gated simulation stubs.
//!
//! Actuator write failures are logged and swallowed: the next tick
//! rewrites the servo anyway, and a stuck LED is not worth stopping the
//! loop for.

use log::warn;

use crate::app::ports::{ActuatorPort, AnalogChannel, ButtonId, Indicator, InputPort};
use crate::drivers::button::{Button, GpioInput};
use crate::drivers::hw_init;
use crate::drivers::indicator::IndicatorLeds;
use crate::drivers::servo::{LedcChannel, ServoDriver};
use crate::error::SensorError;
use crate::pins;
use crate::sensors::Potentiometer;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    start: Button<GpioInput>,
    stop: Button<GpioInput>,
    pot: Potentiometer,
    servo: ServoDriver<LedcChannel>,
    leds: IndicatorLeds,
}

impl HardwareAdapter {
    /// Build over peripherals already configured by
    /// [`hw_init::init_peripherals`].
    pub fn new(adc_max: u16) -> Self {
        Self {
            start: Button::new(GpioInput::new(pins::BTN_START_GPIO), "start"),
            stop: Button::new(GpioInput::new(pins::BTN_STOP_GPIO), "stop"),
            pot: Potentiometer::new(hw_init::ADC1_CH_POT, adc_max),
            servo: ServoDriver::new(LedcChannel::servo()),
            leds: IndicatorLeds::new(),
        }
    }

    pub fn servo(&self) -> &ServoDriver<LedcChannel> {
        &self.servo
    }

    pub fn leds(&self) -> &IndicatorLeds {
        &self.leds
    }
}

// ── InputPort implementation ──────────────────────────────────

impl InputPort for HardwareAdapter {
    fn read_button(&mut self, id: ButtonId) -> bool {
        match id {
            ButtonId::Start => self.start.is_pressed(),
            ButtonId::Stop => self.stop.is_pressed(),
        }
    }

    fn read_analog(&mut self, channel: AnalogChannel) -> Result<u16, SensorError> {
        match channel {
            AnalogChannel::SpeedPot => self.pot.read(),
        }
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_indicator(&mut self, id: Indicator, on: bool) {
        if let Err(e) = self.leds.set(id, on) {
            warn!("indicator {:?} -> {}: {}", id, on, e);
        }
    }

    fn set_actuator_position(&mut self, pulse_us: u32) {
        if let Err(e) = self.servo.set_pulse_us(pulse_us) {
            warn!("servo -> {} us: {}", pulse_us, e);
        }
    }
}
