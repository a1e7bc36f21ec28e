//! Hobby servo driver (SG90 class) on a 50 Hz PWM channel.
//!
//! Position is commanded as a pulse width in microseconds and converted
//! to a duty value against whatever resolution the PWM channel reports.
//! A pulse of `0` releases the servo (no pulses, horn goes limp).
//!
//! ## Dual-target design
//!
//! The driver is generic over `embedded_hal::pwm::SetDutyCycle`.  On
//! ESP-IDF [`LedcChannel`] writes the LEDC duty register via hw_init; on
//! host the same calls land in the hw_init sim store.

use embedded_hal::pwm::{ErrorKind, ErrorType, SetDutyCycle};

use crate::control::mapping::scale_pulse;
use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::pins;

impl embedded_hal::pwm::Error for ActuatorError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// One LEDC channel, configured by `hw_init::init_peripherals`.
pub struct LedcChannel {
    channel: u32,
    max_duty: u16,
}

impl LedcChannel {
    /// The servo channel at the board's configured resolution.
    pub fn servo() -> Self {
        Self {
            channel: hw_init::LEDC_CH_SERVO,
            max_duty: pins::SERVO_MAX_DUTY as u16,
        }
    }
}

impl ErrorType for LedcChannel {
    type Error = ActuatorError;
}

impl SetDutyCycle for LedcChannel {
    fn max_duty_cycle(&self) -> u16 {
        self.max_duty
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        hw_init::ledc_set(self.channel, u32::from(duty.min(self.max_duty)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoState {
    /// Output disabled.
    Released,
    /// Holding a commanded pulse width.
    Holding { pulse_us: u32 },
}

pub struct ServoDriver<P: SetDutyCycle> {
    pwm: P,
    state: ServoState,
    duty: u16,
}

impl<P: SetDutyCycle> ServoDriver<P> {
    pub fn new(pwm: P) -> Self {
        Self {
            pwm,
            state: ServoState::Released,
            duty: 0,
        }
    }

    /// Command a pulse width; `0` releases the output.
    pub fn set_pulse_us(&mut self, pulse_us: u32) -> Result<(), ActuatorError> {
        if pulse_us == 0 {
            return self.release();
        }
        let max = self.pwm.max_duty_cycle();
        let duty = scale_pulse(pulse_us, u32::from(max)).min(u32::from(max)) as u16;
        self.write(duty)?;
        self.state = ServoState::Holding { pulse_us };
        Ok(())
    }

    /// Stop emitting pulses.
    pub fn release(&mut self) -> Result<(), ActuatorError> {
        self.write(0)?;
        self.state = ServoState::Released;
        Ok(())
    }

    pub fn state(&self) -> ServoState {
        self.state
    }

    pub fn current_duty(&self) -> u16 {
        self.duty
    }

    fn write(&mut self, duty: u16) -> Result<(), ActuatorError> {
        self.pwm
            .set_duty_cycle(duty)
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.duty = duty;
        Ok(())
    }
}
