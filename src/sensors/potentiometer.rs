//! Speed potentiometer on ADC1.
//!
//! Wiper voltage across the full 0 – 3.3 V range, read via the oneshot
//! driver configured in `hw_init`.  Readings are clamped to the
//! configured full scale so downstream range mapping never sees a value
//! outside `0..=adc_max`.

use crate::drivers::hw_init;
use crate::error::SensorError;

pub struct Potentiometer {
    channel: u32,
    adc_max: u16,
}

impl Potentiometer {
    pub fn new(channel: u32, adc_max: u16) -> Self {
        Self { channel, adc_max }
    }

    /// Raw wiper position in `0..=adc_max`.
    pub fn read(&self) -> Result<u16, SensorError> {
        let raw = hw_init::adc1_read(self.channel)?;
        Ok(raw.min(self.adc_max))
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::drivers::hw_init::sim;

    // Single test: the sim ADC is process-global.
    #[test]
    fn reads_clamps_and_reports_failure() {
        let pot = Potentiometer::new(hw_init::ADC1_CH_POT, 4095);

        sim::set_adc(2048);
        assert_eq!(pot.read(), Ok(2048));

        sim::set_adc(u16::MAX);
        assert_eq!(pot.read(), Ok(4095));

        sim::set_adc_failing(true);
        assert_eq!(pot.read(), Err(SensorError::AdcReadFailed));
        sim::set_adc_failing(false);
        sim::set_adc(0);
        assert_eq!(pot.read(), Ok(0));
    }
}
