//! Range mapping and servo pulse-to-duty conversion.
//!
//! Both functions are pure integer arithmetic so the results are
//! identical on the ESP32-S3 and on the host test target.

use crate::pins::SERVO_MAX_DUTY;

/// Servo frame period at 50 Hz, microseconds.
pub const PERIOD_US: u32 = 20_000;

/// Linearly map `x` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// Computes `(x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min`
/// with the division truncating toward zero.  Inputs outside the source
/// range extrapolate; callers clamp beforehand if they need a bounded
/// result.
///
/// # Panics
///
/// `in_max <= in_min` is a programming error (the source span would be
/// empty or inverted) and panics immediately.
pub fn map_value(x: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    assert!(in_max > in_min, "map_value: empty input range [{in_min}, {in_max}]");
    let num = (i64::from(x) - i64::from(in_min)) * (i64::from(out_max) - i64::from(out_min));
    let den = i64::from(in_max) - i64::from(in_min);
    (num / den + i64::from(out_min)) as i32
}

/// Convert a pulse width to an LEDC duty value for the servo channel.
///
/// No range check: the sweep controller only ever passes values within
/// the configured pulse bounds, or `0` to release the servo.
pub fn pulse_to_duty(pulse_us: u32) -> u32 {
    scale_pulse(pulse_us, SERVO_MAX_DUTY)
}

/// [`pulse_to_duty`] against an arbitrary PWM resolution.
pub fn scale_pulse(pulse_us: u32, max_duty: u32) -> u32 {
    (u64::from(pulse_us) * u64::from(max_duty) / u64::from(PERIOD_US)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_endpoints() {
        assert_eq!(map_value(0, 0, 4095, 5, 80), 5);
        assert_eq!(map_value(4095, 0, 4095, 5, 80), 80);
    }

    #[test]
    fn map_truncates() {
        // 2048 * 75 / 4095 = 37.509... -> 37, offset by 5
        assert_eq!(map_value(2048, 0, 4095, 5, 80), 42);
        assert_eq!(map_value(1, 0, 4095, 5, 80), 5);
    }

    #[test]
    fn map_inverted_output_range() {
        assert_eq!(map_value(0, 0, 10, 100, 0), 100);
        assert_eq!(map_value(10, 0, 10, 100, 0), 0);
        assert_eq!(map_value(5, 0, 10, 100, 0), 50);
    }

    #[test]
    fn map_truncates_toward_zero_on_negative_quotient() {
        // (1 - 0) * (0 - 3) / 2 = -1.5 -> -1, then + 3
        assert_eq!(map_value(1, 0, 2, 3, 0), 2);
    }

    #[test]
    #[should_panic(expected = "empty input range")]
    fn map_rejects_empty_range() {
        let _ = map_value(1, 5, 5, 0, 10);
    }

    #[test]
    fn duty_at_servo_limits() {
        // 500 * 8191 / 20000 = 204.775 -> 204
        assert_eq!(pulse_to_duty(500), 204);
        // 2400 * 8191 / 20000 = 982.92 -> 982
        assert_eq!(pulse_to_duty(2400), 982);
        assert_eq!(pulse_to_duty(0), 0);
    }

    #[test]
    fn full_period_is_full_duty() {
        assert_eq!(pulse_to_duty(PERIOD_US), SERVO_MAX_DUTY);
        assert_eq!(scale_pulse(PERIOD_US / 2, 1000), 500);
    }
}
