//! GPIO / peripheral pin assignments for the SweepGuard board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Indicator LEDs (discrete, active HIGH)
// ---------------------------------------------------------------------------

/// Red LED: overload fault latched.
pub const LED_FAULT_GPIO: i32 = 18;
/// Green LED: sweep running.
pub const LED_RUN_GPIO: i32 = 19;
/// Yellow LED: broker session up.
pub const LED_LINK_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Buttons (active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// Green push-button: start the sweep.
pub const BTN_START_GPIO: i32 = 21;
/// Red push-button: stop the sweep and clear a latched fault.
pub const BTN_STOP_GPIO: i32 = 47;

// ---------------------------------------------------------------------------
// Potentiometer (ADC1)
// ---------------------------------------------------------------------------

/// Speed potentiometer wiper — ADC1 channel 0 (GPIO 1 on ESP32-S3).
pub const POT_ADC_GPIO: i32 = 1;
/// ADC1 channel number of the potentiometer.
pub const POT_ADC1_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// Servo (LEDC PWM)
// ---------------------------------------------------------------------------

/// Servo control signal.
pub const SERVO_PWM_GPIO: i32 = 16;
/// LEDC channel driving the servo.
pub const SERVO_LEDC_CHANNEL: u32 = 0;
/// Standard hobby-servo frame rate (20 ms period).
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// LEDC timer resolution (bits).  13-bit gives 0 – 8191 duty levels.
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 13;
/// Largest duty value at [`SERVO_PWM_RESOLUTION_BITS`].
pub const SERVO_MAX_DUTY: u32 = (1 << SERVO_PWM_RESOLUTION_BITS) - 1;
