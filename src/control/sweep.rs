//! Back-and-forth servo sweep with reflection at the pulse bounds.

use crate::fsm::context::Direction;

/// Advance `pulse_us` by `speed` in `direction`, clamping to
/// `[min_pulse, max_pulse]` and reversing on contact.
///
/// Touching a bound flips the direction on that same tick, so no
/// overshoot survives into the next one.
pub fn advance_pulse(
    pulse_us: u32,
    direction: Direction,
    speed: u32,
    min_pulse: u32,
    max_pulse: u32,
) -> (u32, Direction) {
    let next = i64::from(pulse_us) + i64::from(speed) * direction.sign();

    if next >= i64::from(max_pulse) {
        (max_pulse, Direction::Down)
    } else if next <= i64::from(min_pulse) {
        (min_pulse, Direction::Up)
    } else {
        (next as u32, direction)
    }
}
