//! Timing and calibration constants.
//!
//! Every threshold in the controller is expressed in ticks of the periodic
//! timer. The values here are derived from the tick length so the relation
//! between a threshold and wall-clock time stays visible.

/// Length of one tick of the periodic timer.
pub const TICK_MILLIS: u64 = 2;

/// 500 ticks at 2 ms per tick is one second.
pub const TICKS_PER_SECOND: u16 = (1000 / TICK_MILLIS) as u16;

pub const TICKS_PER_HALF_SECOND: u16 = TICKS_PER_SECOND / 2;

/// Pause between dispatcher iterations. Only throttles button polling, no
/// timing is derived from it.
pub const POLL_INTERVAL_MILLIS: u64 = 1;

/// Configuration mode blink timing.
pub mod blink {
    use super::TICKS_PER_HALF_SECOND;

    /// Spacing between two toggles within a pattern (0.5 s).
    pub const SHORT_WAIT_TICKS: u16 = TICKS_PER_HALF_SECOND;

    /// The pause that marks the end of a pattern is six short waits (3 s).
    pub const LONG_WAIT_MULTIPLIER: u16 = 6;
}

/// Red-light camera timing.
pub mod camera {
    use super::TICKS_PER_HALF_SECOND;

    /// The flasher toggles once per window (0.5 s).
    pub const STEP_TICKS: u16 = TICKS_PER_HALF_SECOND;

    /// Number of windows one violation keeps the camera active: 4 x 0.5 s = 2 s.
    pub const STEPS: u8 = 4;

    pub const MAX_VIOLATIONS: u8 = 100;
}

/// Speed trap calibration.
pub mod speed {
    use super::TICKS_PER_SECOND;

    /// Distance between barrier A and barrier B.
    pub const BARRIER_DISTANCE_METRES: u32 = 20;

    /// km/h per m/s is 3.6, kept as a fraction for integer arithmetic.
    const KMH_PER_MPS_NUMERATOR: u32 = 36;
    const KMH_PER_MPS_DENOMINATOR: u32 = 10;

    /// Speed in km/h is `CALIBRATION / ticks between barriers`:
    /// 20 m * 3.6 * 500 ticks/s = 36000.
    pub const CALIBRATION: u32 = BARRIER_DISTANCE_METRES * KMH_PER_MPS_NUMERATOR
        * TICKS_PER_SECOND as u32
        / KMH_PER_MPS_DENOMINATOR;

    pub const MAX_SPEED: u8 = 100;
}

/// Potentiometer sampling.
pub mod adc {
    /// The core works on a 10-bit sample.
    pub const MAX_SAMPLE: u16 = 1023;

    /// Width of one period band; four bands cover the 10-bit range.
    pub const PERIOD_BAND: u16 = 256;
}

/// PWM outputs run on a 0-255 duty scale.
pub mod pwm {
    pub const MAX_DUTY: u8 = 255;

    /// Map a 0-100 percentage onto the duty scale, rounding to nearest.
    pub const fn duty_from_percent(percent: u8) -> u8 {
        let percent = (if percent > 100 { 100 } else { percent }) as u16;
        ((percent * MAX_DUTY as u16 + 50) / 100) as u8
    }
}
