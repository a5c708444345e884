/*
 * The speed trap.
 *
 * Two light barriers a fixed distance apart. Barrier A starts timing by
 * resetting `Clock::Barrier`; barrier B reads the interval and turns it into a
 * speed, which drives a PWM gauge. One pair of events gives one sample, there
 * is no averaging.
 *
 * A crossing that reads zero ticks, or a B event without a preceding A, has no
 * meaningful speed. Those samples are rejected and the gauge keeps showing the
 * previous one.
 */

use crate::constants::{pwm, speed};
use crate::ticks::{Clock, TickCounters};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Barrier {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedFault {
    /// Barrier B fired in the same tick as barrier A.
    ZeroInterval,
    /// Barrier B fired without barrier A starting a measurement.
    NoEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpeedSample {
    pub ticks: u16,
    /// km/h, clamped to `speed::MAX_SPEED`.
    pub speed: u8,
    pub duty: u8,
}

/// Anything that accepts a 0-255 duty cycle.
pub trait Gauge {
    fn set_duty(&mut self, duty: u8);
}

/// Clamped speed for a barrier interval, `None` for a zero interval.
pub fn speed_from_ticks(ticks: u16) -> Option<u8> {
    if ticks == 0 {
        return None;
    }
    let speed = speed::CALIBRATION / ticks as u32;
    Some(speed.min(speed::MAX_SPEED as u32) as u8)
}

#[derive(Debug, Default)]
pub struct SpeedSensor {
    timing: bool,
    last: Option<SpeedSample>,
}

impl SpeedSensor {
    pub const fn new() -> Self {
        SpeedSensor {
            timing: false,
            last: None,
        }
    }

    /// Feed one barrier event. Returns the new sample after barrier B, `None`
    /// after barrier A.
    pub fn on_barrier(
        &mut self,
        barrier: Barrier,
        ticks: &TickCounters,
    ) -> Result<Option<SpeedSample>, SpeedFault> {
        match barrier {
            Barrier::A => {
                ticks.reset(Clock::Barrier);
                self.timing = true;
                Ok(None)
            }
            Barrier::B => {
                if !self.timing {
                    return Err(SpeedFault::NoEntry);
                }
                self.timing = false;

                let interval = ticks.elapsed(Clock::Barrier);
                let speed = speed_from_ticks(interval).ok_or(SpeedFault::ZeroInterval)?;
                let sample = SpeedSample {
                    ticks: interval,
                    speed,
                    duty: pwm::duty_from_percent(speed),
                };
                self.last = Some(sample);
                Ok(Some(sample))
            }
        }
    }

    /// Handle an event and update the gauge when it produced a valid sample.
    pub fn measure(&mut self, barrier: Barrier, ticks: &TickCounters, gauge: &mut impl Gauge) {
        match self.on_barrier(barrier, ticks) {
            Ok(Some(sample)) => {
                info!("speed {} km/h over {} ticks", sample.speed, sample.ticks);
                gauge.set_duty(sample.duty);
            }
            Ok(None) => debug!("barrier A crossed"),
            Err(fault) => warn!("speed sample rejected: {}", fault),
        }
    }

    pub fn last(&self) -> Option<SpeedSample> {
        self.last
    }
}
