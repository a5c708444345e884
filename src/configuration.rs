/*
 * Configuration mode.
 *
 * The operator picks the normal-mode period (1 to 4 seconds) with a
 * potentiometer. There is no display, so the selection is shown on the
 * indicator lamp: one pattern is `2 * period` toggles half a second apart,
 * except that the wait before the last toggle is three seconds. The pattern
 * repeats for as long as configuration mode is active.
 *
 * The period shown by a pattern is latched at its first toggle. Turning the
 * potentiometer mid-pattern changes the setting straight away, but the lamp
 * only shows the new value from the next pattern on.
 */

use crate::constants::{adc, blink};
use crate::ticks::{Clock, TickCounters};

/// Seconds between phase changes in normal mode, always 1 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeriodSetting(u8);

impl PeriodSetting {
    pub const MIN: PeriodSetting = PeriodSetting(1);
    pub const MAX: PeriodSetting = PeriodSetting(4);

    pub const fn new(seconds: u8) -> Option<Self> {
        if seconds >= Self::MIN.0 && seconds <= Self::MAX.0 {
            Some(PeriodSetting(seconds))
        } else {
            None
        }
    }

    /// Split the 10-bit sample range into four equal bands. Out-of-range
    /// samples land in the top band.
    pub fn from_sample(sample: u16) -> Self {
        let sample = sample.min(adc::MAX_SAMPLE);
        PeriodSetting((sample / adc::PERIOD_BAND) as u8 + 1)
    }

    pub const fn seconds(self) -> u8 {
        self.0
    }
}

impl Default for PeriodSetting {
    fn default() -> Self {
        Self::MIN
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wait {
    Short,
    Long,
}

impl Wait {
    fn ticks(self) -> u16 {
        match self {
            Wait::Short => blink::SHORT_WAIT_TICKS,
            Wait::Long => blink::SHORT_WAIT_TICKS * blink::LONG_WAIT_MULTIPLIER,
        }
    }
}

#[derive(Debug)]
pub struct BlinkPattern {
    wait: Wait,
    count: u8,
    latched: PeriodSetting,
}

impl BlinkPattern {
    pub const fn new() -> Self {
        BlinkPattern {
            wait: Wait::Short,
            count: 0,
            latched: PeriodSetting::MIN,
        }
    }

    /// Abandon the pattern in progress; the next step starts a new one.
    pub fn reset(&mut self) {
        self.wait = Wait::Short;
        self.count = 0;
    }

    #[cfg(test)]
    pub fn wait(&self) -> Wait {
        self.wait
    }

    #[cfg(test)]
    pub fn count(&self) -> u8 {
        self.count
    }

    #[cfg(test)]
    pub fn latched(&self) -> PeriodSetting {
        self.latched
    }

    /*
     * Advance the pattern once its current wait has passed on `Clock::Cycle`.
     * Returns true when the indicator has to toggle.
     */
    pub fn step(&mut self, period: PeriodSetting, ticks: &TickCounters) -> bool {
        if !ticks.take_if_elapsed(Clock::Cycle, self.wait.ticks()) {
            return false;
        }

        if self.count == 0 {
            self.latched = period;
            info!("showing period {}", period.seconds());
        }
        self.count += 1;

        let toggles = 2 * self.latched.seconds();
        if self.count >= toggles - 1 {
            self.wait = Wait::Long;
        }
        if self.count >= toggles {
            self.wait = Wait::Short;
            self.count = 0;
        }
        true
    }
}

impl Default for BlinkPattern {
    fn default() -> Self {
        Self::new()
    }
}
