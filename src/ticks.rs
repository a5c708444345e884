/*
 * The tick source.
 *
 * A periodic timer calls `tick` every `TICK_MILLIS`. That advances three
 * independent counters which the modes use as coarse clocks. Each counter has
 * exactly one consumer that compares it against a threshold and resets it:
 *
 * - `Clock::Cycle` is shared by normal mode and configuration mode, which never
 *   run in the same dispatcher iteration.
 * - `Clock::Barrier` belongs to the speed sensor.
 * - `Clock::Camera` belongs to the red-light camera.
 *
 * The timer and the consumers run in different contexts, so every access goes
 * through a critical section. A reader never observes a half-written counter.
 */

use core::cell::Cell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use enum_ordinalize::Ordinalize;

#[derive(Ordinalize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum Clock {
    Cycle,
    Barrier,
    Camera,
}

pub struct TickCounters {
    counts: Mutex<CriticalSectionRawMutex, Cell<[u16; Clock::VARIANT_COUNT]>>,
}

impl TickCounters {
    pub const fn new() -> Self {
        TickCounters {
            counts: Mutex::new(Cell::new([0; Clock::VARIANT_COUNT])),
        }
    }

    /// Advance every counter by one tick. Counters stop at `u16::MAX` rather
    /// than wrapping back to a small value.
    pub fn tick(&self) {
        self.counts.lock(|counts| {
            let mut values = counts.get();
            for value in values.iter_mut() {
                *value = value.saturating_add(1);
            }
            counts.set(values);
        });
    }

    /// Atomic snapshot of one counter.
    pub fn elapsed(&self, clock: Clock) -> u16 {
        self.counts.lock(|counts| counts.get()[clock.ordinal()])
    }

    pub fn reset(&self, clock: Clock) {
        self.counts.lock(|counts| {
            let mut values = counts.get();
            values[clock.ordinal()] = 0;
            counts.set(values);
        });
    }

    /// Compare and reset in one critical section, so no tick can land between
    /// the two.
    pub fn take_if_elapsed(&self, clock: Clock, threshold: u16) -> bool {
        self.counts.lock(|counts| {
            let mut values = counts.get();
            if values[clock.ordinal()] < threshold {
                return false;
            }
            values[clock.ordinal()] = 0;
            counts.set(values);
            true
        })
    }
}

#[cfg(test)]
impl TickCounters {
    /// Shorthand for `count` calls of `tick`.
    pub fn advance(&self, count: u32) {
        for _ in 0..count {
            self.tick();
        }
    }
}

impl Default for TickCounters {
    fn default() -> Self {
        Self::new()
    }
}
