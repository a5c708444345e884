use crate::configuration::PeriodSetting;
use crate::constants::TICKS_PER_SECOND;
use crate::ticks::{Clock, TickCounters};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Green,
    Yellow,
    Red,
}

impl Phase {
    pub fn next(self) -> Phase {
        match self {
            Phase::Green => Phase::Yellow,
            Phase::Yellow => Phase::Red,
            Phase::Red => Phase::Green,
        }
    }
}

#[derive(Debug)]
pub struct TrafficLight {
    phase: Phase,
}

impl TrafficLight {
    /*
     * The light powers up one step before red, so the first step of normal
     * mode lights red after one period.
     */
    pub const fn new() -> Self {
        TrafficLight {
            phase: Phase::Yellow,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn to_next_phase(&mut self) {
        self.phase = self.phase.next();
    }

    /*
     * One pass of normal mode. Nothing happens until `Clock::Cycle` reaches
     * `period` seconds; then the light moves on exactly one phase and the clock
     * starts over. Returns the new phase when it changed.
     */
    pub fn run_normal_mode(
        &mut self,
        period: PeriodSetting,
        ticks: &TickCounters,
    ) -> Option<Phase> {
        let threshold = TICKS_PER_SECOND * period.seconds() as u16;
        if !ticks.take_if_elapsed(Clock::Cycle, threshold) {
            return None;
        }

        self.to_next_phase();
        debug!("normal mode: {}", self.phase);
        Some(self.phase)
    }

    pub fn red(&self) -> bool {
        match self.phase {
            Phase::Red => true,
            Phase::Green | Phase::Yellow => false,
        }
    }

    pub fn amber(&self) -> bool {
        match self.phase {
            Phase::Yellow => true,
            Phase::Green | Phase::Red => false,
        }
    }

    pub fn green(&self) -> bool {
        match self.phase {
            Phase::Green => true,
            Phase::Yellow | Phase::Red => false,
        }
    }
}

impl Default for TrafficLight {
    fn default() -> Self {
        Self::new()
    }
}
