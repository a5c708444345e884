/*
 * Red-light camera.
 *
 * A violation arms the camera for `camera::STEPS` windows of half a second.
 * The flasher lights at once, and the end of each window toggles it and
 * refreshes the violation gauge, whose duty is proportional to the number of
 * violations seen so far. The count saturates at `camera::MAX_VIOLATIONS`.
 */

use crate::constants::{camera, pwm};
use crate::ticks::{Clock, TickCounters};

/// What the outputs should show after a camera step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Flash {
    pub flasher_on: bool,
    pub duty: u8,
}

#[derive(Debug, Default)]
pub struct Camera {
    violations: u8,
    remaining_steps: u8,
    flasher_on: bool,
}

impl Camera {
    pub const fn new() -> Self {
        Camera {
            violations: 0,
            remaining_steps: 0,
            flasher_on: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.remaining_steps > 0
    }

    pub fn violations(&self) -> u8 {
        self.violations
    }

    pub fn flasher_on(&self) -> bool {
        self.flasher_on
    }

    /// Record a violation and start a flash cycle with the flasher lit.
    /// Ignored while a cycle is already running. Returns the outputs to show
    /// straight away when the camera was armed.
    pub fn arm(&mut self, ticks: &TickCounters) -> Option<Flash> {
        if self.is_active() {
            return None;
        }

        self.violations = self.violations.saturating_add(1).min(camera::MAX_VIOLATIONS);
        self.remaining_steps = camera::STEPS;
        self.flasher_on = true;
        ticks.reset(Clock::Camera);
        info!("red light violation {}", self.violations);
        Some(self.flash())
    }

    fn flash(&self) -> Flash {
        Flash {
            flasher_on: self.flasher_on,
            duty: pwm::duty_from_percent(self.violations),
        }
    }

    /*
     * Run one window of an active cycle, once `Clock::Camera` says the window
     * has passed. The flasher is forced off when the last window ends, so the
     * camera always goes quiet in a known state.
     */
    pub fn step(&mut self, ticks: &TickCounters) -> Option<Flash> {
        if !self.is_active() || !ticks.take_if_elapsed(Clock::Camera, camera::STEP_TICKS) {
            return None;
        }

        self.remaining_steps -= 1;
        self.flasher_on = !self.flasher_on && self.is_active();
        if !self.is_active() {
            info!("camera cycle finished");
        }

        Some(self.flash())
    }
}
