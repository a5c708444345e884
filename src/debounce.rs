/*
 * Single-shot button handling.
 *
 * The dispatcher polls the buttons far faster than a person can press and
 * release one. A press held across many polls, or contact bounce while the
 * button is held, must count as one press. The latch reports the press on the
 * first poll that sees the button down and stays latched until a poll sees it
 * released again.
 */

#[derive(Debug, Default)]
pub struct PressLatch {
    latched: bool,
}

impl PressLatch {
    pub const fn new() -> Self {
        PressLatch { latched: false }
    }

    /// Feed the current button level; true exactly once per press.
    pub fn pressed(&mut self, down: bool) -> bool {
        match (self.latched, down) {
            (false, true) => {
                self.latched = true;
                true
            }
            (true, false) => {
                self.latched = false;
                false
            }
            (false, false) | (true, true) => false,
        }
    }
}
