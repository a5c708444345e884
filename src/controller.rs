/*
 * The mode dispatcher.
 *
 * One `poll` is one pass of the main loop. Each pass handles the violation
 * button and the camera first, so a pending mode switch can never starve the
 * flasher, then the mode button, and finally runs exactly one of normal mode
 * or configuration mode. All timing comes from the tick counters; how often
 * `poll` is called only affects how quickly button presses are noticed.
 *
 * The controller never touches hardware directly. Everything goes through a
 * `Board`, which keeps this module testable on the host.
 */

use enum_ordinalize::Ordinalize;

use crate::camera::Camera;
use crate::configuration::{BlinkPattern, PeriodSetting};
use crate::debounce::PressLatch;
use crate::ticks::TickCounters;
use crate::trafficlight::{Phase, TrafficLight};

#[derive(Ordinalize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum Button {
    Mode,
    Violation,
}

#[derive(Ordinalize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum Lamp {
    Green,
    Yellow,
    Red,
    // Steady in normal mode, blinks the period in configuration mode.
    Indicator,
    Flasher,
}

/// The hardware as seen by the controller. `on` and `is_pressed` are logical
/// levels, pin polarity is up to the implementation.
#[allow(async_fn_in_trait)]
pub trait Board {
    fn is_pressed(&mut self, button: Button) -> bool;

    /// One conversion of the period potentiometer, scaled to 0-1023.
    async fn read_potentiometer(&mut self) -> u16;

    fn set_lamp(&mut self, lamp: Lamp, on: bool);

    fn set_violation_duty(&mut self, duty: u8);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeFlags {
    /// Toggled by every press of the mode button.
    pub mode_requested: bool,
    /// Only becomes true while the light is red.
    pub config_mode_active: bool,
}

#[derive(Debug, Default)]
pub struct Controller {
    light: TrafficLight,
    period: PeriodSetting,
    pattern: BlinkPattern,
    camera: Camera,
    flags: ModeFlags,
    mode_button: PressLatch,
    violation_button: PressLatch,
    indicator_on: bool,
}

impl Controller {
    pub const fn new() -> Self {
        Controller {
            light: TrafficLight::new(),
            period: PeriodSetting::MIN,
            pattern: BlinkPattern::new(),
            camera: Camera::new(),
            flags: ModeFlags {
                mode_requested: false,
                config_mode_active: false,
            },
            mode_button: PressLatch::new(),
            violation_button: PressLatch::new(),
            indicator_on: false,
        }
    }

    pub async fn poll(&mut self, board: &mut impl Board, ticks: &TickCounters) {
        let violation = self.violation_button.pressed(board.is_pressed(Button::Violation));
        let armed = if violation && self.light.red() {
            self.camera.arm(ticks)
        } else {
            None
        };

        if let Some(flash) = armed.or_else(|| self.camera.step(ticks)) {
            board.set_lamp(Lamp::Flasher, flash.flasher_on);
            board.set_violation_duty(flash.duty);
        }

        if self.mode_button.pressed(board.is_pressed(Button::Mode)) {
            self.flags.mode_requested = !self.flags.mode_requested;
            info!("mode requested: {}", self.flags.mode_requested);
        }

        self.update_mode();

        if self.flags.config_mode_active {
            self.run_configuration_mode(board, ticks).await;
        } else {
            self.run_normal_mode(board, ticks);
        }
    }

    fn update_mode(&mut self) {
        match (self.flags.mode_requested, self.light.red()) {
            (true, true) => {
                if !self.flags.config_mode_active {
                    info!("entering configuration mode");
                }
                self.flags.config_mode_active = true;
            }
            (false, _) => {
                if self.flags.config_mode_active {
                    info!("leaving configuration mode, period {}", self.period.seconds());
                }
                self.flags.config_mode_active = false;
                self.pattern.reset();
            }
            // Requested, but wait for red.
            (true, false) => {}
        }
    }

    fn run_normal_mode(&mut self, board: &mut impl Board, ticks: &TickCounters) {
        if self.light.run_normal_mode(self.period, ticks).is_none() {
            return;
        }

        board.set_lamp(Lamp::Green, self.light.green());
        board.set_lamp(Lamp::Yellow, self.light.amber());
        board.set_lamp(Lamp::Red, self.light.red());
        self.indicator_on = true;
        board.set_lamp(Lamp::Indicator, true);
    }

    async fn run_configuration_mode(&mut self, board: &mut impl Board, ticks: &TickCounters) {
        let sample = board.read_potentiometer().await;
        self.period = PeriodSetting::from_sample(sample);

        if self.pattern.step(self.period, ticks) {
            self.indicator_on = !self.indicator_on;
            board.set_lamp(Lamp::Indicator, self.indicator_on);
        }
    }

    pub fn phase(&self) -> Phase {
        self.light.phase()
    }

    pub fn period(&self) -> PeriodSetting {
        self.period
    }

    pub fn flags(&self) -> ModeFlags {
        self.flags
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticks::Clock;
    use embassy_futures::block_on;

    #[derive(Default)]
    struct MockBoard {
        pressed: [bool; Button::VARIANT_COUNT],
        potentiometer: u16,
        lamps: [bool; Lamp::VARIANT_COUNT],
        lamp_writes: [u32; Lamp::VARIANT_COUNT],
        violation_duty: u8,
        potentiometer_reads: u32,
    }

    impl MockBoard {
        fn lamp(&self, lamp: Lamp) -> bool {
            self.lamps[lamp.ordinal()]
        }

        fn hold(&mut self, button: Button, down: bool) {
            self.pressed[button.ordinal()] = down;
        }
    }

    impl Board for MockBoard {
        fn is_pressed(&mut self, button: Button) -> bool {
            self.pressed[button.ordinal()]
        }

        async fn read_potentiometer(&mut self) -> u16 {
            self.potentiometer_reads += 1;
            self.potentiometer
        }

        fn set_lamp(&mut self, lamp: Lamp, on: bool) {
            self.lamps[lamp.ordinal()] = on;
            self.lamp_writes[lamp.ordinal()] += 1;
        }

        fn set_violation_duty(&mut self, duty: u8) {
            self.violation_duty = duty;
        }
    }

    struct Rig {
        controller: Controller,
        board: MockBoard,
        ticks: TickCounters,
    }

    impl Rig {
        fn new() -> Self {
            Rig {
                controller: Controller::new(),
                board: MockBoard::default(),
                ticks: TickCounters::new(),
            }
        }

        fn poll(&mut self) {
            block_on(self.controller.poll(&mut self.board, &self.ticks));
        }

        /// One tick followed by one pass of the loop, `count` times.
        fn run(&mut self, count: u32) {
            for _ in 0..count {
                self.ticks.tick();
                self.poll();
            }
        }

        fn press(&mut self, button: Button) {
            self.board.hold(button, true);
            self.poll();
            self.board.hold(button, false);
            self.poll();
        }

        fn run_until_red(&mut self) {
            for _ in 0..10_000 {
                if self.controller.phase() == Phase::Red {
                    return;
                }
                self.run(1);
            }
            panic!("light never turned red");
        }
    }

    #[test]
    fn normal_mode_cycles_one_lamp_at_a_time() {
        let mut rig = Rig::new();

        rig.run(499);
        assert_eq!(rig.controller.phase(), Phase::Yellow);
        assert_eq!(rig.board.lamp_writes[Lamp::Red.ordinal()], 0);

        rig.run(1);
        assert_eq!(rig.controller.phase(), Phase::Red);
        assert_eq!(rig.ticks.elapsed(Clock::Cycle), 0);
        assert!(rig.board.lamp(Lamp::Red));
        assert!(!rig.board.lamp(Lamp::Yellow));
        assert!(!rig.board.lamp(Lamp::Green));
        assert!(rig.board.lamp(Lamp::Indicator));

        rig.run(500);
        assert_eq!(rig.controller.phase(), Phase::Green);
        assert!(rig.board.lamp(Lamp::Green));
        assert!(!rig.board.lamp(Lamp::Red));

        rig.run(500);
        assert_eq!(rig.controller.phase(), Phase::Yellow);
        assert!(rig.board.lamp(Lamp::Yellow));
        assert!(!rig.board.lamp(Lamp::Green));
        assert_eq!(rig.board.potentiometer_reads, 0);
    }

    #[test]
    fn violation_on_green_is_ignored() {
        let mut rig = Rig::new();
        rig.run(1000);
        assert_eq!(rig.controller.phase(), Phase::Green);

        rig.press(Button::Violation);
        rig.run(1000);
        assert!(!rig.controller.camera().is_active());
        assert_eq!(rig.controller.camera().violations(), 0);
        assert_eq!(rig.board.lamp_writes[Lamp::Flasher.ordinal()], 0);
    }

    #[test]
    fn violation_on_red_lights_flasher_at_once() {
        let mut rig = Rig::new();
        rig.run_until_red();
        let flasher = Lamp::Flasher.ordinal();

        rig.board.hold(Button::Violation, true);
        rig.poll();
        assert!(rig.board.lamp(Lamp::Flasher));
        assert_eq!(rig.board.lamp_writes[flasher], 1);
        assert_eq!(rig.board.violation_duty, 3);

        // Lit for the whole first window.
        rig.board.hold(Button::Violation, false);
        rig.run(249);
        assert!(rig.board.lamp(Lamp::Flasher));
        assert_eq!(rig.board.lamp_writes[flasher], 1);
    }

    #[test]
    fn violation_on_red_flashes_for_two_seconds() {
        let mut rig = Rig::new();
        rig.run_until_red();
        let flasher = Lamp::Flasher.ordinal();

        rig.press(Button::Violation);
        assert!(rig.controller.camera().is_active());
        assert_eq!(rig.controller.camera().violations(), 1);

        rig.run(250);
        assert!(!rig.board.lamp(Lamp::Flasher));
        assert_eq!(rig.board.violation_duty, 3);

        rig.run(250);
        assert!(rig.board.lamp(Lamp::Flasher));

        rig.run(499);
        assert!(rig.controller.camera().is_active());
        assert!(!rig.board.lamp(Lamp::Flasher));
        assert_eq!(rig.board.lamp_writes[flasher], 4);

        rig.run(1);
        assert!(!rig.controller.camera().is_active());
        assert!(!rig.board.lamp(Lamp::Flasher));
        assert_eq!(rig.board.lamp_writes[flasher], 5);

        rig.run(2000);
        assert_eq!(rig.board.lamp_writes[flasher], 5);
    }

    #[test]
    fn violation_during_flash_does_not_rearm() {
        let mut rig = Rig::new();
        rig.run_until_red();
        rig.press(Button::Violation);
        rig.run(100);

        rig.press(Button::Violation);
        assert_eq!(rig.controller.camera().violations(), 1);
    }

    #[test]
    fn held_violation_button_counts_once() {
        let mut rig = Rig::new();
        rig.controller.flags.mode_requested = true;
        rig.run_until_red();

        // Configuration mode holds the light on red while the button stays down.
        rig.board.hold(Button::Violation, true);
        rig.run(3000);
        assert_eq!(rig.controller.phase(), Phase::Red);
        assert_eq!(rig.controller.camera().violations(), 1);
        assert!(!rig.controller.camera().is_active());
    }

    #[test]
    fn mode_request_waits_for_red() {
        let mut rig = Rig::new();
        rig.run(1000);
        assert_eq!(rig.controller.phase(), Phase::Green);

        rig.press(Button::Mode);
        assert!(rig.controller.flags().mode_requested);
        assert!(!rig.controller.flags().config_mode_active);

        rig.run(500);
        assert_eq!(rig.controller.phase(), Phase::Yellow);
        assert!(!rig.controller.flags().config_mode_active);

        rig.run(500);
        assert_eq!(rig.controller.phase(), Phase::Red);
        rig.poll();
        assert!(rig.controller.flags().config_mode_active);

        // The light stays red for as long as configuration mode is on.
        rig.run(5000);
        assert_eq!(rig.controller.phase(), Phase::Red);
    }

    #[test]
    fn held_mode_button_toggles_once() {
        let mut rig = Rig::new();
        rig.board.hold(Button::Mode, true);
        rig.run(100);
        assert!(rig.controller.flags().mode_requested);

        rig.board.hold(Button::Mode, false);
        rig.run(1);
        assert!(rig.controller.flags().mode_requested);
    }

    #[test]
    fn configuration_mode_blinks_selected_period() {
        let mut rig = Rig::new();
        rig.board.potentiometer = 300;
        rig.run_until_red();
        rig.press(Button::Mode);
        assert!(rig.controller.flags().config_mode_active);

        let indicator = Lamp::Indicator.ordinal();
        let before = rig.board.lamp_writes[indicator];

        // Period 2: three toggles half a second apart, then the long wait.
        rig.run(750);
        assert_eq!(rig.controller.period().seconds(), 2);
        assert_eq!(rig.board.lamp_writes[indicator] - before, 3);

        rig.run(1499);
        assert_eq!(rig.board.lamp_writes[indicator] - before, 3);
        rig.run(1);
        assert_eq!(rig.board.lamp_writes[indicator] - before, 4);
        assert!(rig.board.potentiometer_reads > 2000);
    }

    #[test]
    fn leaving_configuration_mode_applies_new_period() {
        let mut rig = Rig::new();
        rig.board.potentiometer = 1023;
        rig.run_until_red();
        rig.press(Button::Mode);
        rig.run(600);
        assert_eq!(rig.controller.period().seconds(), 4);

        rig.press(Button::Mode);
        let flags = rig.controller.flags();
        assert!(!flags.mode_requested);
        assert!(!flags.config_mode_active);

        // The last blink step reset the cycle clock 100 ticks ago; the light
        // waits out four seconds from there.
        rig.run(1999 - 100);
        assert_eq!(rig.controller.phase(), Phase::Red);
        rig.run(1);
        assert_eq!(rig.controller.phase(), Phase::Green);
        assert!(rig.board.lamp(Lamp::Indicator));
    }
}
