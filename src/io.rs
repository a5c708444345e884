/*
 * The I/O module for the intersection.
 *
 * This is the only part of the program that knows about the DESPI-M02 board.
 * It brings up the peripherals, implements the controller's `Board` on top of
 * them, and runs the two producers that feed the core from the hardware: the
 * 2 ms tick and the light barrier edges.
 *
 * Pin assignment:
 *
 * | function             | pin  | notes                          |
 * |----------------------|------|--------------------------------|
 * | green / amber / red  | PB14 / PB12 / PB10 | active-high      |
 * | indicator            | PE12 | on-board LED, active-low       |
 * | flasher              | PE1  | active-high                    |
 * | mode button          | PE11 | on-board button, pull-up       |
 * | violation button     | PE10 | pull-up                        |
 * | barrier A / B        | PE2 / PE3 | EXTI, falling edge        |
 * | period potentiometer | PA4  | ADC1                           |
 * | speed / violation PWM| PA6 / PA7 | TIM3 channel 1 / 2        |
 */

use embassy_futures::select::{Either, select};
use embassy_stm32::{
    adc::Adc,
    exti::{Channel, ExtiInput},
    gpio::{Input, Level, Output, OutputType, Pin, Pull, Speed},
    peripherals::{ADC1, PA4, TIM3},
    time::khz,
    timer::{
        low_level::CountingMode,
        simple_pwm::{PwmPin, SimplePwm, SimplePwmChannel},
    },
};
use embassy_time::{Duration, Ticker};
use enum_ordinalize::Ordinalize;

use intersection::constants::{TICK_MILLIS, pwm};
use intersection::controller::{Board, Button, Lamp};
use intersection::speed::{Barrier, Gauge, SpeedSensor};
use intersection::ticks::TickCounters;

// The F103 ADC is 12 bits wide, the controller works on 10.
const ADC_DOWNSHIFT: u32 = 2;

const ACTIVE_LOWS: [bool; Lamp::VARIANT_COUNT] = {
    let mut active_lows = [false; Lamp::VARIANT_COUNT];
    active_lows[Lamp::Indicator as usize] = true;
    active_lows
};

pub struct PwmGauge(SimplePwmChannel<'static, TIM3>);

impl Gauge for PwmGauge {
    fn set_duty(&mut self, duty: u8) {
        self.0.set_duty_cycle_fraction(duty as u16, pwm::MAX_DUTY as u16);
    }
}

pub struct DespiBoard {
    lamps: [Output<'static>; Lamp::VARIANT_COUNT],
    buttons: [Input<'static>; Button::VARIANT_COUNT],
    adc: Adc<'static, ADC1>,
    potentiometer: PA4,
    violation_gauge: PwmGauge,
}

impl Board for DespiBoard {
    fn is_pressed(&mut self, button: Button) -> bool {
        // pull-ups, so a pressed button reads low
        self.buttons[button.ordinal()].is_low()
    }

    async fn read_potentiometer(&mut self) -> u16 {
        self.adc.read(&mut self.potentiometer).await >> ADC_DOWNSHIFT
    }

    fn set_lamp(&mut self, lamp: Lamp, on: bool) {
        let high = on != ACTIVE_LOWS[lamp.ordinal()];
        self.lamps[lamp.ordinal()].set_level(if high { Level::High } else { Level::Low });
    }

    fn set_violation_duty(&mut self, duty: u8) {
        self.violation_gauge.set_duty(duty);
    }
}

pub struct Io {
    pub board: DespiBoard,
    pub barrier_a: ExtiInput<'static>,
    pub barrier_b: ExtiInput<'static>,
    pub speed_gauge: PwmGauge,
}

fn dark(lamp: Lamp) -> Level {
    if ACTIVE_LOWS[lamp.ordinal()] {
        Level::High
    } else {
        Level::Low
    }
}

pub fn init() -> Io {
    let peripherals = embassy_stm32::init(Default::default());

    // Same order as `Lamp`.
    let lamps: [Output; Lamp::VARIANT_COUNT] = [
        Output::new(peripherals.PB14.degrade(), dark(Lamp::Green), Speed::Low),
        Output::new(peripherals.PB12.degrade(), dark(Lamp::Yellow), Speed::Low),
        Output::new(peripherals.PB10.degrade(), dark(Lamp::Red), Speed::Low),
        Output::new(peripherals.PE12.degrade(), dark(Lamp::Indicator), Speed::Low),
        Output::new(peripherals.PE1.degrade(), dark(Lamp::Flasher), Speed::Low),
    ];

    // Same order as `Button`.
    let buttons: [Input; Button::VARIANT_COUNT] = [
        Input::new(peripherals.PE11.degrade(), Pull::Up),
        Input::new(peripherals.PE10.degrade(), Pull::Up),
    ];

    let barrier_a = ExtiInput::new(
        peripherals.PE2.degrade(),
        peripherals.EXTI2.degrade(),
        Pull::Up,
    );
    let barrier_b = ExtiInput::new(
        peripherals.PE3.degrade(),
        peripherals.EXTI3.degrade(),
        Pull::Up,
    );

    let pwm = SimplePwm::new(
        peripherals.TIM3,
        Some(PwmPin::new_ch1(peripherals.PA6, OutputType::PushPull)),
        Some(PwmPin::new_ch2(peripherals.PA7, OutputType::PushPull)),
        None,
        None,
        khz(1),
        CountingMode::EdgeAlignedUp,
    );
    let mut channels = pwm.split();
    channels.ch1.enable();
    channels.ch2.enable();

    Io {
        board: DespiBoard {
            lamps,
            buttons,
            adc: Adc::new(peripherals.ADC1),
            potentiometer: peripherals.PA4,
            violation_gauge: PwmGauge(channels.ch2),
        },
        barrier_a,
        barrier_b,
        speed_gauge: PwmGauge(channels.ch1),
    }
}

#[embassy_executor::task]
pub async fn tick_task(ticks: &'static TickCounters) -> ! {
    let mut ticker = Ticker::every(Duration::from_millis(TICK_MILLIS));
    loop {
        ticker.next().await;
        ticks.tick();
    }
}

// Owns the speed sensor, so barrier events never race each other.
#[embassy_executor::task]
pub async fn barrier_task(
    mut barrier_a: ExtiInput<'static>,
    mut barrier_b: ExtiInput<'static>,
    mut speed_gauge: PwmGauge,
    ticks: &'static TickCounters,
) -> ! {
    let mut sensor = SpeedSensor::new();

    loop {
        let barrier = match select(
            barrier_a.wait_for_falling_edge(),
            barrier_b.wait_for_falling_edge(),
        )
        .await
        {
            Either::First(_) => Barrier::A,
            Either::Second(_) => Barrier::B,
        };
        sensor.measure(barrier, ticks, &mut speed_gauge);
    }
}
