#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

// The firmware only exists for the bare-metal target. Host builds get a stub
// binary, so that the library and its tests build with a plain `cargo test`.

#[cfg(target_os = "none")]
mod io;

#[cfg(target_os = "none")]
use panic_halt as _;

#[cfg(all(target_os = "none", feature = "defmt"))]
use defmt_rtt as _;

#[cfg(target_os = "none")]
static TICKS: intersection::ticks::TickCounters = intersection::ticks::TickCounters::new();

#[cfg(target_os = "none")]
#[embassy_executor::main]
async fn main(spawner: embassy_executor::Spawner) {
    use embassy_time::Timer;
    use intersection::constants::POLL_INTERVAL_MILLIS;
    use intersection::controller::Controller;

    let io::Io {
        mut board,
        barrier_a,
        barrier_b,
        speed_gauge,
    } = io::init();

    spawner.spawn(io::tick_task(&TICKS)).unwrap();
    spawner
        .spawn(io::barrier_task(barrier_a, barrier_b, speed_gauge, &TICKS))
        .unwrap();

    #[cfg(feature = "defmt")]
    defmt::info!("intersection controller running");

    let mut controller = Controller::new();
    loop {
        controller.poll(&mut board, &TICKS).await;
        Timer::after_millis(POLL_INTERVAL_MILLIS).await;
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    eprintln!("despi-m02-intersection is firmware; build it with --target thumbv7m-none-eabi");
    std::process::exit(1);
}
