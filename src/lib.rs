#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible in the other modules.
mod fmt;

pub mod camera;
pub mod configuration;
pub mod constants;
pub mod controller;
pub mod debounce;
pub mod speed;
pub mod ticks;
pub mod trafficlight;
