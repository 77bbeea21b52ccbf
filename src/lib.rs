//! Timer1 compare-channel scheduler and supporting drivers for the relay
//! remote control firmware.
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod drivers;
pub mod hal;
pub mod relay;
pub mod scheduler;

#[cfg(all(target_arch = "avr", feature = "hil_tests"))]
pub mod testing;

pub use scheduler::{Callback, Channel, ScheduleError, Timer1Scheduler};
