#![no_std]

pub mod bootload;
pub mod clocks;
pub mod gpio;
pub mod multicore;
pub mod pio_swd;
pub mod uart;
