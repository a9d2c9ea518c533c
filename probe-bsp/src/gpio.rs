//! Board pin assignments, grounded on the teacher's `Pins` struct (same
//! field shapes: LED, reset, target UART, SWD pair) but built from
//! `rp2040_hal::gpio::Pins` typestate pins instead of `stm32ral`'s
//! register-level `GPIO`/`Pin` wrapper. The SWD pair and the reset pin are
//! handed off to [`crate::pio_swd::PioSwd`] as already-typed function
//! pins; everything else here is plain SIO.

use embedded_hal::digital::v2::OutputPin;
use rp2040_hal::gpio::bank0::{Gpio25, Gpio8, Gpio9};
use rp2040_hal::gpio::{FunctionSioOutput, FunctionUart, Pin, PullDown};

use crate::pio_swd::{ResetPin, SwclkPin, SwdioPin};

pub type LedPin = Pin<Gpio25, FunctionSioOutput, PullDown>;
pub type TargetUartTxPin = Pin<Gpio8, FunctionUart, PullDown>;
pub type TargetUartRxPin = Pin<Gpio9, FunctionUart, PullDown>;

/// The probe's fixed pin assignment. Unlike the teacher's STM32 board,
/// there is no GND-detect pin or dedicated T5V/TVCC power-enable pair on
/// the reference RP2040 layout this targets; the status LED is a single
/// pin rather than the teacher's RGB triple, since the LED animation task
/// itself is out of scope here and only the pin needs claiming.
pub struct Pins {
    pub led: LedPin,
    pub target_uart_tx: TargetUartTxPin,
    pub target_uart_rx: TargetUartRxPin,
}

impl Pins {
    /// Claims every board pin, handing the SWD trio back separately since
    /// those are owned by [`crate::pio_swd::PioSwd`] rather than this
    /// struct (the reset line is driven from inside the PIO transport, not
    /// as ordinary SIO).
    pub fn split(pins: rp2040_hal::gpio::Pins) -> (Self, SwclkPin, SwdioPin, ResetPin) {
        let p = Pins {
            led: pins.gpio25.into_push_pull_output(),
            target_uart_tx: pins.gpio8.into_function(),
            target_uart_rx: pins.gpio9.into_function(),
        };
        let swclk = pins.gpio2.into_function();
        let swdio = pins.gpio3.into_function();
        let reset = pins.gpio4.into_push_pull_output();
        (p, swclk, swdio, reset)
    }

    pub fn led_on(&mut self) {
        let _ = self.led.set_high();
    }

    pub fn led_off(&mut self) {
        let _ = self.led.set_low();
    }
}
