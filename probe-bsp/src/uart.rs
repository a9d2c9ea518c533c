// Copyright 2020 Adam Greig
// Dual licensed under the Apache 2.0 and MIT licenses.

//! Target UART passthrough, grounded on the teacher's DMA-circular-buffer
//! `UART` (same `last_idx`/wraparound `bytes_available`/`read` shape) but
//! fed by polling `rp2040_hal::uart::Reader` into the ring buffer from
//! `push_received()` instead of a DMA controller landing bytes directly;
//! `rp2040-hal`'s UART has no circular-DMA mode of its own, so the target
//! superloop is expected to call `push_received()` each pass with however
//! many bytes `Reader::read_raw` drained from the RX FIFO.

use core::cmp::Ordering;

pub struct Uart {
    buffer: [u8; 256],
    write_idx: usize,
    last_idx: usize,
    fck: u32,
}

impl Uart {
    pub fn new() -> Self {
        Uart {
            buffer: [0; 256],
            write_idx: 0,
            last_idx: 0,
            fck: 125_000_000,
        }
    }

    pub fn setup(&mut self, peripheral_clk_hz: u32) {
        self.fck = peripheral_clk_hz;
    }

    pub fn start(&mut self) {
        self.write_idx = 0;
        self.last_idx = 0;
    }

    /// Copies freshly-read target UART bytes into the ring buffer. Called
    /// from the polling loop in place of the teacher's DMA landing data on
    /// its own.
    pub fn push_received(&mut self, data: &[u8]) {
        for &byte in data {
            self.buffer[self.write_idx] = byte;
            self.write_idx = (self.write_idx + 1) % self.buffer.len();
        }
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Requests a target baud rate divider for `fugit`-free callers that
    /// configure `rp2040_hal::uart::UartPeripheral` directly via its own
    /// baud-rate API; kept only for parity with the teacher's API shape.
    pub fn calc_baud_divisor(&self, baud: u32) -> u32 {
        self.fck / baud.max(1)
    }

    /// Fetch current number of bytes available.
    pub fn bytes_available(&self) -> usize {
        let idx = self.write_idx;
        if idx >= self.last_idx {
            idx - self.last_idx
        } else {
            (self.buffer.len() - self.last_idx) + idx
        }
    }

    /// Read new UART data, same wraparound copy logic as the teacher's
    /// `UART::read`.
    pub fn read(&mut self, rx: &mut [u8]) -> usize {
        let idx = self.write_idx;

        match idx.cmp(&self.last_idx) {
            Ordering::Equal => 0,
            Ordering::Less => {
                let mut n1 = self.buffer.len() - self.last_idx;
                let mut n2 = idx;
                let mut new_last_idx = idx;

                if n1 > rx.len() {
                    n1 = rx.len();
                    n2 = 0;
                    new_last_idx = self.last_idx + n1;
                } else if (n1 + n2) > rx.len() {
                    n2 = rx.len() - n1;
                    new_last_idx = n2;
                }

                rx[..n1].copy_from_slice(&self.buffer[self.last_idx..self.last_idx + n1]);
                rx[n1..(n1 + n2)].copy_from_slice(&self.buffer[..n2]);

                self.last_idx = new_last_idx;
                n1 + n2
            }
            Ordering::Greater => {
                let mut n = idx - self.last_idx;
                if n > rx.len() {
                    n = rx.len();
                }
                rx[..n].copy_from_slice(&self.buffer[self.last_idx..self.last_idx + n]);
                self.last_idx += n;
                n
            }
        }
    }
}

impl Default for Uart {
    fn default() -> Self {
        Self::new()
    }
}
