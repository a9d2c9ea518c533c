//! Component A's contract, kept as a trait so `SwdHost` is generic over the
//! concrete PIO transport. `probe-bsp::pio_swd::PioSwd` is the hardware
//! implementation; `probe-core`'s tests use a small in-memory fake.
//!
//! Mirrors the two-program, direction-switched PIO engine described in
//! `original_source/src/probe.c` (`probe_write_bits`/`probe_read_bits`/
//! `probe_read_mode`/`probe_write_mode`): writes push `n-1` then the data
//! word into the TX FIFO; reads push `n-1` and pop a result word from the
//! RX FIFO; direction changes busy-wait on the pad output-enable bit before
//! returning.

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Out,
    In,
}

pub trait SwdIo {
    /// Set the half-bit clock period from a requested kHz rate. The actual
    /// rate may be the nearest achievable divisor; implementations should
    /// cache the divisor and skip reprogramming the IO engine when the
    /// requested rate matches the cached one (§8 idempotence).
    fn set_clock(&mut self, khz: u32);

    /// Drive `n` bits of `bits` (1..=32, LSB-first) on falling clock edges
    /// and block until the engine has ingested them.
    fn write_bits(&mut self, n: u8, bits: u32);

    /// Sample `n` bits (1..=32) on rising clock edges, returned
    /// right-aligned.
    fn read_bits(&mut self, n: u8) -> u32;

    /// Drive `n` clock edges with the data line Hi-Z (SWD turnaround).
    fn hiz_clocks(&mut self, n: u8);

    /// Switch the data line's drive direction; blocks until the pad
    /// output-enable reflects the new state.
    fn set_direction(&mut self, dir: Direction);

    /// Assert (drive low) or deassert (tri-state, pull-up) the reset line.
    fn assert_reset(&mut self, asserted: bool);
}
