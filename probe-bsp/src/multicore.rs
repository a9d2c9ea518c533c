//! Core 1 spawn helper, grounded on `rp2040_hal::multicore`'s documented
//! `Multicore`/`Stack` pattern. There is no teacher-side counterpart (the
//! STM32 reference runs a single bare superloop); this realizes the
//! two-core split the concurrency model calls for, with core 1 running
//! the RTT engine continuously at low priority while core 0's superloop
//! handles USB/DAP/MSC.

use rp2040_hal::multicore::{Multicore, Stack};
use rp2040_hal::pac::{PPB, PSM};
use rp2040_hal::sio::SioFifo;

static mut CORE1_STACK: Stack<4096> = Stack::new();

/// Spawns `entry` on core 1. `entry` never returns; it is expected to run
/// the RTT polling loop for the lifetime of the device.
pub fn spawn_core1(psm: &mut PSM, ppb: &mut PPB, fifo: &mut SioFifo, entry: fn() -> !) {
    let mut mc = Multicore::new(psm, ppb, fifo);
    let cores = mc.cores();
    let core1 = &mut cores[1];
    let stack = unsafe { &mut *core::ptr::addr_of_mut!(CORE1_STACK) };
    core1.spawn(stack.take().unwrap(), entry).expect("core 1 spawn failed");
}
