// Copyright 2019 Adam Greig
// Dual licensed under the Apache 2.0 and MIT licenses.

//! DFU's reset-into-bootloader path, grounded on the teacher's
//! `bootload()`/`check()` pair (flag-in-static-RAM, AIRCR SYSRESETREQ,
//! jump to the ROM at a fixed address) but collapsed to a single call:
//! the RP2040's boot ROM exposes `reset_to_usb_boot` directly, so there is
//! no flag to stash across a watchdog reset or a `pre_init` hook to check
//! it from.

/// Triggers a reset into the RP2040's USB mass-storage bootloader. `gpio_mask`
/// and `interface_mask` are passed straight to the ROM call; `0, 0` matches
/// the teacher's unconditional jump (no "only if a button is held" gating).
pub fn bootload() -> ! {
    rp2040_hal::rom_data::reset_to_usb_boot(0, 0);
    loop {
        cortex_m::asm::nop();
    }
}
