//! RP2350 family policy. Shares RP2040's dual-core attach shape but the
//! secondary core's AP selector is a fixed, vendor-documented constant
//! quoted from OpenOCD with no public derivation. Per SPEC_FULL §9 / the
//! spec's open questions this is kept as an opaque constant, flagged in
//! DESIGN.md as needing hardware-in-the-loop confirmation.

use super::TargetFamily;
use crate::error::LinkError;
use crate::swd::{SwdHost, SwdIo};
use crate::uf2::RP2350_ARM_S_FAMILY_ID;

/// Quoted from OpenOCD's rp2350 target config; not independently derived.
pub const CORE1_APSEL_RP2350: u8 = 0x4d;

const RT_UF2_IDS: [u32; 1] = [RP2350_ARM_S_FAMILY_ID];

pub struct Rp2350Family {
    apsel: u8,
    core1_apsel: u8,
}

impl Rp2350Family {
    pub const fn new() -> Self {
        Rp2350Family {
            apsel: 0,
            core1_apsel: CORE1_APSEL_RP2350,
        }
    }
}

impl Default for Rp2350Family {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetFamily for Rp2350Family {
    fn family_id(&self) -> u16 {
        0x2350
    }

    fn apsel(&self) -> u8 {
        self.apsel
    }

    fn select_core(&mut self, core: u8) {
        self.apsel = core;
    }

    fn held_core_halted_across_program<T: SwdIo>(
        &mut self,
        host: &mut SwdHost<T>,
    ) -> Result<(), LinkError> {
        const DHCSR: u32 = 0xE000_EDF0;
        const DBGKEY: u32 = 0xA05F_0000;
        const C_DEBUGEN: u32 = 1 << 0;
        const C_HALT: u32 = 1 << 1;
        host.write_word(self.core1_apsel, DHCSR, DBGKEY | C_DEBUGEN | C_HALT)?;
        host.wait_until_halted(self.core1_apsel)
    }

    fn rt_uf2_ids(&self) -> &[u32] {
        &RT_UF2_IDS
    }
}
