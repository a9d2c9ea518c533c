//! Fallback family for any Cortex-M target with no family-specific quirks:
//! plain line-reset attach, a single AP, no unlock sequence. Selected when
//! none of the probe's supported families' vendor-ID probes match.

use super::TargetFamily;

pub struct GenericCortexM {
    apsel: u8,
}

impl GenericCortexM {
    pub const fn new() -> Self {
        GenericCortexM { apsel: 0 }
    }
}

impl Default for GenericCortexM {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetFamily for GenericCortexM {
    fn family_id(&self) -> u16 {
        0x0000
    }

    fn apsel(&self) -> u8 {
        self.apsel
    }

    fn select_core(&mut self, _core: u8) {}

    fn rt_uf2_ids(&self) -> &[u32] {
        &[]
    }
}
