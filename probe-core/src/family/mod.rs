//! Component G: target family policy. A narrow polymorphism surface
//! modeled as a trait with per-family implementations, per SPEC_FULL §9's
//! redesign note (sum type + small trait, not a function-pointer table).

mod generic;
mod rp2040;
mod rp2350;

pub use generic::GenericCortexM;
pub use rp2040::Rp2040Family;
pub use rp2350::Rp2350Family;

use crate::error::LinkError;
use crate::swd::{SwdHost, SwdIo};

pub trait TargetFamily {
    fn family_id(&self) -> u16;

    /// Current AP selector; multi-core families rewrite this to switch
    /// which core's AP subsequent B operations target.
    fn apsel(&self) -> u8;

    /// Select which core's AP is active (no-op for single-core families).
    fn select_core(&mut self, core: u8);

    /// Drive the reset pin through the transport's reset line, or perform a
    /// vendor-specific software reset if the family has no dedicated
    /// reset line. The default just forwards to `SwdIo::assert_reset`.
    fn reset<T: SwdIo>(&mut self, host: &mut SwdHost<T>, assert: bool) {
        host.io_mut().assert_reset(assert);
    }

    /// Hook run after CDBG/CSYS power-up but before DHCSR.C_DEBUGEN is set.
    /// Default: nothing (most families need no extra attach step beyond
    /// the canonical dormant-wake/line-reset sequence `SwdHost` already
    /// performs).
    fn before_init_debug<T: SwdIo>(&mut self, _host: &mut SwdHost<T>) -> Result<(), LinkError> {
        Ok(())
    }

    /// nRF-style debug-lock recovery sequence; default no-op.
    fn unlock_sequence<T: SwdIo>(&mut self, _host: &mut SwdHost<T>) -> Result<(), LinkError> {
        Ok(())
    }

    /// Called once a `RESET_PROGRAM` transition has halted the active
    /// core; multi-core families use this to also halt their secondary
    /// core so it stays parked across programming.
    fn held_core_halted_across_program<T: SwdIo>(
        &mut self,
        _host: &mut SwdHost<T>,
    ) -> Result<(), LinkError> {
        Ok(())
    }

    /// Family ids this target accepts in a UF2 block's family-id field.
    fn rt_uf2_ids(&self) -> &[u32];
}
