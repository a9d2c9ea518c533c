//! The target-resident code blob description, per SPEC_FULL §9's redesign
//! note: "target-resident code as a linker-section blob" is kept as a
//! concept but represented as a separately-assembled byte slice the probe
//! asks the linker for, never aliased against the probe's own text at
//! runtime.
//!
//! `probe-bsp` supplies the concrete byte slice (built out-of-band for the
//! target architecture and `include_bytes!`'d, or sourced from the
//! target's own bootrom per family — see `family::rp2040::BOOTROM_MAGIC`).
//! This type only knows the fixed ABI: single entry point, args in
//! registers, result in R0, ends in `bkpt`.

#[derive(Copy, Clone, Debug)]
pub struct FlashBlob<'a> {
    pub code: &'a [u8],
    /// Offset within `code` of the entry point.
    pub entry_offset: u32,
    /// Offset within `code` of the `bkpt` the invocation uses as LR.
    pub breakpoint_offset: u32,
    /// Size of the scratch RAM the blob needs for its own stack, laid out
    /// immediately after the staged code.
    pub stack_size: u32,
}

impl<'a> FlashBlob<'a> {
    pub fn entry(&self, load_addr: u32) -> u32 {
        load_addr + self.entry_offset
    }

    pub fn breakpoint(&self, load_addr: u32) -> u32 {
        load_addr + self.breakpoint_offset
    }

    pub fn static_base(&self, load_addr: u32) -> u32 {
        load_addr
    }

    pub fn stack_top(&self, load_addr: u32) -> u32 {
        load_addr + self.code.len() as u32 + self.stack_size
    }
}
