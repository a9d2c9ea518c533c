//! Staging and syscall invocation, per SPEC_FULL §4.5. Grounded on
//! `program_flash_generic_rp2040.c`'s SFDP/JEDEC flash-size probing shape
//! (`flash_size_log2`) for what the blob's `flash_size()` export does, and
//! on `swd_flash_syscall_exec` in `swd_host.c` for the calling convention,
//! which lives one layer down in [`crate::swd::SwdHost::flash_syscall_exec`].

use crate::error::{FlashError, LinkError};
use crate::family::TargetFamily;
use crate::swd::{SwdHost, SwdIo};

use super::blob::FlashBlob;

const SECTOR_SIZE: u32 = 64 * 1024;
/// Covers up to 16 MiB of flash (256 sectors); matches the largest QSPI
/// NOR parts the RP2040/RP2350 boot path supports.
const MAX_SECTORS: usize = 256;

pub const RESULT_ERASED: u32 = 1 << 0;
pub const RESULT_PROGRAMMED: u32 = 1 << 1;
pub const RESULT_VERIFY_FAILED: u32 = 1 << 31;
pub const RESULT_ILLEGAL_ADDRESS: u32 = 1 << 30;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashResult(pub u32);

impl FlashResult {
    pub fn erased(self) -> bool {
        self.0 & RESULT_ERASED != 0
    }
    pub fn programmed(self) -> bool {
        self.0 & RESULT_PROGRAMMED != 0
    }
    pub fn verify_failed(self) -> bool {
        self.0 & RESULT_VERIFY_FAILED != 0
    }
    pub fn illegal_address(self) -> bool {
        self.0 & RESULT_ILLEGAL_ADDRESS != 0
    }
    pub fn is_error(self) -> bool {
        self.0 & 0xF000_0000 != 0
    }
}

/// Arguments passed to the blob's two exported entry points, by
/// convention: `flash_size()` takes no args; `flash_block(addr, src, len)`
/// takes three.
enum Syscall {
    FlashSize,
    FlashBlock { addr: u32, src: u32, len: u32 },
}

pub struct FlashProgrammer<'a> {
    blob: FlashBlob<'a>,
    load_addr: u32,
    flash_base: u32,
    staged: bool,
}

impl<'a> FlashProgrammer<'a> {
    pub fn new(blob: FlashBlob<'a>, load_addr: u32, flash_base: u32) -> Self {
        FlashProgrammer {
            blob,
            load_addr,
            flash_base,
            staged: false,
        }
    }

    /// Begin a new programming session: force a fresh `stage()` on the
    /// next call, which re-copies the whole blob image (including its
    /// zero-initialized `TARGET_RP2040_ERASE_MAP`) into target RAM, so
    /// every sector is (re-)erased on first write this session.
    pub fn begin_session(&mut self) {
        self.staged = false;
    }

    /// Bounds-check against the largest flash this programmer will ever
    /// address; doesn't require knowing the actual device size (that's
    /// `flash_size()`'s job).
    fn addr_in_range(&self, addr: u32) -> bool {
        match addr.checked_sub(self.flash_base) {
            Some(rel) => rel < MAX_SECTORS as u32 * SECTOR_SIZE,
            None => false,
        }
    }

    /// Copy the blob into target RAM, once per session.
    pub fn stage<T: SwdIo, F: TargetFamily>(
        &mut self,
        host: &mut SwdHost<T>,
        family: &F,
    ) -> Result<(), FlashError> {
        if self.staged {
            return Ok(());
        }
        host.write_memory(family.apsel(), self.load_addr, self.blob.code)?;
        self.staged = true;
        Ok(())
    }

    fn invoke<T: SwdIo, F: TargetFamily>(
        &mut self,
        host: &mut SwdHost<T>,
        family: &F,
        call: Syscall,
    ) -> Result<u32, FlashError> {
        let args = match call {
            Syscall::FlashSize => [0, 0, 0, 0],
            Syscall::FlashBlock { addr, src, len } => [addr, src, len, 0],
        };
        let result = host.flash_syscall_exec(
            family.apsel(),
            self.blob.entry(self.load_addr),
            self.blob.static_base(self.load_addr),
            self.blob.stack_top(self.load_addr),
            self.blob.breakpoint(self.load_addr),
            args,
        );
        match result {
            Ok(r0) => Ok(r0),
            Err(LinkError::SyscallFailed) => Err(FlashError::Link(LinkError::SyscallFailed)),
            Err(e) => Err(e.into()),
        }
    }

    /// Probe the external flash device's size (SFDP, falling back to
    /// JEDEC ID), in bytes. 0 means detection failed.
    pub fn flash_size<T: SwdIo, F: TargetFamily>(
        &mut self,
        host: &mut SwdHost<T>,
        family: &F,
    ) -> Result<u32, FlashError> {
        self.stage(host, family)?;
        let size = self.invoke(host, family, Syscall::FlashSize)?;
        if size == 0 {
            Err(FlashError::NoFlashDetected)
        } else {
            Ok(size)
        }
    }

    /// Erase (if needed), program, and verify one write, in a single
    /// target-side RPC. `addr` must fall inside a sector the blob can
    /// erase; `src_in_ram` is the address in target RAM the payload was
    /// already copied to (the UF2/MSC glue's responsibility, upstream of
    /// this call).
    ///
    /// The blob tracks which sectors it has already erased this session
    /// in its own resident `TARGET_RP2040_ERASE_MAP` bitmap (cleared by
    /// `stage()` re-copying the blob's zeroed data section), so erase,
    /// program and verify are one combined call rather than separate
    /// host-orchestrated steps.
    pub fn flash_block<T: SwdIo, F: TargetFamily>(
        &mut self,
        host: &mut SwdHost<T>,
        family: &F,
        addr: u32,
        src_in_ram: u32,
        len: u32,
    ) -> Result<FlashResult, FlashError> {
        if !self.addr_in_range(addr) {
            return Ok(FlashResult(RESULT_ILLEGAL_ADDRESS));
        }

        self.stage(host, family)?;

        let result = self.invoke(
            host,
            family,
            Syscall::FlashBlock {
                addr,
                src: src_in_ram,
                len,
            },
        )?;

        // Per the calling convention: the blob returns 0 on success or a
        // pointer past the verify buffer (arg1 + arg2) when it reports
        // "verified up to here"; anything else is a failure. The blob
        // itself decides whether the destination sector needed erasing
        // first, so a successful call always reports both flags set.
        if result != 0 && result != src_in_ram.wrapping_add(len) {
            return Ok(FlashResult(RESULT_VERIFY_FAILED));
        }

        Ok(FlashResult(RESULT_ERASED | RESULT_PROGRAMMED))
    }
}
