//! Component B: ADIv5/ADIv6 link and memory primitives built on a
//! [`SwdIo`] transport. Grounded on `examples/original_source/src/lib/
//! daplink/daplink/interface/swd_host.c` for wire sequencing
//! (`swd_read_ap`/`swd_write_ap`/`swd_write_block`/`swd_read_block`/
//! `swd_flash_syscall_exec`/`swd_set_target_state_hw`) and on the teacher's
//! `swd.rs` for the Rust request/ack shape (`Result<T, Error>`, bounded
//! retry loop, request-byte parity).

use super::dp::{APnDP, DPBankSel, DpRegister};
use super::transport::{Direction, SwdIo};
use crate::error::{LinkError, SwdError};
use crate::family::TargetFamily;

type Result<T> = core::result::Result<T, LinkError>;

const MAX_SWD_RETRY: usize = 100;
const MAX_HALT_POLL: usize = 1_000_000;
const MAX_REGRDY_POLL: usize = 100;

// Core debug registers (Armv6/7/8-M).
const DHCSR: u32 = 0xE000_EDF0;
const DCRSR: u32 = 0xE000_EDF4;
const DCRDR: u32 = 0xE000_EDF8;
const DEMCR: u32 = 0xE000_EDFC;
const AIRCR: u32 = 0xE000_ED0C;

const DBGKEY: u32 = 0xA05F_0000;
const C_DEBUGEN: u32 = 1 << 0;
const C_HALT: u32 = 1 << 1;
const S_REGRDY: u32 = 1 << 16;
const S_HALT: u32 = 1 << 17;

const VC_CORERESET: u32 = 1 << 0;

const AIRCR_VECTKEY: u32 = 0x05FA_0000;
const AIRCR_SYSRESETREQ: u32 = 1 << 2;

const CSW_SIZE32: u32 = 0x0000_0002;
const CSW_ADDRINC_SINGLE: u32 = 0x0000_0010;
const TAR_AUTOINCR_WINDOW: u32 = 0x0000_0400; // 1 KiB, per ADIv5 TAR wrap

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResetConnectPolicy {
    Normal,
    UnderReset,
}

/// Target state machine inputs, exactly the selector set in SPEC_FULL §4.2.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TargetState {
    ResetHold,
    ResetRun,
    ResetProgram,
    NoDebug,
    Debug,
    Halt,
    Run,
    PostFlashReset,
    PowerOn,
    Shutdown,
    Attach,
}

/// Owns B's cached selectors (§3: "Selected DP bank / selected AP / CSW
/// value"). Mutated only while the caller holds the arbiter; the caller is
/// responsible for that invariant, this type only implements the coalescing.
pub struct SwdHost<T: SwdIo> {
    io: T,
    cached_select: Option<DPBankSel>,
    cached_csw: Option<u32>,
    attached: bool,
    reset_connect: ResetConnectPolicy,
}

impl<T: SwdIo> SwdHost<T> {
    pub fn new(io: T) -> Self {
        SwdHost {
            io,
            cached_select: None,
            cached_csw: None,
            attached: false,
            reset_connect: ResetConnectPolicy::Normal,
        }
    }

    pub fn io_mut(&mut self) -> &mut T {
        &mut self.io
    }

    pub fn set_reset_connect_policy(&mut self, policy: ResetConnectPolicy) {
        self.reset_connect = policy;
    }

    /// Invalidate cached selectors; required whenever the bus is reset or
    /// power-cycled (§3 invariant), and whenever a different logical
    /// holder may have touched SELECT/CSW since this handle last held the
    /// bus (multicore sharing via the arbiter).
    pub fn invalidate_caches(&mut self) {
        self.cached_select = None;
        self.cached_csw = None;
    }

    // ---- Component A line-level sequences kept at this layer (they are
    // bus resets, not ADIv5 register transactions) ----

    fn line_reset(&mut self) {
        self.io.set_direction(Direction::Out);
        for _ in 0..4 {
            self.io.write_bits(32, 0xFFFF_FFFF);
        }
    }

    fn jtag_to_swd(&mut self) {
        // 16-bit magic sequence that switches a JTAG-or-SWD multi-drop pad
        // into SWD mode (ARM IHI0031).
        self.io.write_bits(16, 0xE79E);
    }

    // ---- swd_transfer primitive ----

    fn make_request(apndp: APnDP, read: bool, a: u8) -> u8 {
        let rnw = if read { 1u8 } else { 0u8 };
        let req = 1 | ((apndp as u8) << 1) | (rnw << 2) | ((a & 0x3) << 3) | (1 << 7);
        let parity = req.count_ones() & 1;
        req | ((parity as u8) << 5)
    }

    fn transfer_once(&mut self, apndp: APnDP, read: bool, a: u8, data: u32) -> Result<u32> {
        let req = Self::make_request(apndp, read, a);
        self.io.set_direction(Direction::Out);
        self.io.write_bits(8, req as u32);
        self.io.set_direction(Direction::In);
        self.io.hiz_clocks(1);
        let ack = self.io.read_bits(3) as u8;
        match ack {
            0b001 => {}
            0b010 => {
                self.io.set_direction(Direction::Out);
                self.io.hiz_clocks(1);
                return Err(SwdError::AckWait.into());
            }
            0b100 => {
                self.io.set_direction(Direction::Out);
                self.io.hiz_clocks(1);
                return Err(SwdError::AckFault.into());
            }
            _ => {
                self.io.hiz_clocks(32 + 1);
                self.io.set_direction(Direction::Out);
                return Err(SwdError::AckProtocol.into());
            }
        }

        if read {
            let lo = self.io.read_bits(32);
            let parity = self.io.read_bits(1);
            self.io.set_direction(Direction::Out);
            self.io.hiz_clocks(1);
            if parity == (lo.count_ones() & 1) {
                Ok(lo)
            } else {
                Err(SwdError::BadParity.into())
            }
        } else {
            self.io.hiz_clocks(1);
            self.io.set_direction(Direction::Out);
            let parity = data.count_ones() & 1;
            self.io.write_bits(32, data);
            self.io.write_bits(1, parity);
            Ok(0)
        }
    }

    fn transfer(&mut self, apndp: APnDP, read: bool, a: u8, data: u32) -> Result<u32> {
        for _ in 0..MAX_SWD_RETRY {
            match self.transfer_once(apndp, read, a, data) {
                Err(LinkError::Swd(SwdError::AckWait)) => continue,
                x => return x,
            }
        }
        Err(SwdError::AckWait.into())
    }

    // ---- register operations ----

    pub fn read_dp(&mut self, addr: u8) -> Result<u32> {
        self.transfer(APnDP::DP, true, addr, 0)
    }

    pub fn write_dp(&mut self, addr: u8, v: u32) -> Result<()> {
        if addr == DpRegister::SELECT as u8 {
            if self.cached_select.map(|s| s.0) == Some(v) {
                return Ok(());
            }
        }
        self.transfer(APnDP::DP, false, addr, v)?;
        if addr == DpRegister::SELECT as u8 {
            self.cached_select = Some(DPBankSel(v));
        }
        Ok(())
    }

    fn select_ap_bank(&mut self, apsel: u8, bank: u8) -> Result<()> {
        let dp_bank = self.cached_select.map(|s| (s.0 & 0xf) as u8).unwrap_or(0);
        let sel = DPBankSel::new(apsel, bank, dp_bank);
        self.write_dp(DpRegister::SELECT as u8, sel.0)
    }

    pub fn read_ap(&mut self, apsel: u8, addr: u8) -> Result<u32> {
        self.select_ap_bank(apsel, addr >> 4)?;
        // Posted-read semantics: the first read returns the *previous*
        // access's data; drain with RDBUFF.
        self.transfer(APnDP::AP, true, addr & 0xf, 0)?;
        self.read_dp(DpRegister::RDBUFF as u8)
    }

    pub fn write_ap(&mut self, apsel: u8, addr: u8, v: u32) -> Result<()> {
        self.select_ap_bank(apsel, addr >> 4)?;
        if addr & 0xf == 0x00 {
            if self.cached_csw == Some(v) {
                return Ok(());
            }
            self.transfer(APnDP::AP, false, addr & 0xf, v)?;
            self.cached_csw = Some(v);
            Ok(())
        } else {
            self.transfer(APnDP::AP, false, addr & 0xf, v).map(|_| ())
        }
    }

    // ---- memory operations ----

    const CSW: u8 = 0x00;
    const TAR: u8 = 0x04;
    const DRW: u8 = 0x0C;

    pub fn read_word(&mut self, apsel: u8, addr: u32) -> Result<u32> {
        self.write_ap(apsel, Self::CSW, CSW_SIZE32)?;
        self.write_ap(apsel, Self::TAR, addr)?;
        self.read_ap(apsel, Self::DRW)
    }

    pub fn write_word(&mut self, apsel: u8, addr: u32, v: u32) -> Result<()> {
        self.write_ap(apsel, Self::CSW, CSW_SIZE32)?;
        self.write_ap(apsel, Self::TAR, addr)?;
        self.write_ap(apsel, Self::DRW, v)
    }

    pub fn read_byte(&mut self, apsel: u8, addr: u32) -> Result<u8> {
        self.write_ap(apsel, Self::CSW, 0)?; // size8
        self.write_ap(apsel, Self::TAR, addr)?;
        let word = self.read_ap(apsel, Self::DRW)?;
        Ok((word >> ((addr & 3) << 3)) as u8)
    }

    pub fn write_byte(&mut self, apsel: u8, addr: u32, v: u8) -> Result<()> {
        self.write_ap(apsel, Self::CSW, 0)?;
        self.write_ap(apsel, Self::TAR, addr)?;
        let shift = (addr & 3) << 3;
        self.write_ap(apsel, Self::DRW, (v as u32) << shift)
    }

    /// Block read/write with auto-increment, split at the TAR
    /// auto-increment window boundary as required by ADIv5.
    pub fn read_memory(&mut self, apsel: u8, addr: u32, buf: &mut [u8]) -> Result<()> {
        let mut addr = addr;
        let mut off = 0usize;
        let len = buf.len();

        while off < len && (addr & 3) != 0 && off < len {
            buf[off] = self.read_byte(apsel, addr)?;
            addr += 1;
            off += 1;
        }

        while off + 4 <= len {
            let window_remaining = TAR_AUTOINCR_WINDOW - (addr % TAR_AUTOINCR_WINDOW);
            let words_in_window = (window_remaining / 4).max(1) as usize;
            let words_left = (len - off) / 4;
            let chunk_words = words_in_window.min(words_left);

            self.write_ap(apsel, Self::CSW, CSW_SIZE32 | CSW_ADDRINC_SINGLE)?;
            self.write_ap(apsel, Self::TAR, addr)?;
            // Posted-read: the first AP read only primes the pipeline (its
            // own data phase carries whatever was pending before this
            // sequence, not this word). Each subsequent AP read's data
            // phase then carries the *previous* read's word; the final
            // word only surfaces once more via an explicit RDBUFF read.
            self.transfer(APnDP::AP, true, Self::DRW & 0xf, 0)?;
            for i in 0..chunk_words - 1 {
                let word = self.transfer(APnDP::AP, true, Self::DRW & 0xf, 0)?;
                buf[off + i * 4..off + i * 4 + 4].copy_from_slice(&word.to_le_bytes());
            }
            let word = self.read_dp(DpRegister::RDBUFF as u8)?;
            buf[off + (chunk_words - 1) * 4..off + chunk_words * 4].copy_from_slice(&word.to_le_bytes());
            addr += (chunk_words * 4) as u32;
            off += chunk_words * 4;
        }

        while off < len {
            buf[off] = self.read_byte(apsel, addr)?;
            addr += 1;
            off += 1;
        }

        Ok(())
    }

    pub fn write_memory(&mut self, apsel: u8, addr: u32, buf: &[u8]) -> Result<()> {
        let mut addr = addr;
        let mut off = 0usize;
        let len = buf.len();

        while off < len && (addr & 3) != 0 {
            self.write_byte(apsel, addr, buf[off])?;
            addr += 1;
            off += 1;
        }

        while off + 4 <= len {
            let window_remaining = TAR_AUTOINCR_WINDOW - (addr % TAR_AUTOINCR_WINDOW);
            let words_in_window = (window_remaining / 4).max(1) as usize;
            let words_left = (len - off) / 4;
            let chunk_words = words_in_window.min(words_left);

            self.write_ap(apsel, Self::CSW, CSW_SIZE32 | CSW_ADDRINC_SINGLE)?;
            self.write_ap(apsel, Self::TAR, addr)?;
            for i in 0..chunk_words {
                let word = u32::from_le_bytes([
                    buf[off + i * 4],
                    buf[off + i * 4 + 1],
                    buf[off + i * 4 + 2],
                    buf[off + i * 4 + 3],
                ]);
                self.transfer(APnDP::AP, false, Self::DRW & 0xf, word)?;
            }
            addr += (chunk_words * 4) as u32;
            off += chunk_words * 4;
        }

        while off < len {
            self.write_byte(apsel, addr, buf[off])?;
            addr += 1;
            off += 1;
        }

        Ok(())
    }

    // ---- core register access via DCRSR/DHCSR/DCRDR ----

    pub fn read_core_register(&mut self, apsel: u8, reg: u8) -> Result<u32> {
        self.write_word(apsel, DCRSR, reg as u32)?;
        self.poll_regrdy(apsel)?;
        self.read_word(apsel, DCRDR)
    }

    pub fn write_core_register(&mut self, apsel: u8, reg: u8, value: u32) -> Result<()> {
        self.write_word(apsel, DCRDR, value)?;
        self.write_word(apsel, DCRSR, (reg as u32) | (1 << 16))?;
        self.poll_regrdy(apsel)
    }

    fn poll_regrdy(&mut self, apsel: u8) -> Result<()> {
        for _ in 0..MAX_REGRDY_POLL {
            let dhcsr = self.read_word(apsel, DHCSR)?;
            if dhcsr & S_REGRDY != 0 {
                return Ok(());
            }
        }
        Err(LinkError::Timeout)
    }

    pub fn wait_until_halted(&mut self, apsel: u8) -> Result<()> {
        for _ in 0..MAX_HALT_POLL {
            let dhcsr = self.read_word(apsel, DHCSR)?;
            if dhcsr & S_HALT != 0 {
                return Ok(());
            }
        }
        Err(LinkError::Timeout)
    }

    // ---- flash syscall invocation (component E's primitive on B) ----

    /// Set up registers per the calling convention and run to the
    /// breakpoint. `args` fills R0..R3 (fewer than 4 are zero-padded).
    /// Returns R0 on exit. Caller compares against the expected result.
    pub fn flash_syscall_exec(
        &mut self,
        apsel: u8,
        entry: u32,
        static_base: u32,
        stack_top: u32,
        breakpoint: u32,
        args: [u32; 4],
    ) -> Result<u32> {
        const R0: u8 = 0;
        const R1: u8 = 1;
        const R2: u8 = 2;
        const R3: u8 = 3;
        const R9: u8 = 9;
        const R13_SP: u8 = 13;
        const R14_LR: u8 = 14;
        const R15_PC: u8 = 15;
        const XPSR: u8 = 16;
        const THUMB_BIT: u32 = 1 << 24;

        self.write_core_register(apsel, R0, args[0])?;
        self.write_core_register(apsel, R1, args[1])?;
        self.write_core_register(apsel, R2, args[2])?;
        self.write_core_register(apsel, R3, args[3])?;
        self.write_core_register(apsel, R9, static_base)?;
        self.write_core_register(apsel, R13_SP, stack_top)?;
        self.write_core_register(apsel, R14_LR, breakpoint)?;
        self.write_core_register(apsel, R15_PC, entry)?;
        self.write_core_register(apsel, XPSR, THUMB_BIT)?;

        // Unhalt with interrupts masked (C_MASKINTS | C_DEBUGEN, no C_HALT).
        self.write_word(apsel, DHCSR, DBGKEY | C_DEBUGEN | (1 << 3))?;

        self.wait_until_halted(apsel)?;

        let pc = self.read_core_register(apsel, R15_PC)?;
        if pc != breakpoint {
            return Err(LinkError::SyscallFailed);
        }
        self.read_core_register(apsel, R0)
    }

    // ---- target state machine ----

    /// Implements the §4.2 state machine. Family-specific behaviour
    /// (dormant-wake vs JTAG-to-SWD attach, whether a secondary core is
    /// held halted) is delegated to `family`.
    pub fn target_set_state<F: TargetFamily>(&mut self, family: &mut F, s: TargetState) -> Result<()> {
        let apsel = family.apsel();
        match s {
            TargetState::Attach => {
                if self.attached {
                    return Ok(());
                }
                self.line_reset();
                self.jtag_to_swd();
                self.line_reset();
                self.io.write_bits(8, 0x00);
                self.invalidate_caches();

                // Clear sticky errors (ABORT: STKERRCLR|STKCMPCLR|WDERRCLR|ORUNERRCLR).
                self.write_dp(0, 0x1E).ok();
                self.write_dp(DpRegister::SELECT as u8, 0)?;

                // Request CDBG/CSYS power-up, poll for ack.
                const CSYSPWRUPREQ: u32 = 1 << 30;
                const CDBGPWRUPREQ: u32 = 1 << 28;
                const CSYSPWRUPACK: u32 = 1 << 31;
                const CDBGPWRUPACK: u32 = 1 << 29;
                self.write_dp(DpRegister::CTRLSTAT as u8, CSYSPWRUPREQ | CDBGPWRUPREQ)?;
                let mut acked = false;
                for _ in 0..100 {
                    let v = self.read_dp(DpRegister::CTRLSTAT as u8)?;
                    if v & (CSYSPWRUPACK | CDBGPWRUPACK) == (CSYSPWRUPACK | CDBGPWRUPACK) {
                        acked = true;
                        break;
                    }
                }
                if !acked {
                    return Err(LinkError::Timeout);
                }

                family.before_init_debug(self)?;
                self.write_word(apsel, DHCSR, DBGKEY | C_DEBUGEN)?;
                family.unlock_sequence(self)?;
                self.attached = true;
                Ok(())
            }
            TargetState::Halt => {
                self.target_set_state(family, TargetState::Attach)?;
                self.write_word(apsel, DHCSR, DBGKEY | C_DEBUGEN | C_HALT)?;
                self.wait_until_halted(apsel)
            }
            TargetState::ResetProgram => {
                self.target_set_state(family, TargetState::Attach)?;
                self.target_set_state(family, TargetState::Halt)?;
                // Disable hardware breakpoints (FP_CTRL at 0xE0002000, clear ENABLE).
                self.write_word(apsel, 0xE000_2000, 0x3).ok();
                self.write_word(apsel, DEMCR, VC_CORERESET)?;
                self.write_word(apsel, AIRCR, AIRCR_VECTKEY | AIRCR_SYSRESETREQ)?;
                self.wait_until_halted(apsel)?;
                self.write_word(apsel, DEMCR, 0)?;
                family.held_core_halted_across_program(self)?;
                Ok(())
            }
            TargetState::ResetHold => {
                family.reset(self, true);
                Ok(())
            }
            TargetState::ResetRun => {
                family.reset(self, true);
                family.reset(self, false);
                const CSYSPWRUPREQ: u32 = 1 << 30;
                const CDBGPWRUPREQ: u32 = 1 << 28;
                let v = self.read_dp(DpRegister::CTRLSTAT as u8)?;
                self.write_dp(DpRegister::CTRLSTAT as u8, v & !CSYSPWRUPREQ)?;
                self.write_dp(DpRegister::CTRLSTAT as u8, v & !CSYSPWRUPREQ & !CDBGPWRUPREQ)?;
                self.io.set_direction(Direction::In);
                self.attached = false;
                Ok(())
            }
            TargetState::NoDebug => {
                self.write_word(apsel, DHCSR, DBGKEY)?;
                Ok(())
            }
            TargetState::Debug => self.target_set_state(family, TargetState::Attach),
            TargetState::Run => {
                self.write_word(apsel, DHCSR, DBGKEY)?;
                Ok(())
            }
            TargetState::PostFlashReset => {
                family.reset(self, true);
                family.reset(self, false);
                self.attached = false;
                Ok(())
            }
            TargetState::PowerOn => Ok(()),
            TargetState::Shutdown => {
                self.attached = false;
                self.invalidate_caches();
                Ok(())
            }
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}
