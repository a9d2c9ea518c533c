//! DP/AP register addressing, mirroring the teacher's `swd.rs` enums
//! (`DPRegister`, `APnDP`) generalized with the bank-select handling ADIv5
//! actually requires (the teacher only ever uses DP bank 0).

use num_enum::IntoPrimitive;

#[repr(u8)]
#[derive(Copy, Clone, Debug, IntoPrimitive)]
pub enum DpRegister {
    DPIDR = 0,
    CTRLSTAT = 1,
    SELECT = 2,
    RDBUFF = 3,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum APnDP {
    DP = 0,
    AP = 1,
}

impl From<bool> for APnDP {
    fn from(x: bool) -> APnDP {
        if x {
            APnDP::AP
        } else {
            APnDP::DP
        }
    }
}

/// The cached `SELECT` register value: APSEL (high byte) + AP bank (bits
/// 4..7) + DP bank (bits 0..3). Cached so repeated accesses to the same
/// bank suppress redundant `write_dp(SELECT, ..)` transactions (§8
/// idempotence: "write_dp(SELECT, v) followed by write_dp(SELECT, v) issues
/// at most one wire transaction").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DPBankSel(pub u32);

impl DPBankSel {
    pub fn new(apsel: u8, ap_bank: u8, dp_bank: u8) -> Self {
        DPBankSel(((apsel as u32) << 24) | (((ap_bank & 0xf) as u32) << 4) | (dp_bank & 0xf) as u32)
    }

    pub fn apsel(self) -> u8 {
        (self.0 >> 24) as u8
    }
}
