//! UF2 block parsing and validation, per SPEC_FULL.md §3.1. Grounded on
//! `msc_utils.c`'s `msc_is_uf2_record`: a write is accepted only if both
//! magics and the end marker match, bounds fall inside the active target's
//! flash window, and (if the family-id flag is set) the family id is one
//! the active target family accepts.

pub const MAGIC_START0: u32 = 0x0A32_4655;
pub const MAGIC_START1: u32 = 0x9E5D_5157;
pub const MAGIC_END: u32 = 0x0AB1_6F30;
pub const FLAG_FAMILY_ID_PRESENT: u32 = 0x0000_2000;
pub const PAYLOAD_SIZE: usize = 256;
pub const BLOCK_SIZE: usize = 512;

pub const RP2040_FAMILY_ID: u32 = 0xe48b_ff56;
pub const RP2350_ARM_S_FAMILY_ID: u32 = 0xe48b_ff59;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Uf2Block {
    pub flags: u32,
    pub target_addr: u32,
    pub payload_size: u32,
    pub block_no: u32,
    pub num_blocks: u32,
    pub file_size_or_family_id: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Uf2Error {
    BadMagic,
    BadBlockIndex,
    BadPayloadSize,
    OutOfBounds,
    FamilyMismatch,
}

/// Parse and validate one 512-byte UF2 record against the active target's
/// flash window and accepted family ids. On success, returns the block
/// header plus the byte offset of its 256-byte payload within `raw`.
///
/// Per the error-handling design, a format error here is not fatal to the
/// session: the MSC driver still acknowledges the write (the filesystem
/// view is a fiction) and simply drops the record — this function only
/// reports the verdict, it does not panic or abort anything.
pub fn parse(raw: &[u8; BLOCK_SIZE], flash: crate::config::RamWindow, accepted_family_ids: &[u32]) -> Result<Uf2Block, Uf2Error> {
    let magic_start0 = le_u32(raw, 0);
    let magic_start1 = le_u32(raw, 4);
    let magic_end = le_u32(raw, BLOCK_SIZE - 4);
    if magic_start0 != MAGIC_START0 || magic_start1 != MAGIC_START1 || magic_end != MAGIC_END {
        return Err(Uf2Error::BadMagic);
    }

    let flags = le_u32(raw, 8);
    let target_addr = le_u32(raw, 12);
    let payload_size = le_u32(raw, 16);
    let block_no = le_u32(raw, 20);
    let num_blocks = le_u32(raw, 24);
    let file_size_or_family_id = le_u32(raw, 28);

    if block_no >= num_blocks {
        return Err(Uf2Error::BadBlockIndex);
    }
    if payload_size as usize != PAYLOAD_SIZE {
        return Err(Uf2Error::BadPayloadSize);
    }
    if !flash.contains(target_addr, payload_size) {
        return Err(Uf2Error::OutOfBounds);
    }
    if flags & FLAG_FAMILY_ID_PRESENT != 0 {
        if !accepted_family_ids.contains(&file_size_or_family_id) {
            return Err(Uf2Error::FamilyMismatch);
        }
    }

    Ok(Uf2Block {
        flags,
        target_addr,
        payload_size,
        block_no,
        num_blocks,
        file_size_or_family_id,
    })
}

/// Payload slice for a record already validated by [`parse`].
pub fn payload(raw: &[u8; BLOCK_SIZE]) -> &[u8] {
    &raw[32..32 + PAYLOAD_SIZE]
}

fn le_u32(raw: &[u8; BLOCK_SIZE], off: usize) -> u32 {
    u32::from_le_bytes([raw[off], raw[off + 1], raw[off + 2], raw[off + 3]])
}
