use crate::config::RamWindow;
use crate::uf2::{self, Uf2Error, BLOCK_SIZE, MAGIC_END, MAGIC_START0, MAGIC_START1, RP2040_FAMILY_ID};

const FLASH: RamWindow = RamWindow {
    start: 0x1000_0000,
    end: 0x1010_0000,
};

fn block(target_addr: u32, block_no: u32, num_blocks: u32, flags: u32, family_or_size: u32) -> [u8; BLOCK_SIZE] {
    let mut raw = [0u8; BLOCK_SIZE];
    raw[0..4].copy_from_slice(&MAGIC_START0.to_le_bytes());
    raw[4..8].copy_from_slice(&MAGIC_START1.to_le_bytes());
    raw[8..12].copy_from_slice(&flags.to_le_bytes());
    raw[12..16].copy_from_slice(&target_addr.to_le_bytes());
    raw[16..20].copy_from_slice(&256u32.to_le_bytes());
    raw[20..24].copy_from_slice(&block_no.to_le_bytes());
    raw[24..28].copy_from_slice(&num_blocks.to_le_bytes());
    raw[28..32].copy_from_slice(&family_or_size.to_le_bytes());
    raw[BLOCK_SIZE - 4..].copy_from_slice(&MAGIC_END.to_le_bytes());
    raw
}

#[test]
fn well_formed_block_with_matching_family_id_is_accepted() {
    let raw = block(0x1000_1000, 0, 10, uf2::FLAG_FAMILY_ID_PRESENT, RP2040_FAMILY_ID);
    let parsed = uf2::parse(&raw, FLASH, &[RP2040_FAMILY_ID]).unwrap();
    assert_eq!(parsed.target_addr, 0x1000_1000);
    assert_eq!(parsed.block_no, 0);
    assert_eq!(uf2::payload(&raw).len(), 256);
}

#[test]
fn block_without_family_id_flag_skips_family_check() {
    let raw = block(0x1000_1000, 0, 10, 0, 0xDEAD_BEEF);
    assert!(uf2::parse(&raw, FLASH, &[RP2040_FAMILY_ID]).is_ok());
}

#[test]
fn bad_magic_is_rejected() {
    let mut raw = block(0x1000_1000, 0, 10, 0, 0);
    raw[0] = 0;
    assert_eq!(uf2::parse(&raw, FLASH, &[]), Err(Uf2Error::BadMagic));
}

#[test]
fn block_index_past_num_blocks_is_rejected() {
    let raw = block(0x1000_1000, 10, 10, 0, 0);
    assert_eq!(uf2::parse(&raw, FLASH, &[]), Err(Uf2Error::BadBlockIndex));
}

#[test]
fn target_address_outside_flash_window_is_rejected() {
    let raw = block(0x2000_0000, 0, 10, 0, 0);
    assert_eq!(uf2::parse(&raw, FLASH, &[]), Err(Uf2Error::OutOfBounds));
}

#[test]
fn mismatched_family_id_is_rejected() {
    let raw = block(0x1000_1000, 0, 10, uf2::FLAG_FAMILY_ID_PRESENT, 0x1111_1111);
    assert_eq!(
        uf2::parse(&raw, FLASH, &[RP2040_FAMILY_ID]),
        Err(Uf2Error::FamilyMismatch)
    );
}

#[test]
fn wrong_payload_size_is_rejected() {
    let mut raw = block(0x1000_1000, 0, 10, 0, 0);
    raw[16..20].copy_from_slice(&128u32.to_le_bytes());
    assert_eq!(uf2::parse(&raw, FLASH, &[]), Err(Uf2Error::BadPayloadSize));
}
