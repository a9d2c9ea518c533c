use crate::dap::command_length::{command_length, LengthResult};

fn assert_complete(buf: &[u8], expected: usize) {
    assert_eq!(command_length(buf), LengthResult::Complete(expected));
    assert_eq!(expected, buf.len(), "length must match the buffer that was actually serialized");
}

#[test]
fn fixed_length_commands() {
    assert_complete(&[0x00, 0x01], 2); // Info
    assert_complete(&[0x03], 1); // Disconnect
    assert_complete(&[0x09, 0x34, 0x12], 3); // Delay
    assert_complete(&[0x08, 0x00, 1, 2, 3, 4], 6); // WriteAbort
    assert_complete(&[0x04, 0x00, 1, 0, 2, 0], 6); // TransferConfigure
    assert_complete(&[0x10, 0x00, 0x00, 1, 2, 3, 4], 7); // SwjPins
    assert_complete(&[0x11, 1, 2, 3, 4], 5); // SwjClock
}

#[test]
fn swj_sequence_length_follows_bit_count_with_zero_meaning_256() {
    // 8 bits -> 1 byte of sequence data.
    assert_complete(&[0x12, 8, 0xFF], 3);
    // n == 0 means 256 bits -> 32 bytes.
    let mut buf = vec![0x12u8, 0];
    buf.extend(core::iter::repeat(0u8).take(32));
    assert_complete(&buf, 2 + 32);
}

#[test]
fn swd_sequence_length_sums_per_descriptor_output_bytes() {
    // One descriptor: info byte with count=8, output direction (bit7 clear).
    let buf = [0x1D, 1, 0x08, 0xAA];
    assert_complete(&buf, 4);

    // Input direction (bit7 set) contributes no payload bytes.
    let buf = [0x1D, 1, 0x88];
    assert_complete(&buf, 3);

    // count field 0 means 64 bits -> 8 bytes, output direction.
    let mut buf = vec![0x1Du8, 1, 0x00];
    buf.extend(core::iter::repeat(0u8).take(8));
    assert_complete(&buf, 3 + 8);
}

#[test]
fn transfer_length_accounts_for_write_and_match_value_words() {
    // One descriptor: a read with no match value -> just the request byte.
    let buf = [0x05, 0x00, 1, 0x02];
    assert_complete(&buf, 4);

    // One descriptor: a write -> request byte + 4 data bytes.
    let buf = [0x05, 0x00, 1, 0x00, 1, 2, 3, 4];
    assert_complete(&buf, 8);

    // One descriptor: a read with match value set -> request byte + 4 match bytes.
    let buf = [0x05, 0x00, 1, 0x12, 1, 2, 3, 4];
    assert_complete(&buf, 8);
}

#[test]
fn transfer_block_length_is_header_plus_n_words_for_writes_only() {
    // Write of 2 words.
    let buf = [0x06, 0x00, 2, 0, 0x00, 1, 2, 3, 4, 5, 6, 7, 8];
    assert_complete(&buf, 5 + 8);

    // Read of 2 words carries no payload.
    let buf = [0x06, 0x00, 2, 0, 0x02];
    assert_complete(&buf, 5);
}

#[test]
fn execute_commands_length_is_recursive_sum() {
    // Two sub-commands: Disconnect (1 byte) + SwjClock (5 bytes).
    let buf = [0x7E, 2, 0x03, 0x11, 1, 2, 3, 4];
    assert_complete(&buf, 2 + 1 + 5);
}

#[test]
fn need_more_when_length_cannot_yet_be_determined() {
    assert_eq!(command_length(&[]), LengthResult::NeedMore);
    assert_eq!(command_length(&[0x12]), LengthResult::NeedMore); // SwjSequence missing count byte
    assert_eq!(command_length(&[0x05, 0x00]), LengthResult::NeedMore); // Transfer missing count byte
    assert_eq!(command_length(&[0x05, 0x00, 1]), LengthResult::NeedMore); // missing the one descriptor byte
}

#[test]
fn vendor_and_unknown_opcodes_are_one_byte() {
    assert_complete(&[0x80], 1);
    assert_complete(&[0xFE], 1);
    assert_complete(&[0xFF], 1); // Invalid
}
