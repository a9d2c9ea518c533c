use super::mock_swd::{MockSwdIo, RAM_BASE};
use crate::family::GenericCortexM;
use crate::swd::{SwdHost, TargetState};

#[test]
fn write_word_then_read_word_round_trips() {
    let mut host = SwdHost::new(MockSwdIo::new());
    host.write_word(0, RAM_BASE + 0x40, 0xDEAD_BEEF).unwrap();
    let v = host.read_word(0, RAM_BASE + 0x40).unwrap();
    assert_eq!(v, 0xDEAD_BEEF);
}

#[test]
fn write_memory_then_read_memory_round_trips_aligned_span() {
    let mut host = SwdHost::new(MockSwdIo::new());
    let data: [u8; 64] = core::array::from_fn(|i| i as u8);
    host.write_memory(0, RAM_BASE + 0x100, &data).unwrap();

    let mut out = [0u8; 64];
    host.read_memory(0, RAM_BASE + 0x100, &mut out).unwrap();
    assert_eq!(out, data);
}

#[test]
fn write_memory_then_read_memory_round_trips_unaligned_span() {
    let mut host = SwdHost::new(MockSwdIo::new());
    let data: [u8; 13] = core::array::from_fn(|i| (i * 7) as u8);
    host.write_memory(0, RAM_BASE + 0x203, &data).unwrap();

    let mut out = [0u8; 13];
    host.read_memory(0, RAM_BASE + 0x203, &mut out).unwrap();
    assert_eq!(out, data);
}

#[test]
fn select_register_write_is_coalesced() {
    let mut host = SwdHost::new(MockSwdIo::new());
    host.write_dp(2, 0x1234).unwrap();
    // A second write of the identical value must be suppressed. We can't
    // observe the wire directly through the public API, but we can prove
    // it doesn't re-invalidate by checking a read still sees the same
    // select value (the mock stores whatever was last actually written).
    host.write_dp(2, 0x1234).unwrap();
    assert_eq!(host.read_dp(2).unwrap(), 0x1234);
}

#[test]
fn repeated_attach_is_a_no_op_after_first_success() {
    let mut host = SwdHost::new(MockSwdIo::new());
    let mut family = GenericCortexM::new();
    host.target_set_state(&mut family, TargetState::Attach).unwrap();
    assert!(host.is_attached());
    // Second attach must short-circuit; if it didn't, the mock's line
    // reset + jtag_to_swd sequence would still run harmlessly, so the
    // meaningful assertion is just that it still reports attached.
    host.target_set_state(&mut family, TargetState::Attach).unwrap();
    assert!(host.is_attached());
}

#[test]
fn core_register_write_then_read_round_trips() {
    let mut host = SwdHost::new(MockSwdIo::new());
    host.write_core_register(0, 0, 0x1111_2222).unwrap();
    let v = host.read_core_register(0, 0).unwrap();
    assert_eq!(v, 0x1111_2222);
}

#[test]
fn flash_syscall_exec_returns_r0_when_pc_reaches_breakpoint() {
    let mut host = SwdHost::new(MockSwdIo::new());
    let r0 = host
        .flash_syscall_exec(0, RAM_BASE + 0x10, RAM_BASE, RAM_BASE + 0x400, RAM_BASE + 0x20, [1, 2, 3, 4])
        .unwrap();
    // The mock never actually executes the blob, so R0 still holds
    // whatever `flash_syscall_exec` wrote as the first argument; the
    // property under test is that a PC landing on the breakpoint is
    // accepted rather than producing SyscallFailed.
    assert_eq!(r0, 1);
}
