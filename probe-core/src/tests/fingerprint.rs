use crate::dap::fingerprint::{Fingerprinter, ToolVerdict};

#[test]
fn pyocd_pattern_latches_after_three_info_subcommands() {
    let mut f = Fingerprinter::new();
    f.observe_info(0xFE);
    assert_eq!(f.verdict(), ToolVerdict::Unknown);
    f.observe_info(0x04);
    f.observe_info(0xFF);
    assert_eq!(f.verdict(), ToolVerdict::PyOcd);
}

#[test]
fn openocd_pattern_latches() {
    let mut f = Fingerprinter::new();
    f.observe_info(0xF0);
    f.observe_info(0x04);
    f.observe_info(0x03);
    assert_eq!(f.verdict(), ToolVerdict::OpenOcd);
}

#[test]
fn probe_rs_pattern_latches() {
    let mut f = Fingerprinter::new();
    f.observe_info(0xFF);
    f.observe_info(0xFE);
    f.observe_info(0xF0);
    assert_eq!(f.verdict(), ToolVerdict::ProbeRs);
}

#[test]
fn unrecognized_triple_stays_unknown_and_is_sticky() {
    let mut f = Fingerprinter::new();
    f.observe_info(0x01);
    f.observe_info(0x02);
    f.observe_info(0x03);
    assert_eq!(f.verdict(), ToolVerdict::Unknown);

    // A verdict is only latched once per three observations; further
    // calls must not re-trigger matching against a fresh window, since
    // `seen` is already full and `observe_info` bails out early once a
    // (possibly Unknown) verdict exists... except Unknown is the default,
    // so this exercises that a full `seen` buffer doesn't panic on push.
    f.observe_info(0xFE);
}

#[test]
fn reset_clears_both_history_and_verdict() {
    let mut f = Fingerprinter::new();
    f.observe_info(0xFE);
    f.observe_info(0x04);
    f.observe_info(0xFF);
    assert_eq!(f.verdict(), ToolVerdict::PyOcd);
    f.reset();
    assert_eq!(f.verdict(), ToolVerdict::Unknown);
    f.observe_info(0xF0);
    f.observe_info(0x04);
    f.observe_info(0x03);
    assert_eq!(f.verdict(), ToolVerdict::OpenOcd);
}

#[test]
fn user_set_verdict_is_not_overwritten_by_later_observations() {
    let mut f = Fingerprinter::new();
    f.set_user_verdict();
    f.observe_info(0xFE);
    f.observe_info(0x04);
    f.observe_info(0xFF);
    assert_eq!(f.verdict(), ToolVerdict::UserSet);
}
