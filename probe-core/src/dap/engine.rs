//! Command dispatch. Grounded on the teacher's `dap.rs` `DAP::
//! process_command` match-based dispatcher and its per-command
//! `process_*` helpers, generalized from the teacher's fixed SWD-only
//! command set to the opcode table [`command_length`](super::command_length)
//! decodes, and wired to [`SwdHost`]/[`Arbiter`] instead of the teacher's
//! direct SPI peripheral.
//!
//! Unlike the teacher, the host isn't owned here: the RP2040 split runs
//! this engine on core 0 and the RTT engine on core 1 against the same
//! physical SWD bus, so `SwdHost` is passed in per call and arbitrated by
//! [`Arbiter`] rather than owned by whichever engine happens to exist.

use core::convert::TryFrom;

use super::command_length::Command;
use super::fingerprint::{Fingerprinter, ToolVerdict};
use super::request::Request;
use super::response::ResponseWriter;
use crate::arbiter::{Arbiter, Holder, WaitClock};
use crate::config::ProbeConfig;
use crate::error::LinkError;
use crate::family::TargetFamily;
use crate::swd::{SwdHost, SwdIo, TargetState};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// One millisecond-timestamped disarm/arm tracker for the 1 s
/// disconnect-inference timer (§4.4). `now_ms` is supplied by the caller
/// each poll so this stays host-testable without a real clock.
struct DisconnectTimer {
    armed: bool,
    armed_at_ms: u32,
}

const DISCONNECT_GRACE_MS: u32 = 1_000;

impl DisconnectTimer {
    const fn new() -> Self {
        DisconnectTimer {
            armed: false,
            armed_at_ms: 0,
        }
    }

    fn arm(&mut self, now_ms: u32) {
        self.armed = true;
        self.armed_at_ms = now_ms;
    }

    fn disarm(&mut self) {
        self.armed = false;
    }

    fn expired(&self, now_ms: u32) -> bool {
        self.armed && now_ms.wrapping_sub(self.armed_at_ms) >= DISCONNECT_GRACE_MS
    }
}

const RESP_OK: u8 = 0x00;
const RESP_ERROR: u8 = 0xFF;

/// Maps a [`LinkError`] onto the CMSIS-DAP transfer-response ack nibble
/// the teacher's `CheckResult` trait produces (1=ok, 2=wait, 4=fault,
/// otherwise "other").
fn ack_byte(result: Result<(), LinkError>) -> u8 {
    match result {
        Ok(()) => 0x01,
        Err(LinkError::Swd(crate::error::SwdError::AckWait)) => 0x02,
        Err(LinkError::Swd(crate::error::SwdError::AckFault)) => 0x04,
        Err(_) => 0x08,
    }
}

pub struct DapEngine<F: TargetFamily> {
    pub family: F,
    fingerprint: Fingerprinter,
    connection: ConnectionState,
    disconnect_timer: DisconnectTimer,
    holding_bus: bool,
    /// Trusts its own `command_length` result over whatever length the
    /// executed command's response claims, per §4.4's "response sizing
    /// note" — this flag just records that a mismatch was seen so a
    /// diagnostic can be logged by the caller.
    pub length_mismatch_seen: bool,
    /// `DAP_Info` FirmwareVersion (sub-command `0x04`) string, embedded at
    /// build time by the firmware crate via `git-version`.
    fw_version: &'static str,
}

impl<F: TargetFamily> DapEngine<F> {
    pub fn new(family: F, fw_version: &'static str) -> Self {
        DapEngine {
            family,
            fingerprint: Fingerprinter::new(),
            connection: ConnectionState::Disconnected,
            disconnect_timer: DisconnectTimer::new(),
            holding_bus: false,
            length_mismatch_seen: false,
            fw_version,
        }
    }

    pub fn tool_verdict(&self) -> ToolVerdict {
        self.fingerprint.verdict()
    }

    /// True for the handful of opcodes that reach component B (the SWD
    /// transport) directly, per `dap_server.c`'s offline-command table:
    /// these must not run before a session has acquired the bus via
    /// `Connect`.
    fn requires_connection(&self, cmd: Command, config: &ProbeConfig) -> bool {
        match cmd {
            Command::WriteAbort | Command::Transfer | Command::TransferBlock => true,
            Command::SwjClock => !config.swj_clock_is_offline_command,
            _ => false,
        }
    }

    /// Process exactly one already length-delimited command (as recovered
    /// by [`command_length`](super::command_length::command_length)).
    /// Writes the response (opcode echo + payload) into `out` and returns
    /// the number of bytes written.
    pub fn process_command<T: SwdIo, C: WaitClock>(
        &mut self,
        host: &mut SwdHost<T>,
        cmd_bytes: &[u8],
        out: &mut [u8],
        arbiter: &Arbiter,
        clock: &mut C,
        now_ms: u32,
        config: &ProbeConfig,
    ) -> usize {
        let opcode = cmd_bytes[0];
        let mut req = Request::new(&cmd_bytes[1..]);
        let mut resp = ResponseWriter::new(out);
        resp.write_u8(opcode);

        if (0x80..=0xFE).contains(&opcode) {
            resp.write_u8(RESP_ERROR);
            return resp.finish();
        }

        let cmd = match Command::try_from(opcode) {
            Ok(c) => c,
            Err(_) => {
                resp.write_u8(RESP_ERROR);
                return resp.finish();
            }
        };

        self.update_connect_state(cmd, now_ms);

        if self.requires_connection(cmd, config) && self.connection != ConnectionState::Connected {
            resp.write_u8(RESP_ERROR);
            return resp.finish();
        }

        match cmd {
            Command::Info => self.process_info(&mut req, &mut resp),
            Command::HostStatus => {
                let _ = req.next_u8();
                let _ = req.next_u8();
                resp.write_u8(RESP_OK);
            }
            Command::Connect => {
                let port = req.next_u8();
                self.on_connect(host, arbiter, clock);
                let _ = host.target_set_state(&mut self.family, TargetState::Attach);
                resp.write_u8(if port == 0 { 1 } else { port });
            }
            Command::Disconnect => {
                self.release_bus_if_held(arbiter);
                resp.write_u8(RESP_OK);
            }
            Command::ResetTarget => {
                self.family.reset(host, true);
                self.family.reset(host, false);
                resp.write_u8(RESP_OK);
                resp.write_u8(0);
            }
            Command::TransferAbort => {
                // No in-flight async transfer model here; nothing to abort.
            }
            Command::WriteAbort => {
                let _dap_index = req.next_u8();
                let abort = req.next_u32();
                let ok = host.write_dp(0, abort).is_ok();
                resp.write_u8(if ok { RESP_OK } else { RESP_ERROR });
            }
            Command::Delay => {
                let us = req.next_u16();
                let ticks = (us as u32) / 1000 + 1;
                for _ in 0..ticks {
                    clock.tick();
                }
                resp.write_u8(RESP_OK);
            }
            Command::SwjClock => {
                let khz = req.next_u32();
                host.io_mut().set_clock(khz);
                resp.write_u8(RESP_OK);
            }
            Command::SwjPins => {
                let output = req.next_u8();
                let select = req.next_u8();
                let _wait_us = req.next_u32();
                if select & 0x80 != 0 {
                    self.family.reset(host, output & 0x80 == 0);
                }
                resp.write_u8(0);
            }
            Command::SwjSequence => {
                let n = req.next_u8();
                let bits = if n == 0 { 256usize } else { n as usize };
                let data = req.rest();
                Self::write_raw_sequence(host, data, bits);
                resp.write_u8(RESP_OK);
            }
            Command::SwdConfigure => {
                let _cfg = req.next_u8();
                resp.write_u8(RESP_OK);
            }
            Command::SwdSequence => {
                let seq_count = req.next_u8();
                resp.write_u8(RESP_OK);
                for _ in 0..seq_count {
                    let info = req.next_u8();
                    let count_field = (info & 0x3F) as usize;
                    let count = if count_field == 0 { 64 } else { count_field };
                    let output = info & 0x80 == 0;
                    if output {
                        let bytes = (count + 7) / 8;
                        let data = req.next_bytes(bytes);
                        Self::write_raw_sequence(host, data, count);
                    } else {
                        let bits = Self::read_raw_sequence(host, count);
                        let bytes = (count + 7) / 8;
                        resp.write_slice(&bits.to_le_bytes()[..bytes]);
                    }
                }
            }
            Command::TransferConfigure => {
                let _idle = req.next_u8();
                let _wait_retry = req.next_u16();
                let _match_retry = req.next_u16();
                resp.write_u8(RESP_OK);
            }
            Command::Transfer => self.process_transfer(host, &mut req, &mut resp),
            Command::TransferBlock => self.process_transfer_block(host, &mut req, &mut resp),
            Command::ExecuteCommands => {
                let count = req.next_u8();
                resp.write_u8(count);
                let mut remaining = req.rest();
                for _ in 0..count {
                    let n = match super::command_length::command_length(remaining) {
                        super::command_length::LengthResult::Complete(n) => n,
                        super::command_length::LengthResult::NeedMore => break,
                    };
                    let (this_cmd, rest) = remaining.split_at(n);
                    remaining = rest;
                    // Sub-command responses are appended without their own
                    // opcode-echo wrapper duplicated by us; we re-dispatch
                    // through process_command and splice out its opcode
                    // byte to match CMSIS-DAP's batched-response framing.
                    let mut sub_out = [0u8; 64];
                    let n = self.process_command(host, this_cmd, &mut sub_out, arbiter, clock, now_ms, config);
                    resp.write_slice(&sub_out[..n]);
                }
            }
            Command::QueueCommands => {
                resp.write_u8(RESP_ERROR);
            }
            // JTAG opcodes: length-decoding only, per the JTAG non-goal.
            Command::JtagSequence | Command::JtagConfigure | Command::JtagIdcode => {
                resp.write_u8(RESP_ERROR);
            }
            // SWO: acknowledged but not implemented (no trace capture path
            // in this rewrite); responses are the documented "not
            // supported" shapes so hosts degrade gracefully.
            Command::SwoTransport | Command::SwoMode | Command::SwoControl => {
                resp.write_u8(RESP_ERROR);
            }
            Command::SwoBaudrate => resp.write_u32(0),
            Command::SwoStatus => {
                resp.write_u8(0);
                resp.write_u32(0);
            }
            Command::SwoExtendedStatus => {
                resp.write_u8(0);
                resp.write_u32(0);
                resp.write_u32(0);
                resp.write_u32(0);
            }
            Command::SwoData => {
                let _max = req.next_u16();
                resp.write_u8(0);
                resp.write_u16(0);
            }
            Command::Invalid => {
                resp.write_u8(RESP_ERROR);
            }
        }

        resp.finish()
    }

    fn write_raw_sequence<T: SwdIo>(host: &mut SwdHost<T>, data: &[u8], bits: usize) {
        let mut remaining = bits;
        let mut byte_idx = 0;
        host.io_mut().set_direction(crate::swd::Direction::Out);
        while remaining > 0 {
            let n = remaining.min(8) as u8;
            host.io_mut().write_bits(n, data[byte_idx] as u32);
            byte_idx += 1;
            remaining -= n as usize;
        }
    }

    fn read_raw_sequence<T: SwdIo>(host: &mut SwdHost<T>, bits: usize) -> u32 {
        host.io_mut().set_direction(crate::swd::Direction::In);
        host.io_mut().read_bits(bits.min(32) as u8)
    }

    fn process_info(&mut self, req: &mut Request, resp: &mut ResponseWriter) {
        let id = req.next_u8();
        self.fingerprint.observe_info(id);
        match id {
            0xFE => {
                resp.write_u8(1);
                resp.write_u8(1);
            }
            0xFF => {
                resp.write_u8(2);
                resp.write_u16(64);
            }
            0xF0 => {
                resp.write_u8(1);
                resp.write_u8(0x03); // SWD + JTAG-decode-only capability bits
            }
            0x04 => {
                let bytes = self.fw_version.as_bytes();
                let n = bytes.len().min(253);
                resp.write_u8((n + 1) as u8);
                resp.write_slice(&bytes[..n]);
                resp.write_u8(0);
            }
            _ => {
                resp.write_u8(0);
            }
        }
    }

    fn update_connect_state(&mut self, cmd: Command, now_ms: u32) {
        match cmd {
            Command::Disconnect | Command::Info | Command::HostStatus => {
                self.disconnect_timer.arm(now_ms);
            }
            _ => self.disconnect_timer.disarm(),
        }
        if self.disconnect_timer.expired(now_ms) && self.connection == ConnectionState::Connected {
            self.connection = ConnectionState::Disconnected;
        }
    }

    fn on_connect<T: SwdIo, C: WaitClock>(&mut self, host: &mut SwdHost<T>, arbiter: &Arbiter, clock: &mut C) {
        if !self.holding_bus {
            if arbiter.lock(Holder::Dap, true, clock).is_ok() {
                self.holding_bus = true;
            }
        }
        // The RTT engine may have driven SELECT/CSW on core 1 while this
        // engine didn't hold the bus; its cached values would otherwise go
        // stale silently.
        host.invalidate_caches();
        self.connection = ConnectionState::Connected;
    }

    fn release_bus_if_held(&mut self, arbiter: &Arbiter) {
        if self.holding_bus {
            arbiter.unlock(Holder::Dap);
            self.holding_bus = false;
        }
        self.connection = ConnectionState::Disconnected;
        self.fingerprint.reset();
    }

    fn process_transfer<T: SwdIo>(&mut self, host: &mut SwdHost<T>, req: &mut Request, resp: &mut ResponseWriter) {
        let _dap_index = req.next_u8();
        let transfer_count = req.next_u8();
        let count_pos = resp.skip(1);
        let mut completed = 0u8;
        let mut last_ack = 0x01u8;

        for _ in 0..transfer_count {
            let dap_req = req.next_u8();
            let apndp_ap = dap_req & 0x01 != 0;
            let is_read = dap_req & 0x02 != 0;
            let addr = (dap_req >> 2) & 0x3;
            let match_value = dap_req & 0x10 != 0;

            if is_read {
                let match_mask = if match_value { Some(req.next_u32()) } else { None };
                let result = if apndp_ap {
                    host.read_ap(self.family.apsel(), addr << 2)
                } else {
                    host.read_dp(addr << 2)
                };
                match result {
                    Ok(v) => {
                        last_ack = 0x01;
                        if match_mask.is_none() {
                            resp.write_u32(v);
                        }
                    }
                    Err(e) => {
                        last_ack = ack_byte(Err(e));
                        break;
                    }
                }
            } else {
                let v = req.next_u32();
                let result = if apndp_ap {
                    host.write_ap(self.family.apsel(), addr << 2, v)
                } else {
                    host.write_dp(addr << 2, v)
                };
                last_ack = ack_byte(result);
                if result.is_err() {
                    break;
                }
            }
            completed += 1;
        }

        resp.write_u8_at(count_pos, completed);
        resp.write_u8(last_ack);
    }

    fn process_transfer_block<T: SwdIo>(
        &mut self,
        host: &mut SwdHost<T>,
        req: &mut Request,
        resp: &mut ResponseWriter,
    ) {
        let _dap_index = req.next_u8();
        let transfer_count = req.next_u16();
        let dap_req = req.next_u8();
        let apndp_ap = dap_req & 0x01 != 0;
        let is_read = dap_req & 0x02 != 0;
        let addr = (dap_req >> 2) & 0x3;

        resp.write_u16(transfer_count);
        let ack_pos = resp.skip(1);
        let mut ack = 0x01u8;

        if is_read {
            for _ in 0..transfer_count {
                let result = if apndp_ap {
                    host.read_ap(self.family.apsel(), addr << 2)
                } else {
                    host.read_dp(addr << 2)
                };
                match result {
                    Ok(v) => resp.write_u32(v),
                    Err(e) => {
                        ack = ack_byte(Err(e));
                        break;
                    }
                }
            }
        } else {
            for _ in 0..transfer_count {
                let v = req.next_u32();
                let result = if apndp_ap {
                    host.write_ap(self.family.apsel(), addr << 2, v)
                } else {
                    host.write_dp(addr << 2, v)
                };
                ack = ack_byte(result);
                if result.is_err() {
                    break;
                }
            }
        }
        resp.write_u8_at(ack_pos, ack);
    }
}
