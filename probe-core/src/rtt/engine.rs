//! The scan → validate → poll → watchdog loop, grounded on `rtt_io.c`'s
//! `rtt_check_channel_from_target`/`_to_target` and the liveness-watchdog
//! behaviour SPEC_FULL §4.6 describes. The host-side CDC streams this
//! shuttles bytes to/from are external collaborators, reached only
//! through the small [`UpstreamSink`]/[`DownstreamSource`] traits so this
//! engine stays hardware- and USB-stack-independent.

use crate::arbiter::{Arbiter, Holder, WaitClock};
use crate::config::RamWindow;
use crate::error::RttError;
use crate::family::TargetFamily;
use crate::swd::{SwdHost, SwdIo};

use super::channel::ChannelMirror;
use super::scan::{scan_for_control_block, verify_control_block};

/// One second of no traffic on a channel triggers a liveness re-scan,
/// per SPEC_FULL §4.6.
pub const LIVENESS_TIMEOUT_MS: u32 = 1_000;
/// Grace period the engine sleeps after yielding the bus to a
/// high-priority acquirer before it re-enters its loop.
pub const YIELD_GRACE_TICKS: u32 = 2;

pub trait UpstreamSink {
    /// Push bytes read from the target's up-buffer toward the host. `true`
    /// if the destination congested and this cycle's read should be
    /// skipped (e.g. a backpressured SysView-over-TCP sink).
    fn is_congested(&self) -> bool;
    fn push(&mut self, data: &[u8]);
}

pub trait DownstreamSource {
    fn available(&self) -> usize;
    /// Pull up to `max` bytes into `buf`, returning the count actually
    /// pulled.
    fn pull(&mut self, buf: &mut [u8]) -> usize;
}

struct StagingBuf {
    data: [u8; 512],
}

pub struct RttEngine {
    control_block_addr: Option<u32>,
    console_up: Option<ChannelMirror>,
    console_down: Option<ChannelMirror>,
    ram: RamWindow,
    liveness_ms_since_traffic: u32,
    staging: StagingBuf,
}

impl RttEngine {
    pub fn new(ram: RamWindow) -> Self {
        RttEngine {
            control_block_addr: None,
            console_up: None,
            console_down: None,
            ram,
            liveness_ms_since_traffic: 0,
            staging: StagingBuf { data: [0u8; 512] },
        }
    }

    fn try_locate<T: SwdIo, F: TargetFamily>(
        &mut self,
        host: &mut SwdHost<T>,
        family: &F,
        arbiter: &Arbiter,
    ) -> Result<(), RttError> {
        if let Some(addr) = self.control_block_addr {
            if verify_control_block(host, family, addr).unwrap_or(false) {
                return Ok(());
            }
        }
        match scan_for_control_block(host, family, arbiter, self.ram.start, self.ram.end)? {
            Some(addr) => {
                self.control_block_addr = Some(addr);
                self.discover_channels(host, family, addr)
            }
            None => {
                self.control_block_addr = None;
                Err(RttError::NotFound)
            }
        }
    }

    fn discover_channels<T: SwdIo, F: TargetFamily>(
        &mut self,
        host: &mut SwdHost<T>,
        family: &F,
        control_block_addr: u32,
    ) -> Result<(), RttError> {
        const OFF_MAX_UP: u32 = 16;
        const OFF_MAX_DOWN: u32 = 20;
        const ARRAYS_START: u32 = 24;

        let max_up = host.read_word(family.apsel(), control_block_addr + OFF_MAX_UP)?;
        let max_down = host.read_word(family.apsel(), control_block_addr + OFF_MAX_DOWN)?;

        if max_up == 0 {
            return Err(RttError::InvalidDescriptor);
        }
        let up0_addr = control_block_addr + ARRAYS_START;
        self.console_up = ChannelMirror::read(host, family, up0_addr, self.ram).ok();

        if max_down > 0 {
            let down0_addr = up0_addr + max_up * super::channel::DESCRIPTOR_SIZE;
            self.console_down = ChannelMirror::read(host, family, down0_addr, self.ram).ok();
        }

        Ok(())
    }

    /// One iteration: ensure the control block is located, poll the
    /// console channel's upstream and downstream directions, and tick the
    /// liveness watchdog. `elapsed_ms` is the time since the previous
    /// call, supplied by the caller's clock.
    pub fn poll_once<T: SwdIo, F: TargetFamily, C: WaitClock, U: UpstreamSink, D: DownstreamSource>(
        &mut self,
        host: &mut SwdHost<T>,
        family: &F,
        arbiter: &Arbiter,
        clock: &mut C,
        elapsed_ms: u32,
        upstream: &mut U,
        downstream: &mut D,
    ) {
        if arbiter.lock(Holder::Rtt, false, clock).is_err() {
            return;
        }

        // The DAP engine may have driven SELECT/CSW while it held the bus;
        // this handle's caches would otherwise silently skip those writes.
        host.invalidate_caches();

        if self.control_block_addr.is_none() || self.console_up.is_none() {
            if self.try_locate(host, family, arbiter).is_err() {
                arbiter.unlock(Holder::Rtt);
                return;
            }
        }

        let mut moved_bytes = false;

        if let Some(mut up) = self.console_up {
            if !upstream.is_congested() {
                if up.refresh_write_off(host, family).is_ok() && up.write_off != up.read_off {
                    let avail = if up.write_off > up.read_off {
                        up.write_off - up.read_off
                    } else {
                        up.size - up.read_off
                    };
                    let n = (avail as usize).min(self.staging.data.len());
                    if host
                        .read_memory(family.apsel(), up.buffer_addr + up.read_off, &mut self.staging.data[..n])
                        .is_ok()
                    {
                        upstream.push(&self.staging.data[..n]);
                        let new_read = (up.read_off + n as u32) % up.size;
                        if up.write_read_off(host, family, new_read).is_ok() {
                            moved_bytes = true;
                        }
                    }
                }
                self.console_up = Some(up);
            }
        }

        if let Some(mut down) = self.console_down {
            let avail_host = downstream.available();
            if avail_host > 0 {
                if down.refresh_read_off(host, family).is_ok() {
                    let free = if down.write_off >= down.read_off {
                        down.size - (down.write_off - down.read_off) - 1
                    } else {
                        down.read_off - down.write_off - 1
                    };
                    let to_write = avail_host.min(free as usize).min(self.staging.data.len());
                    if to_write > 0 {
                        let n = downstream.pull(&mut self.staging.data[..to_write]);
                        let first = (down.size - down.write_off).min(n as u32) as usize;
                        if host
                            .write_memory(family.apsel(), down.buffer_addr + down.write_off, &self.staging.data[..first])
                            .is_ok()
                        {
                            if first < n {
                                let _ = host.write_memory(family.apsel(), down.buffer_addr, &self.staging.data[first..n]);
                            }
                            let new_write = (down.write_off + n as u32) % down.size;
                            if down.write_write_off(host, family, new_write).is_ok() {
                                moved_bytes = true;
                            }
                        }
                    }
                }
            }
            self.console_down = Some(down);
        }

        if moved_bytes {
            self.liveness_ms_since_traffic = 0;
        } else {
            self.liveness_ms_since_traffic += elapsed_ms;
            if self.liveness_ms_since_traffic >= LIVENESS_TIMEOUT_MS {
                self.control_block_addr = None;
                self.console_up = None;
                self.console_down = None;
                self.liveness_ms_since_traffic = 0;
            }
        }

        if arbiter.release_requested() {
            arbiter.unlock(Holder::Rtt);
            for _ in 0..YIELD_GRACE_TICKS {
                clock.tick();
            }
        } else {
            arbiter.unlock(Holder::Rtt);
        }
    }
}
