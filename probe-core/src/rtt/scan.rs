//! Control-block signature scan. Grounded on `original_source/src/
//! rtt_io.c`'s `search_for_rtt_cb`/`check_buffer_for_rtt_cb`: the fixed
//! 16-byte "SEGGER RTT" signature, matched at any 4-byte-aligned offset,
//! scanned in overlapping chunks so a match straddling a chunk boundary
//! isn't missed.

use crate::arbiter::Arbiter;
use crate::error::LinkError;
use crate::family::TargetFamily;
use crate::swd::{SwdHost, SwdIo};

pub const SIGNATURE: &[u8; 16] = b"SEGGER RTT\0\0\0\0\0\0";
pub const SIGNATURE_LEN: usize = 16;

const CHUNK_SIZE: usize = 1024;
const OVERLAP: usize = SIGNATURE_LEN;

/// Re-verify a remembered control-block address (the scan's fast path).
/// Returns `Ok(true)` if the signature is still present there.
pub fn verify_control_block<T: SwdIo, F: TargetFamily>(
    host: &mut SwdHost<T>,
    family: &F,
    addr: u32,
) -> Result<bool, LinkError> {
    let mut buf = [0u8; SIGNATURE_LEN];
    host.read_memory(family.apsel(), addr, &mut buf)?;
    Ok(&buf == SIGNATURE)
}

/// Full overlapping-chunk scan of `[start, end)`. Aborts immediately (and
/// returns `Ok(None)`) if `arbiter.release_requested()` becomes true,
/// matching the source's cooperative-preemption rule for long scans.
pub fn scan_for_control_block<T: SwdIo, F: TargetFamily>(
    host: &mut SwdHost<T>,
    family: &F,
    arbiter: &Arbiter,
    start: u32,
    end: u32,
) -> Result<Option<u32>, LinkError> {
    let mut addr = start;
    let mut chunk = [0u8; CHUNK_SIZE];

    while addr < end {
        if arbiter.release_requested() {
            return Ok(None);
        }

        let remaining = (end - addr) as usize;
        let want = remaining.min(CHUNK_SIZE);
        if want < SIGNATURE_LEN {
            break;
        }
        host.read_memory(family.apsel(), addr, &mut chunk[..want])?;

        let mut off = 0usize;
        while off + SIGNATURE_LEN <= want {
            if &chunk[off..off + SIGNATURE_LEN] == SIGNATURE {
                return Ok(Some(addr + off as u32));
            }
            off += 4;
        }

        let advance = want - OVERLAP.min(want);
        if advance == 0 {
            break;
        }
        addr += advance as u32;
    }

    Ok(None)
}
