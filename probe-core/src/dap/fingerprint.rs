//! Tool fingerprinting: the first three `Info` sub-command ids of a
//! session identify pyOCD, OpenOCD, or probe-rs by their distinctive probe
//! order (SPEC_FULL §4.4). Purely informational — it only selects the
//! packet profile used for the probe's own output sizing.

use crate::config::PacketProfile;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ToolVerdict {
    Unknown,
    PyOcd,
    OpenOcd,
    ProbeRs,
    UserSet,
}

const PYOCD_PATTERN: [u8; 3] = [0xFE, 0x04, 0xFF];
const OPENOCD_PATTERN: [u8; 3] = [0xF0, 0x04, 0x03];
const PROBE_RS_PATTERN: [u8; 3] = [0xFF, 0xFE, 0xF0];

pub struct Fingerprinter {
    seen: heapless::Vec<u8, 3>,
    verdict: ToolVerdict,
}

impl Fingerprinter {
    pub const fn new() -> Self {
        Fingerprinter {
            seen: heapless::Vec::new(),
            verdict: ToolVerdict::Unknown,
        }
    }

    pub fn reset(&mut self) {
        self.seen.clear();
        self.verdict = ToolVerdict::Unknown;
    }

    pub fn verdict(&self) -> ToolVerdict {
        self.verdict
    }

    /// Feed one `Info` sub-command id observed this session. Once three
    /// have been seen, latches a verdict (sticky for the rest of the
    /// session) if they match one of the known patterns.
    pub fn observe_info(&mut self, sub_command: u8) {
        if self.verdict != ToolVerdict::Unknown {
            return;
        }
        if self.seen.len() < 3 {
            // heapless::Vec::push only fails when full, which cannot
            // happen here since we just checked len() < 3.
            let _ = self.seen.push(sub_command);
        }
        if self.seen.len() == 3 {
            let pattern: [u8; 3] = [self.seen[0], self.seen[1], self.seen[2]];
            self.verdict = match pattern {
                PYOCD_PATTERN => ToolVerdict::PyOcd,
                OPENOCD_PATTERN => ToolVerdict::OpenOcd,
                PROBE_RS_PATTERN => ToolVerdict::ProbeRs,
                _ => ToolVerdict::Unknown,
            };
        }
    }

    pub fn set_user_verdict(&mut self) {
        self.verdict = ToolVerdict::UserSet;
    }

    pub fn packet_profile(&self) -> PacketProfile {
        match self.verdict {
            ToolVerdict::PyOcd => PacketProfile { count: 1, size: 64 },
            ToolVerdict::OpenOcd => PacketProfile { count: 1, size: 64 },
            ToolVerdict::ProbeRs => PacketProfile {
                count: 2,
                size: 512,
            },
            ToolVerdict::Unknown | ToolVerdict::UserSet => PacketProfile { count: 1, size: 64 },
        }
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}
