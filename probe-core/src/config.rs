//! Probe configuration. Reading these values from flash, USB vendor
//! commands, or a host-side config tool is an external concern; this module
//! only defines the struct the rest of the core treats as read-only.

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProbeConfig {
    /// Override for the DAP session's `(packet_count, packet_size)`, used
    /// instead of the tool-fingerprint verdict when `Some`.
    pub packet_profile_override: Option<PacketProfile>,
    /// Requested SWD bit clock in kHz; clamped by the PIO driver to its
    /// family maximum.
    pub swd_clock_khz: u32,
    /// Target RAM window used to bound RTT scanning and flash blob staging.
    pub target_ram: RamWindow,
    /// Resolves the open question on whether `SWJ_Clock` is accepted as an
    /// "offline" command outside a connected session (pyOCD relies on this
    /// even though it is not a true offline command).
    pub swj_clock_is_offline_command: bool,
    /// Resolves the open question on whether RTT SysView downstream bytes
    /// are actually forwarded to the target or silently dropped.
    pub sysview_downstream_forwarding: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            packet_profile_override: None,
            swd_clock_khz: 4_000,
            target_ram: RamWindow {
                start: 0x2000_0000,
                end: 0x2004_2000,
            },
            swj_clock_is_offline_command: true,
            sysview_downstream_forwarding: false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketProfile {
    pub count: u8,
    pub size: u16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RamWindow {
    pub start: u32,
    pub end: u32,
}

impl RamWindow {
    pub fn contains(&self, addr: u32, len: u32) -> bool {
        let end = match addr.checked_add(len) {
            Some(e) => e,
            None => return false,
        };
        addr >= self.start && end <= self.end
    }
}
