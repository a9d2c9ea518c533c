//! Per-channel buffer descriptors and validation, grounded on
//! `rtt_io.c`'s `rtt_check_channel_from_target`/`_to_target`: a channel's
//! buffer pointer and size must fall inside the declared RAM window, and
//! its offsets must be within `size`.

use crate::config::RamWindow;
use crate::error::RttError;
use crate::family::TargetFamily;
use crate::swd::{SwdHost, SwdIo};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelRole {
    /// Up-buffer / down-buffer index 0: the console stream.
    Console,
    /// Index 1, enabled only behind the `sysview` feature.
    SysView,
}

/// Local mirror of one ring-buffer descriptor, kept in sync with the
/// target copy per the polling loop in [`super::engine::RttEngine`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMirror {
    pub descriptor_addr: u32,
    pub buffer_addr: u32,
    pub size: u32,
    pub write_off: u32,
    pub read_off: u32,
}

/// Descriptor layout: `{name_ptr, buffer_ptr, size, write_off, read_off,
/// flags}`, six 32-bit words (24 bytes), matching `SEGGER_RTT_BUFFER_UP`/
/// `_DOWN` in the SEGGER RTT reference implementation.
pub const DESCRIPTOR_SIZE: u32 = 24;

const OFF_BUFFER_PTR: u32 = 4;
const OFF_SIZE: u32 = 8;
const OFF_WRITE: u32 = 12;
const OFF_READ: u32 = 16;

impl ChannelMirror {
    /// Read and validate one channel's descriptor from the target.
    pub fn read<T: SwdIo, F: TargetFamily>(
        host: &mut SwdHost<T>,
        family: &F,
        descriptor_addr: u32,
        ram: RamWindow,
    ) -> Result<Self, RttError> {
        let buffer_addr = host.read_word(family.apsel(), descriptor_addr + OFF_BUFFER_PTR)?;
        let size = host.read_word(family.apsel(), descriptor_addr + OFF_SIZE)?;
        let write_off = host.read_word(family.apsel(), descriptor_addr + OFF_WRITE)?;
        let read_off = host.read_word(family.apsel(), descriptor_addr + OFF_READ)?;

        if size == 0 || !ram.contains(buffer_addr, size) {
            return Err(RttError::InvalidDescriptor);
        }
        if write_off >= size || read_off >= size {
            return Err(RttError::InvalidDescriptor);
        }

        Ok(ChannelMirror {
            descriptor_addr,
            buffer_addr,
            size,
            write_off,
            read_off,
        })
    }

    pub fn refresh_write_off<T: SwdIo, F: TargetFamily>(
        &mut self,
        host: &mut SwdHost<T>,
        family: &F,
    ) -> Result<(), RttError> {
        self.write_off = host.read_word(family.apsel(), self.descriptor_addr + OFF_WRITE)?;
        Ok(())
    }

    pub fn refresh_read_off<T: SwdIo, F: TargetFamily>(
        &mut self,
        host: &mut SwdHost<T>,
        family: &F,
    ) -> Result<(), RttError> {
        self.read_off = host.read_word(family.apsel(), self.descriptor_addr + OFF_READ)?;
        Ok(())
    }

    pub fn write_read_off<T: SwdIo, F: TargetFamily>(
        &mut self,
        host: &mut SwdHost<T>,
        family: &F,
        new_off: u32,
    ) -> Result<(), RttError> {
        host.write_word(family.apsel(), self.descriptor_addr + OFF_READ, new_off)?;
        self.read_off = new_off;
        Ok(())
    }

    pub fn write_write_off<T: SwdIo, F: TargetFamily>(
        &mut self,
        host: &mut SwdHost<T>,
        family: &F,
        new_off: u32,
    ) -> Result<(), RttError> {
        host.write_word(family.apsel(), self.descriptor_addr + OFF_WRITE, new_off)?;
        self.write_off = new_off;
        Ok(())
    }
}
