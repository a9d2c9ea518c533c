//! Shared error kinds. Every fallible core operation returns one of these;
//! per the error handling design, nothing above `init` is fatal, so these
//! are folded back into a status byte or a re-scan rather than panicking.

use core::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwdError {
    BadParity,
    AckWait,
    AckFault,
    AckProtocol,
    AckUnknown(u8),
}

impl fmt::Display for SwdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwdError::BadParity => write!(f, "bad parity on SWD read"),
            SwdError::AckWait => write!(f, "SWD ack WAIT (retries exhausted)"),
            SwdError::AckFault => write!(f, "SWD ack FAULT"),
            SwdError::AckProtocol => write!(f, "SWD protocol error"),
            SwdError::AckUnknown(v) => write!(f, "unrecognised SWD ack {:#03b}", v),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    Swd(SwdError),
    /// `DHCSR.S_HALT` (or `S_REGRDY`) did not assert within the bounded poll.
    Timeout,
    /// A flash-syscall invocation returned PC != breakpoint, or an
    /// unexpected R0 on return.
    SyscallFailed,
}

impl From<SwdError> for LinkError {
    fn from(e: SwdError) -> Self {
        LinkError::Swd(e)
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Swd(e) => write!(f, "{}", e),
            LinkError::Timeout => write!(f, "target did not halt in time"),
            LinkError::SyscallFailed => write!(f, "flash syscall returned unexpected result"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArbiterError {
    /// A high-priority acquire did not obtain the bus within its timeout.
    Timeout,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DapError {
    /// `command_length` needs more bytes than are currently buffered.
    NeedMore,
    /// The opcode is not recognised at all (not even a vendor range).
    UnknownCommand(u8),
    Link(LinkError),
}

impl From<LinkError> for DapError {
    fn from(e: LinkError) -> Self {
        DapError::Link(e)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    Link(LinkError),
    /// `flash_size()` returned 0 or the probe blob could not be staged.
    NoFlashDetected,
    IllegalAddress,
    VerifyFailed,
}

impl From<LinkError> for FlashError {
    fn from(e: LinkError) -> Self {
        FlashError::Link(e)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RttError {
    Link(LinkError),
    /// The control block or one of its channel descriptors failed bounds
    /// validation against the RAM window.
    InvalidDescriptor,
    NotFound,
}

impl From<LinkError> for RttError {
    fn from(e: LinkError) -> Self {
        RttError::Link(e)
    }
}
