//! SWD link and transaction layer: components A (the bit-level transport
//! contract) and B (ADIv5/ADIv6 link + memory primitives) on top of it.

mod dp;
mod link;
mod transport;

pub use dp::{APnDP, DPBankSel, DpRegister};
pub use link::{ResetConnectPolicy, SwdHost, TargetState};
pub use transport::{Direction, SwdIo};
