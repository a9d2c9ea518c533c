//! Component F: SEGGER RTT control-block discovery and ring-buffer
//! transport.

mod channel;
mod engine;
mod scan;

pub use channel::{ChannelMirror, ChannelRole};
pub use engine::{DownstreamSource, RttEngine, UpstreamSink};
pub use scan::{scan_for_control_block, verify_control_block, SIGNATURE, SIGNATURE_LEN};
