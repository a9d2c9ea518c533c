//! Component D: the CMSIS-DAP request engine. Command framing
//! (`command_length`), the `Request`/`ResponseWriter` wire helpers, tool
//! fingerprinting, and the dispatch engine.

mod command_length;
mod engine;
mod fingerprint;
mod request;
mod response;

pub use command_length::{command_length, Command, LengthResult};
pub use engine::{ConnectionState, DapEngine};
pub use fingerprint::{Fingerprinter, ToolVerdict};
pub use request::Request;
pub use response::ResponseWriter;
