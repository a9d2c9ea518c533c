//! Component E: the target-resident flash programmer.

mod blob;
mod programmer;

pub use blob::FlashBlob;
pub use programmer::{FlashProgrammer, FlashResult};
