//! Host-runnable tests (`cargo test --features std`), one file per module
//! under test, mirroring the `cotton-usb-host` `src/tests/` layout.

mod arbiter;
mod command_length;
mod fingerprint;
mod mock_swd;
mod rtt_channel;
mod swd_link;
mod uf2;
