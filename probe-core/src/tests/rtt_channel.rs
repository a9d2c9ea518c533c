use super::mock_swd::{MockSwdIo, RAM_BASE};
use crate::arbiter::{Arbiter, WaitClock};
use crate::config::RamWindow;
use crate::family::GenericCortexM;
use crate::rtt::{ChannelMirror, DownstreamSource, RttEngine, UpstreamSink, SIGNATURE};
use crate::swd::SwdHost;

struct NoopClock;
impl WaitClock for NoopClock {
    fn tick(&mut self) {}
}

struct CollectingSink {
    received: Vec<u8>,
}
impl UpstreamSink for CollectingSink {
    fn is_congested(&self) -> bool {
        false
    }
    fn push(&mut self, data: &[u8]) {
        self.received.extend_from_slice(data);
    }
}

struct EmptySource;
impl DownstreamSource for EmptySource {
    fn available(&self) -> usize {
        0
    }
    fn pull(&mut self, _buf: &mut [u8]) -> usize {
        0
    }
}

const CB_ADDR: u32 = RAM_BASE + 0x10;
const UP_BUF_ADDR: u32 = RAM_BASE + 0x200;

fn write_control_block(host: &mut SwdHost<MockSwdIo>) {
    host.write_memory(0, CB_ADDR, SIGNATURE).unwrap();
    host.write_word(0, CB_ADDR + 16, 1).unwrap(); // max_up
    host.write_word(0, CB_ADDR + 20, 0).unwrap(); // max_down

    let up0 = CB_ADDR + 24;
    host.write_word(0, up0 + 4, UP_BUF_ADDR).unwrap(); // buffer_ptr
    host.write_word(0, up0 + 8, 16).unwrap(); // size
    host.write_word(0, up0 + 12, 0).unwrap(); // write_off
    host.write_word(0, up0 + 16, 0).unwrap(); // read_off
}

#[test]
fn channel_mirror_rejects_descriptor_whose_buffer_is_outside_ram_window() {
    let mut host = SwdHost::new(MockSwdIo::new());
    let family = GenericCortexM::new();
    let ram = RamWindow {
        start: RAM_BASE,
        end: RAM_BASE + 4096,
    };
    let up0 = CB_ADDR + 24;
    host.write_word(0, up0 + 4, 0x5000_0000).unwrap(); // outside ram
    host.write_word(0, up0 + 8, 16).unwrap();
    host.write_word(0, up0 + 12, 0).unwrap();
    host.write_word(0, up0 + 16, 0).unwrap();

    assert!(ChannelMirror::read(&mut host, &family, up0, ram).is_err());
}

#[test]
fn poll_once_discovers_control_block_and_drains_upstream_ring_buffer() {
    let mut host = SwdHost::new(MockSwdIo::new());
    let family = GenericCortexM::new();
    let arbiter = Arbiter::new(10);
    let mut clock = NoopClock;

    write_control_block(&mut host);
    // Stage 5 bytes of console output and advance write_off past them.
    let payload = [b'h', b'i', b'!', b'\n', b'\n'];
    host.write_memory(0, UP_BUF_ADDR, &payload).unwrap();
    host.write_word(0, CB_ADDR + 24 + 12, payload.len() as u32).unwrap();

    let ram = RamWindow {
        start: RAM_BASE,
        end: RAM_BASE + 4096,
    };
    let mut engine = RttEngine::new(ram);
    let mut sink = CollectingSink { received: Vec::new() };
    let mut source = EmptySource;

    engine.poll_once(&mut host, &family, &arbiter, &mut clock, 10, &mut sink, &mut source);

    assert_eq!(sink.received, payload);
    // The mirrored read_off in target memory must have advanced too.
    let read_off = host.read_word(0, CB_ADDR + 24 + 16).unwrap();
    assert_eq!(read_off, payload.len() as u32);
}

#[test]
fn poll_once_is_idempotent_once_the_ring_buffer_is_drained() {
    let mut host = SwdHost::new(MockSwdIo::new());
    let family = GenericCortexM::new();
    let arbiter = Arbiter::new(10);
    let mut clock = NoopClock;

    write_control_block(&mut host);
    let ram = RamWindow {
        start: RAM_BASE,
        end: RAM_BASE + 4096,
    };
    let mut engine = RttEngine::new(ram);
    let mut sink = CollectingSink { received: Vec::new() };
    let mut source = EmptySource;

    engine.poll_once(&mut host, &family, &arbiter, &mut clock, 10, &mut sink, &mut source);
    engine.poll_once(&mut host, &family, &arbiter, &mut clock, 10, &mut sink, &mut source);

    assert!(sink.received.is_empty());
}
