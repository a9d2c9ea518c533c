//! Byte bridge between core 1's `RttEngine` and core 0's `Vcp` console,
//! grounded on `heapless::spsc::Queue`'s producer/consumer split (already
//! a dependency of both crates). Two queues, one per direction: "up" is
//! target-to-host (RTT up-channel to the USB CDC console), "down" is
//! host-to-target (console input to the RTT down-channel).

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

use heapless::spsc::{Consumer, Producer, Queue};
use probe_core::rtt::{DownstreamSource, UpstreamSink};

const CAP: usize = 256;

static mut UP_QUEUE: Queue<u8, CAP> = Queue::new();
static mut DOWN_QUEUE: Queue<u8, CAP> = Queue::new();

static UP_LEN: AtomicUsize = AtomicUsize::new(0);
static DOWN_LEN: AtomicUsize = AtomicUsize::new(0);

struct Half<T>(UnsafeCell<Option<T>>);
unsafe impl<T> Sync for Half<T> {}

static UP_PRODUCER: Half<Producer<'static, u8, CAP>> = Half(UnsafeCell::new(None));
static UP_CONSUMER: Half<Consumer<'static, u8, CAP>> = Half(UnsafeCell::new(None));
static DOWN_PRODUCER: Half<Producer<'static, u8, CAP>> = Half(UnsafeCell::new(None));
static DOWN_CONSUMER: Half<Consumer<'static, u8, CAP>> = Half(UnsafeCell::new(None));

/// Split both queues into their producer/consumer halves. Must be called
/// exactly once, from core 0's `main`, before `spawn_core1` runs and
/// before `Vcp` can be switched to the `Rtt` console source.
pub unsafe fn init() {
    let (up_p, up_c) = (*core::ptr::addr_of_mut!(UP_QUEUE)).split();
    let (down_p, down_c) = (*core::ptr::addr_of_mut!(DOWN_QUEUE)).split();
    *UP_PRODUCER.0.get() = Some(up_p);
    *UP_CONSUMER.0.get() = Some(up_c);
    *DOWN_PRODUCER.0.get() = Some(down_p);
    *DOWN_CONSUMER.0.get() = Some(down_c);
}

/// Core 1's [`UpstreamSink`]: RTT up-channel bytes land here for core 0 to
/// drain toward the USB CDC console.
pub struct BridgeUpstream;

impl UpstreamSink for BridgeUpstream {
    fn is_congested(&self) -> bool {
        UP_LEN.load(Ordering::Relaxed) >= CAP
    }

    fn push(&mut self, data: &[u8]) {
        unsafe {
            let Some(p) = (*UP_PRODUCER.0.get()).as_mut() else { return };
            for &b in data {
                if p.enqueue(b).is_err() {
                    break;
                }
                UP_LEN.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Core 1's [`DownstreamSource`]: bytes the host typed into the console
/// wait here for the RTT engine to forward into the target's down-buffer.
pub struct BridgeDownstream;

impl DownstreamSource for BridgeDownstream {
    fn available(&self) -> usize {
        DOWN_LEN.load(Ordering::Relaxed)
    }

    fn pull(&mut self, buf: &mut [u8]) -> usize {
        unsafe {
            let Some(c) = (*DOWN_CONSUMER.0.get()).as_mut() else { return 0 };
            let mut n = 0;
            while n < buf.len() {
                match c.dequeue() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                        DOWN_LEN.fetch_sub(1, Ordering::Relaxed);
                    }
                    None => break,
                }
            }
            n
        }
    }
}

/// Core 0 side: bytes ready to be read out of the up queue toward the USB
/// CDC console.
pub fn up_available() -> usize {
    UP_LEN.load(Ordering::Relaxed)
}

pub fn up_read(buf: &mut [u8]) -> usize {
    unsafe {
        let Some(c) = (*UP_CONSUMER.0.get()).as_mut() else { return 0 };
        let mut n = 0;
        while n < buf.len() {
            match c.dequeue() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                    UP_LEN.fetch_sub(1, Ordering::Relaxed);
                }
                None => break,
            }
        }
        n
    }
}

/// Core 0 side: queue host-typed console bytes for core 1 to forward.
pub fn down_write(data: &[u8]) {
    unsafe {
        let Some(p) = (*DOWN_PRODUCER.0.get()).as_mut() else { return };
        for &b in data {
            if p.enqueue(b).is_err() {
                break;
            }
            DOWN_LEN.fetch_add(1, Ordering::Relaxed);
        }
    }
}
