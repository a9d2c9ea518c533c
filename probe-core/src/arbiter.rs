//! The SWD bus arbiter ("sw_lock"): a priority-aware mutex with a
//! cooperative-yield flag. Grounded on `sw_lock.c`'s binary-semaphore plus
//! `lock_requested` design, reimplemented without an RTOS dependency using
//! `critical-section` as the portable atomicity primitive.
//!
//! The original hands an unbounded wait to the RTT task and a
//! bounded-timeout wait to everyone else; a mutex (rather than the binary
//! semaphore the source uses) hung under load there, which is why the
//! source comments call out the semaphore choice explicitly. This
//! reimplementation keeps that shape: holder state lives behind a
//! critical section, never behind a blocking primitive that could itself
//! deadlock against an ISR.

use crate::error::ArbiterError;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Identifies who currently holds (or is requesting) the bus, for logging.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Holder {
    Dap,
    Rtt,
    Flash,
}

impl Holder {
    fn tag(self) -> u8 {
        match self {
            Holder::Dap => 1,
            Holder::Rtt => 2,
            Holder::Flash => 3,
        }
    }
}

const FREE: u8 = 0;

/// A clock abstraction the arbiter polls for its bounded wait, so the type
/// stays host-testable without a real timer. One tick is one unit of the
/// bounded wait below; `probe-bsp` implements this against its SysTick-based
/// delay.
pub trait WaitClock {
    /// Sleep (or busy-wait) approximately one polling quantum.
    fn tick(&mut self);
}

/// Arbiter with a bounded high-priority timeout expressed in polling
/// quanta (the caller's `WaitClock::tick` granularity). The source uses a
/// 1000 ms timeout; callers size `timeout_ticks` to match their clock.
pub struct Arbiter {
    holder: AtomicU8,
    release_requested: AtomicBool,
    timeout_ticks: u32,
}

impl Arbiter {
    pub const fn new(timeout_ticks: u32) -> Self {
        Arbiter {
            holder: AtomicU8::new(FREE),
            release_requested: AtomicBool::new(false),
            timeout_ticks,
        }
    }

    /// Acquire the bus. `priority_high` callers set the request flag so a
    /// low-priority holder can observe it and yield, then poll with a
    /// bounded timeout; everyone else (in practice, only the RTT engine)
    /// waits indefinitely.
    pub fn lock<C: WaitClock>(
        &self,
        holder: Holder,
        priority_high: bool,
        clock: &mut C,
    ) -> Result<(), ArbiterError> {
        if priority_high {
            self.release_requested.store(true, Ordering::SeqCst);
            let mut remaining = self.timeout_ticks;
            loop {
                if self.try_acquire(holder) {
                    self.release_requested.store(false, Ordering::SeqCst);
                    return Ok(());
                }
                if remaining == 0 {
                    self.release_requested.store(false, Ordering::SeqCst);
                    return Err(ArbiterError::Timeout);
                }
                remaining -= 1;
                clock.tick();
            }
        } else {
            loop {
                if self.try_acquire(holder) {
                    return Ok(());
                }
                clock.tick();
            }
        }
    }

    fn try_acquire(&self, holder: Holder) -> bool {
        critical_section::with(|_| {
            if self.holder.load(Ordering::SeqCst) == FREE {
                self.holder.store(holder.tag(), Ordering::SeqCst);
                true
            } else {
                false
            }
        })
    }

    /// Release the bus. `holder` is only used to assert the caller is the
    /// one who actually holds it; mismatches are a programming error.
    pub fn unlock(&self, holder: Holder) {
        critical_section::with(|_| {
            debug_assert_eq!(self.holder.load(Ordering::SeqCst), holder.tag());
            self.holder.store(FREE, Ordering::SeqCst);
        });
    }

    /// Peek the release-requested flag. Only meaningful to the current
    /// holder, polled cooperatively inside a long-running low-priority loop
    /// (the RTT engine, between SWD operations).
    pub fn release_requested(&self) -> bool {
        self.release_requested.load(Ordering::SeqCst)
    }

    pub fn current_holder(&self) -> Option<Holder> {
        match self.holder.load(Ordering::SeqCst) {
            FREE => None,
            t if t == Holder::Dap.tag() => Some(Holder::Dap),
            t if t == Holder::Rtt.tag() => Some(Holder::Rtt),
            _ => Some(Holder::Flash),
        }
    }
}
