//! Free-running microsecond delay, grounded on the teacher's SysTick
//! `Delay` (clock-source-select, 24-bit down-counter, wraparound-aware
//! tick math) but retargeted at `cortex_m::peripheral::SYST` directly
//! since `rp2040-pac` exposes SysTick through `cortex-m`, not its own PAC.

use core::sync::atomic::{AtomicU32, Ordering};
use cortex_m::peripheral::{syst::SystClkSource, SYST};

const RELOAD_MAX: u32 = 0x00ff_ffff;

pub struct Delay {
    systick: SYST,
    base_clock: AtomicU32,
}

impl Delay {
    pub fn new(mut systick: SYST) -> Self {
        systick.set_clock_source(SystClkSource::Core);
        systick.set_reload(RELOAD_MAX);
        systick.clear_current();
        systick.enable_counter();

        Delay {
            systick,
            base_clock: AtomicU32::new(0),
        }
    }

    pub fn set_sysclk_hz(&self, hz: u32) {
        self.base_clock.store(hz, Ordering::SeqCst);
    }

    pub fn delay_us(&self, us: u32) {
        assert!(us < 10_000);

        let base_clock = self.base_clock.load(Ordering::SeqCst);
        assert!(base_clock > 0);

        let ticks = (us as u64) * (base_clock as u64) / 1_000_000;
        self.delay_ticks(ticks as u32);
    }

    pub fn calc_period_ticks(&self, frequency: u32) -> u32 {
        let base_clock = self.base_clock.load(Ordering::SeqCst);
        assert!(base_clock > 0);

        base_clock / frequency
    }

    pub fn delay_ticks(&self, mut ticks: u32) {
        let mut last = self.get_current();
        loop {
            let now = self.get_current();
            let delta = last.wrapping_sub(now) & RELOAD_MAX;

            if delta >= ticks {
                break;
            } else {
                ticks -= delta;
                last = now;
            }
        }
    }

    pub fn delay_ticks_from_last(&self, mut ticks: u32, mut last: u32) -> u32 {
        loop {
            let now = self.get_current();
            let delta = last.wrapping_sub(now) & RELOAD_MAX;

            if delta >= ticks {
                break now;
            } else {
                ticks -= delta;
                last = now;
            }
        }
    }

    #[inline(always)]
    pub fn get_current(&self) -> u32 {
        SYST::get_current() & RELOAD_MAX
    }
}
