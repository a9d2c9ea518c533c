//! Clock tree bring-up, grounded on the teacher's `rcc::RCC::setup` (HSE
//! bypass -> PLL -> flash-latency -> peripheral-enable sequence) but using
//! `rp2040_hal::clocks::init_clocks_and_plls` to drive the PLL from the
//! board's 12 MHz crystal, and `rp2040_hal::Watchdog` as the reset source
//! the clock init API requires.

use rp2040_hal::clocks::{Clock, ClocksManager, InitError};
use rp2040_hal::pac::{CLOCKS, PLL_SYS, PLL_USB, RESETS, XOSC};
use rp2040_hal::Watchdog;

/// The probe's reference board crystal, matching `rp2040-boot2`'s assumed
/// input frequency.
const XOSC_CRYSTAL_FREQ: u32 = 12_000_000;

pub struct Clocks {
    inner: ClocksManager,
}

impl Clocks {
    /// Brings up the XOSC, both PLLs and the peripheral clock tree. Unsafe
    /// for the same reason as the teacher's `RCC::setup`: must run once
    /// from the main context before any peripheral that depends on a
    /// running clock is touched.
    pub unsafe fn setup(
        xosc_dev: XOSC,
        clocks_dev: CLOCKS,
        pll_sys_dev: PLL_SYS,
        pll_usb_dev: PLL_USB,
        resets: &mut RESETS,
        watchdog: &mut Watchdog,
    ) -> Result<Self, InitError> {
        let inner = rp2040_hal::clocks::init_clocks_and_plls(
            XOSC_CRYSTAL_FREQ,
            xosc_dev,
            clocks_dev,
            pll_sys_dev,
            pll_usb_dev,
            resets,
            watchdog,
        )?;
        Ok(Clocks { inner })
    }

    pub fn sys_clk_khz(&self) -> u32 {
        self.inner.system_clock.freq().to_kHz()
    }

    pub fn peripheral_clk_khz(&self) -> u32 {
        self.inner.peripheral_clock.freq().to_kHz()
    }

    pub fn usb_clk(&self) -> rp2040_hal::clocks::UsbClock {
        self.inner.usb_clock
    }

    pub fn into_inner(self) -> ClocksManager {
        self.inner
    }
}
