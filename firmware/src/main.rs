#![no_std]
#![no_main]

mod app;
mod rtt_bridge;
mod shared;
mod usb;
mod vcp;

use cortex_m_rt::entry;
use defmt_rtt as _;
use panic_probe as _;
use probe_core::arbiter::WaitClock;
use probe_core::config::RamWindow;
use probe_core::family::Rp2040Family;
use probe_core::rtt::RttEngine;
use rp2040_hal::pac;
use rp2040_hal::Sio;
use rp2040_hal::Watchdog;

/// Second-stage bootloader required by every RP2040 image; `rp2040-boot2`
/// builds the standard W25Q080 QSPI variant into `.boot2`.
#[link_section = ".boot2"]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_W25Q080;

/// Embedded at build time from `git describe`; surfaced through
/// `DAP_Info`'s FirmwareVersion sub-command.
pub static GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

pub const DAP1_PACKET_SIZE: u16 = 64;
// The teacher's OTG_HS peripheral supports USB High-Speed 512-byte bulk
// packets; the RP2040's USB controller is full-speed only, where the bulk
// max packet size is 64 bytes, so DAPv2 uses that instead.
pub const DAP2_PACKET_SIZE: u16 = 64;
pub const VCP_PACKET_SIZE: u16 = 64;

#[entry]
fn main() -> ! {
    let mut pac = pac::Peripherals::take().unwrap();
    let core = pac::CorePeripherals::take().unwrap();
    let mut watchdog = Watchdog::new(pac.WATCHDOG);

    let clocks = unsafe {
        probe_bsp::clocks::Clocks::setup(
            pac.XOSC,
            pac.CLOCKS,
            pac.PLL_SYS,
            pac.PLL_USB,
            &mut pac.RESETS,
            &mut watchdog,
        )
    }
    .expect("clock init failed");

    let delay = probe_bsp::delay::Delay::new(core.SYST);
    delay.set_sysclk_hz(clocks.sys_clk_khz() * 1_000);

    let mut sio = Sio::new(pac.SIO);
    let hal_pins = rp2040_hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );
    let (mut pins, swclk, swdio, reset) = probe_bsp::gpio::Pins::split(hal_pins);

    let (mut pio, sm0, _sm1, _sm2, _sm3) = rp2040_hal::pio::PIO::new(pac.PIO0, &mut pac.RESETS);
    let program = probe_bsp::pio_swd::assemble();
    let installed = pio.install(&program).expect("PIO program install failed");
    let swd_io = probe_bsp::pio_swd::PioSwd::new(
        &mut pio,
        sm0,
        probe_bsp::pio_swd::OUT_NEGEDGE_OFFSET,
        installed,
        swclk,
        swdio,
        reset,
        clocks.sys_clk_khz(),
    );
    let host = probe_core::swd::SwdHost::new(swd_io);
    unsafe { shared::init(host) };
    unsafe { rtt_bridge::init() };

    probe_bsp::multicore::spawn_core1(&mut pac.PSM, &mut pac.PPB, &mut sio.fifo, core1_entry);

    let usb_bus = usb::init_bus(pac.USBCTRL_REGS, pac.USBCTRL_DPRAM, clocks.usb_clk(), &mut pac.RESETS);
    let mut usb = usb::Usb::new(usb_bus);

    let mut app = app::App::new(&mut pins, &mut usb, delay);
    unsafe { app.setup() };

    loop {
        app.poll();
    }
}

/// Ticks by busy-waiting a fixed cycle count rather than a peripheral:
/// core 1 has no SysTick of its own available (core 0 owns the only one
/// this firmware sets up), and `cortex_m::asm::delay` runs against the
/// CPU clock directly regardless of which core calls it.
struct BusyWaitClock;

impl WaitClock for BusyWaitClock {
    fn tick(&mut self) {
        cortex_m::asm::delay(12_500); // ~100us at 125 MHz
    }
}

/// Core 1 entry point: runs the RTT engine continuously at low arbiter
/// priority against the SWD bus shared with core 0's `DapEngine`, per the
/// two-core split this workspace resolves the original cooperative-task
/// model into.
fn core1_entry() -> ! {
    let family = Rp2040Family::new();
    // Mirrors `ProbeConfig::default().target_ram`; core 1 has no access to
    // core 0's `App`-owned config, and this probe doesn't yet expose a way
    // to reconfigure the RAM window at runtime.
    let mut engine = RttEngine::new(RamWindow {
        start: 0x2000_0000,
        end: 0x2004_2000,
    });
    let mut clock = BusyWaitClock;
    let mut upstream = rtt_bridge::BridgeUpstream;
    let mut downstream = rtt_bridge::BridgeDownstream;

    loop {
        unsafe {
            shared::with_host(|host| {
                engine.poll_once(host, &family, &shared::ARBITER, &mut clock, 1, &mut upstream, &mut downstream);
            });
        }
        // One `BusyWaitClock` tick is ~100us; ten of them approximate the
        // 1ms `elapsed_ms` passed to the next `poll_once` call above.
        for _ in 0..10 {
            clock.tick();
        }
    }
}
