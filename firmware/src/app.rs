//! Core 0 orchestration: USB polling, DAP dispatch and the console
//! passthrough. Grounded on the teacher's `App` (same `Request` enum,
//! `setup()`/`poll()`/`process_request()` shape) but wired to
//! `probe-core`'s hardware-independent `DapEngine`/`Arbiter`/`SwdHost`
//! instead of directly poking the STM32 SPI/DMA/USART peripherals.

use crate::shared;
use crate::usb::Usb;
use crate::vcp::{ConsoleSource, Vcp, VcpConfig};
use crate::{DAP1_PACKET_SIZE, DAP2_PACKET_SIZE, VCP_PACKET_SIZE};
use probe_bsp::delay::Delay;
use probe_bsp::gpio::Pins;
use probe_core::arbiter::WaitClock;
use probe_core::config::ProbeConfig;
use probe_core::dap::DapEngine;
use probe_core::family::Rp2040Family;

#[allow(clippy::large_enum_variant)]
pub enum Request {
    DAP1Command(([u8; DAP1_PACKET_SIZE as usize], usize)),
    DAP2Command(([u8; DAP2_PACKET_SIZE as usize], usize)),
    VcpPacket(([u8; VCP_PACKET_SIZE as usize], usize)),
}

/// Ticks the SysTick-backed [`Delay`] for each arbiter poll quantum,
/// mirroring the teacher's busy-wait approach to timing (no RTOS tick).
struct DelayClock<'a> {
    delay: &'a Delay,
}

impl WaitClock for DelayClock<'_> {
    fn tick(&mut self) {
        self.delay.delay_us(100);
    }
}

pub struct App<'a> {
    pins: &'a mut Pins,
    usb: &'a mut Usb<'static>,
    delay: Delay,
    dap: DapEngine<Rp2040Family>,
    vcp: Vcp,
    config: ProbeConfig,
    vcp_config: VcpConfig,
    resp_buf: [u8; DAP2_PACKET_SIZE as usize],
    now_ms: u32,
}

impl<'a> App<'a> {
    pub fn new(pins: &'a mut Pins, usb: &'a mut Usb<'static>, delay: Delay) -> Self {
        let dap = DapEngine::new(Rp2040Family::new(), crate::GIT_VERSION);
        App {
            pins,
            usb,
            delay,
            dap,
            vcp: Vcp::new(),
            config: ProbeConfig::default(),
            vcp_config: VcpConfig::default(),
            resp_buf: [0; DAP2_PACKET_SIZE as usize],
            now_ms: 0,
        }
    }

    /// Unsafety: this function should be called from the main context, once,
    /// before `poll()` is ever called.
    pub unsafe fn setup(&mut self) {
        shared::with_host(|host| host.io_mut().set_clock(self.config.swd_clock_khz));
        self.vcp.setup(125_000_000);
        self.pins.led_off();
    }

    pub fn poll(&mut self) {
        self.now_ms = self.now_ms.wrapping_add(1);

        if let Some(req) = self.usb.poll() {
            self.process_request(req);
        }

        if self.vcp.is_active() {
            let mut buf = [0u8; VCP_PACKET_SIZE as usize];
            let n = self.vcp.read(&mut buf);
            if n > 0 {
                self.usb.console_write(&buf[..n]);
            }
        }
    }

    fn process_request(&mut self, req: Request) {
        let mut clock = DelayClock { delay: &self.delay };
        match req {
            Request::DAP1Command((report, n)) => {
                let dap = &mut self.dap;
                let resp_buf = &mut self.resp_buf;
                let config = &self.config;
                let now_ms = self.now_ms;
                let len = unsafe {
                    shared::with_host(|host| {
                        dap.process_command(
                            host,
                            &report[..n],
                            &mut resp_buf[..DAP1_PACKET_SIZE as usize],
                            &shared::ARBITER,
                            &mut clock,
                            now_ms,
                            config,
                        )
                    })
                };
                if len > 0 {
                    self.usb.dap1_reply(&self.resp_buf[..len]);
                }
            }
            Request::DAP2Command((report, n)) => {
                let dap = &mut self.dap;
                let resp_buf = &mut self.resp_buf;
                let config = &self.config;
                let now_ms = self.now_ms;
                let len = unsafe {
                    shared::with_host(|host| {
                        dap.process_command(host, &report[..n], resp_buf, &shared::ARBITER, &mut clock, now_ms, config)
                    })
                };
                if len > 0 {
                    self.usb.dap2_reply(&self.resp_buf[..len]);
                }
            }
            Request::VcpPacket((buffer, n)) => match self.vcp.source() {
                ConsoleSource::TargetUart => self.vcp.push_uart_rx(&buffer[..n]),
                ConsoleSource::Rtt => self.vcp.push_rtt_tx(&buffer[..n]),
            },
        }
    }
}
