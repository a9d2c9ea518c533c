//! USB composite device: DAPv1 (HID), DAPv2 (bulk+trace+WinUSB), a DFU
//! runtime-detach interface, and a CDC ACM console. Grounded on the
//! teacher's `usb::USB` (same `UsbDevice`+class-array `poll()` shape) but
//! built on `rp2040_hal::usb::UsbBus` instead of the STM32 OTG_FS driver.

use crate::app::Request;
use rp2040_hal::usb::UsbBus;
use usb_device::bus::UsbBusAllocator;
use usb_device::prelude::*;
use usbd_serial::SerialPort;

mod dap_v1;
mod dap_v2;
mod dfu;
mod winusb;

use dap_v1::CmsisDapV1;
use dap_v2::CmsisDapV2;
use dfu::DfuRuntime;
use winusb::MicrosoftDescriptors;

pub fn init_bus(
    ctrl_reg: rp2040_hal::pac::USBCTRL_REGS,
    ctrl_dpram: rp2040_hal::pac::USBCTRL_DPRAM,
    usb_clock: rp2040_hal::clocks::UsbClock,
    resets: &mut rp2040_hal::pac::RESETS,
) -> UsbBusAllocator<UsbBus> {
    UsbBusAllocator::new(UsbBus::new(ctrl_reg, ctrl_dpram, usb_clock, true, resets))
}

pub struct Usb<'a> {
    device: UsbDevice<'a, UsbBus>,
    winusb: MicrosoftDescriptors,
    dap_v1: CmsisDapV1<'a, UsbBus>,
    dap_v2: CmsisDapV2<'a, UsbBus>,
    dfu: DfuRuntime,
    serial: SerialPort<'a, UsbBus>,
}

impl<'a> Usb<'a> {
    pub fn new(bus: UsbBusAllocator<UsbBus>) -> Self {
        // Leaking the allocator is the documented `usb-device` pattern for
        // giving every class and the device itself a `'static`-equivalent
        // shared borrow without a RefCell.
        let bus: &'static UsbBusAllocator<UsbBus> = unsafe {
            static mut BUS: Option<UsbBusAllocator<UsbBus>> = None;
            BUS = Some(bus);
            (*core::ptr::addr_of!(BUS)).as_ref().unwrap()
        };

        let winusb = MicrosoftDescriptors;
        let dap_v1 = CmsisDapV1::new(bus);
        let dap_v2 = CmsisDapV2::new(bus);
        let dfu = DfuRuntime::new(bus);
        let serial = SerialPort::new(bus);

        let device = UsbDeviceBuilder::new(bus, UsbVidPid(0x1209, 0xFF51))
            .manufacturer("probe")
            .product("CMSIS-DAP debug probe")
            .serial_number("0")
            .device_class(0)
            .build();

        Usb {
            device,
            winusb,
            dap_v1,
            dap_v2,
            dfu,
            serial,
        }
    }

    /// Poll the USB stack. Returns `Some(Request)` when a new DAP command
    /// or console write has arrived from the host.
    pub fn poll(&mut self) -> Option<Request> {
        if self.device.poll(&mut [
            &mut self.winusb,
            &mut self.dap_v1,
            &mut self.dap_v2,
            &mut self.dfu,
            &mut self.serial,
        ]) {
            let r = self.dap_v1.process();
            if r.is_some() {
                return r;
            }
            let r = self.dap_v2.process();
            if r.is_some() {
                return r;
            }

            let mut buf = [0u8; VCP_BUF_LEN];
            if let Ok(n) = self.serial.read(&mut buf) {
                if n > 0 {
                    let mut packet = [0u8; crate::VCP_PACKET_SIZE as usize];
                    let n = n.min(packet.len());
                    packet[..n].copy_from_slice(&buf[..n]);
                    return Some(Request::VcpPacket((packet, n)));
                }
            }
        }
        None
    }

    pub fn dap1_reply(&mut self, data: &[u8]) {
        self.dap_v1.write_packet(data).expect("DAPv1 EP write failed");
    }

    pub fn dap2_reply(&mut self, data: &[u8]) {
        self.dap_v2.write_packet(data).expect("DAPv2 EP write failed");
    }

    pub fn dap2_swo_is_busy(&self) -> bool {
        self.dap_v2.trace_busy()
    }

    pub fn dap2_stream_swo(&mut self, data: &[u8]) {
        self.dap_v2.trace_write(data).expect("trace EP write failed");
    }

    pub fn console_write(&mut self, data: &[u8]) {
        let _ = self.serial.write(data);
    }
}

const VCP_BUF_LEN: usize = crate::VCP_PACKET_SIZE as usize;
