//! USB boot keyboard on the ATmega32U4's device controller.
//!
//! Polled, no interrupts. Endpoint 0 answers enumeration, endpoint 1 carries
//! the 8-byte boot report built by the core's `ReportSink`.

use avr_device::atmega32u4::Peripherals;
use stickypad_core::KeyboardReport;

const EP0_SIZE: u8 = 64;
const REPORT_EP: u8 = 1;
const REPORT_SIZE: u8 = 8;

/// Iterations to wait for the report endpoint before giving up on a frame.
const SEND_TIMEOUT: u16 = 0xFFFF;

static REPORT_DESCRIPTOR: [u8; 63] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x05, 0x07, //   Usage Page (Keyboard)
    0x19, 0xE0, //   Usage Minimum (LCtrl)
    0x29, 0xE7, //   Usage Maximum (RGui)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant)
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (1)
    0x29, 0x05, //   Usage Maximum (5)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x01, //   Output (Constant)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x65, //   Logical Maximum (101)
    0x05, 0x07, //   Usage Page (Keyboard)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0x65, //   Usage Maximum (Application)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
];

static DEVICE_DESCRIPTOR: [u8; 18] = [
    18, 1, // bLength, Device
    0x00, 0x02, // USB 2.0
    0, 0, 0, // class defined per interface
    EP0_SIZE,
    0xC0, 0x16, // idVendor 0x16C0
    0xDB, 0x27, // idProduct 0x27DB (shared keyboard PID)
    0x01, 0x00, // bcdDevice 1.0
    1, 2, 0, // manufacturer, product, no serial
    1, // configurations
];

static CONFIG_DESCRIPTOR: [u8; 34] = [
    9, 2, 34, 0, // Configuration, wTotalLength = 34
    1, 1, 0, // one interface, value 1, no string
    0x80, 50, // bus powered, 100mA
    // Interface: HID boot keyboard
    9, 4, 0, 0, 1, 3, 1, 1, 0,
    // HID 1.11
    9, 0x21, 0x11, 0x01, 0, 1, 0x22, REPORT_DESCRIPTOR.len() as u8, 0,
    // Endpoint 1 IN, interrupt, 8 bytes, 10ms
    7, 5, 0x80 | REPORT_EP, 0x03, REPORT_SIZE, 0, 10,
];

static LANGUAGES: [u8; 4] = [4, 3, 0x09, 0x04];

static MANUFACTURER: [u8; 20] = [
    20, 3, b'S', 0, b't', 0, b'i', 0, b'c', 0, b'k', 0, b'y', 0, b'p', 0, b'a', 0, b'd', 0,
];

static PRODUCT: [u8; 14] = [14, 3, b'K', 0, b'e', 0, b'y', 0, b'p', 0, b'a', 0, b'd', 0];

/// The 8-byte SETUP packet of a control transfer.
struct Setup {
    request_type: u8,
    request: u8,
    value: u16,
    length: u16,
}

impl Setup {
    fn read(dp: &Peripherals) -> Self {
        let usb = &dp.USB_DEVICE;
        let mut bytes = [0u8; 8];
        for byte in &mut bytes {
            *byte = usb.uedatx.read().bits();
        }
        Self {
            request_type: bytes[0],
            request: bytes[1],
            value: u16::from_le_bytes([bytes[2], bytes[3]]),
            length: u16::from_le_bytes([bytes[6], bytes[7]]),
        }
    }

    fn descriptor_type(&self) -> u8 {
        (self.value >> 8) as u8
    }

    fn descriptor_index(&self) -> u8 {
        self.value as u8
    }
}

enum Request {
    GetDescriptor,
    SetAddress,
    SetConfiguration,
    GetConfiguration,
    GetReportDescriptor,
    GetReport,
    SetIdle,
    SetProtocol,
    Unsupported,
}

impl From<&Setup> for Request {
    fn from(setup: &Setup) -> Self {
        match (setup.request_type, setup.request) {
            (0x80, 0x06) => Request::GetDescriptor,
            (0x00, 0x05) => Request::SetAddress,
            (0x00, 0x09) => Request::SetConfiguration,
            (0x80, 0x08) => Request::GetConfiguration,
            (0x81, 0x06) if setup.descriptor_type() == 0x22 => Request::GetReportDescriptor,
            (0xA1, 0x01) => Request::GetReport,
            (0x21, 0x0A) => Request::SetIdle,
            (0x21, 0x0B) => Request::SetProtocol,
            _ => Request::Unsupported,
        }
    }
}

pub struct UsbKeyboard {
    configured: bool,
    sent: KeyboardReport,
}

impl UsbKeyboard {
    pub const fn new() -> Self {
        Self {
            configured: false,
            sent: KeyboardReport::empty(),
        }
    }

    /// Power the pad regulator, lock the PLL to 48MHz and attach to the bus.
    pub fn init(&mut self, dp: &Peripherals) {
        let usb = &dp.USB_DEVICE;

        // Pad regulator on
        usb.uhwcon.write(|w| w.uvrege().set_bit());
        // Controller and VBUS pad on, clock still frozen
        usb.usbcon.write(|w| w.usbe().set_bit().otgpade().set_bit());

        // 16MHz crystal, divide by 2 into the PLL
        dp.PLL.pllcsr.write(|w| w.pindiv().set_bit().plle().set_bit());
        // Wait for PLL lock
        while dp.PLL.pllcsr.read().plock().bit_is_clear() {}

        // Unfreeze the USB clock, then attach to the bus
        usb.usbcon.modify(|_, w| w.frzclk().clear_bit());
        usb.udcon.modify(|_, w| w.detach().clear_bit());

        self.configured = false;
    }

    /// Handle bus resets and control requests. Call once per scan.
    pub fn poll(&mut self, dp: &Peripherals) {
        let usb = &dp.USB_DEVICE;

        // End of bus reset: endpoints are gone, start over
        if usb.udint.read().eorsti().bit_is_set() {
            usb.udint.modify(|_, w| w.eorsti().clear_bit());
            self.configure_control(dp);
            self.configured = false;
            self.sent = KeyboardReport::empty();
        }

        select(dp, 0);
        if usb.ueintx.read().rxstpi().bit_is_set() {
            let setup = Setup::read(dp);
            // Acknowledge the SETUP packet
            usb.ueintx.modify(|_, w| w.rxstpi().clear_bit());
            self.handle(dp, &setup);
        }
    }

    /// Send `report` if it differs from the last one the host accepted.
    pub fn send_report(&mut self, dp: &Peripherals, report: &KeyboardReport) {
        if !self.configured || *report == self.sent {
            return;
        }

        let usb = &dp.USB_DEVICE;
        select(dp, REPORT_EP);

        // RWAL set: the bank has room for the report
        let mut timeout = SEND_TIMEOUT;
        while usb.ueintx.read().rwal().bit_is_clear() {
            timeout -= 1;
            if timeout == 0 {
                return;
            }
        }

        for byte in report.as_bytes() {
            usb.uedatx.write(|w| w.bits(byte));
        }
        // Clear FIFOCON and TXINI to hand the bank to the controller
        usb.ueintx.modify(|_, w| w.fifocon().clear_bit().txini().clear_bit());

        self.sent = *report;
    }

    fn handle(&mut self, dp: &Peripherals, setup: &Setup) {
        match Request::from(setup) {
            Request::GetDescriptor => match descriptor(setup) {
                Some(desc) => send_control(dp, desc, setup.length),
                None => stall(dp),
            },
            Request::SetAddress => {
                // The new address only applies after the status stage
                ack(dp);
                wait_in_ready(dp);
                let address = setup.value as u8 & 0x7F;
                dp.USB_DEVICE.udaddr.write(|w| w.uadd().bits(address).adden().set_bit());
            }
            Request::SetConfiguration => {
                ack(dp);
                self.configure_report(dp);
                self.configured = true;
            }
            Request::GetConfiguration => {
                send_control(dp, &[u8::from(self.configured)], setup.length);
            }
            Request::GetReportDescriptor => {
                send_control(dp, &REPORT_DESCRIPTOR, setup.length);
            }
            Request::GetReport => send_control(dp, &self.sent.as_bytes(), setup.length),
            Request::SetIdle | Request::SetProtocol => ack(dp),
            Request::Unsupported => stall(dp),
        }
    }

    fn configure_control(&self, dp: &Peripherals) {
        let usb = &dp.USB_DEVICE;
        select(dp, 0);
        usb.ueconx.write(|w| w.epen().set_bit());
        // Control type
        usb.uecfg0x.write(|w| w.eptype().bits(0b00));
        // 64-byte bank
        usb.uecfg1x.write(|w| w.epsize().bits(0b011).alloc().set_bit());
    }

    fn configure_report(&self, dp: &Peripherals) {
        let usb = &dp.USB_DEVICE;
        select(dp, REPORT_EP);
        usb.ueconx.write(|w| w.epen().set_bit());
        // Interrupt type, IN direction
        usb.uecfg0x.write(|w| w.eptype().bits(0b11).epdir().set_bit());
        // 8-byte bank
        usb.uecfg1x.write(|w| w.epsize().bits(0b000).alloc().set_bit());
    }
}

fn descriptor(setup: &Setup) -> Option<&'static [u8]> {
    match (setup.descriptor_type(), setup.descriptor_index()) {
        (1, _) => Some(&DEVICE_DESCRIPTOR),
        (2, _) => Some(&CONFIG_DESCRIPTOR),
        (3, 0) => Some(&LANGUAGES),
        (3, 1) => Some(&MANUFACTURER),
        (3, 2) => Some(&PRODUCT),
        _ => None,
    }
}

fn select(dp: &Peripherals, ep: u8) {
    dp.USB_DEVICE.uenum.write(|w| w.bits(ep & 0x07));
}

fn wait_in_ready(dp: &Peripherals) {
    while dp.USB_DEVICE.ueintx.read().txini().bit_is_clear() {}
}

/// Zero-length status stage.
fn ack(dp: &Peripherals) {
    dp.USB_DEVICE.ueintx.modify(|_, w| w.txini().clear_bit());
}

fn stall(dp: &Peripherals) {
    dp.USB_DEVICE.ueconx.modify(|_, w| w.stallrq().set_bit());
}

/// IN data stage in EP0-sized chunks, truncated to what the host asked for.
fn send_control(dp: &Peripherals, data: &[u8], requested: u16) {
    let usb = &dp.USB_DEVICE;
    let len = data.len().min(usize::from(requested));

    for chunk in data[..len].chunks(usize::from(EP0_SIZE)) {
        wait_in_ready(dp);
        for &byte in chunk {
            usb.uedatx.write(|w| w.bits(byte));
        }
        ack(dp);
    }

    // Status stage: the host answers with a zero-length OUT
    while usb.ueintx.read().rxouti().bit_is_clear() {}
    usb.ueintx.modify(|_, w| w.rxouti().clear_bit());
}
