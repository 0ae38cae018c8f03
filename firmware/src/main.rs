//! Stickypad firmware for the ATmega32U4 (Teensy 2.0).
//!
//! Scans the 4x6 matrix once per millisecond through the core `Scanner` and
//! sends the resulting 6KRO report over USB. The on-board LED on PD6 is lit
//! while any key is held.

#![no_std]
#![no_main]
#![feature(asm_experimental_arch)]

mod matrix;
mod timing;
mod usb;

use avr_device::atmega32u4::Peripherals;
use embedded_hal::delay::DelayNs;
use stickypad_core::{layout, ReportSink, ScanConfig, Scanner};

use matrix::GpioPins;
use timing::{BusyDelay, Clock};
use usb::UsbKeyboard;

const LED: u8 = 1 << 6;

#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

fn set_led(dp: &Peripherals, on: bool) {
    dp.PORTD.portd.modify(|r, w| unsafe {
        w.bits(if on { r.bits() | LED } else { r.bits() & !LED })
    });
}

/// Blink forever. Used when the built-in keymap is unusable.
fn halt(dp: &Peripherals, delay: &mut BusyDelay) -> ! {
    let mut on = false;
    loop {
        on = !on;
        set_led(dp, on);
        delay.delay_ms(100);
    }
}

#[no_mangle]
pub extern "C" fn main() -> ! {
    let dp = unsafe { Peripherals::steal() };

    // Run at the full 16MHz regardless of the CLKDIV8 fuse
    dp.CPU.clkpr.write(|w| w.clkpce().set_bit());
    dp.CPU.clkpr.write(|w| unsafe { w.bits(0) });

    dp.PORTD.ddrd.modify(|r, w| unsafe { w.bits(r.bits() | LED) });
    matrix::init_gpio(&dp);

    let mut delay = BusyDelay;
    let Ok(keymap) = layout::keymap() else {
        halt(&dp, &mut delay);
    };

    let mut usb = UsbKeyboard::new();
    usb.init(&dp);

    let mut clock = Clock::start(&dp);
    let mut pins = GpioPins::new(&dp);
    let mut scanner = Scanner::new(&keymap, ScanConfig::default());
    let mut sink = ReportSink::new();

    loop {
        usb.poll(&dp);

        let now = clock.now(&dp);
        let tick = scanner.tick(&mut pins, &mut delay, &mut sink, now);

        set_led(&dp, tick.any_pressed);
        usb.send_report(&dp, sink.report());

        delay.delay_ms(1);
    }
}
