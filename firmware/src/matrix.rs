//! Matrix wiring on the Teensy 2.0.
//!
//! The six columns are driven from PB0-PB3, PD2 and PD3; the four rows are
//! read on PF0, PF1, PF4 and PF5. The AVR only has pull-ups, so the wiring
//! is active low: a strobed column is driven low and a closed switch pulls
//! its row low. [`GpioPins`] inverts both so the scanner sees the usual
//! "true = active" convention.

use avr_device::atmega32u4::Peripherals;
use stickypad_core::layout::{COLS, ROWS};
use stickypad_core::PinIo;

#[derive(Clone, Copy)]
enum Port {
    B,
    D,
}

/// Column drive pins, column 0 first.
const COLUMN_PINS: [(Port, u8); COLS] = [
    (Port::B, 0),
    (Port::B, 1),
    (Port::B, 2),
    (Port::B, 3),
    (Port::D, 2),
    (Port::D, 3),
];

/// Row read pins on port F, row 0 first.
const ROW_PINS: [u8; ROWS] = [0, 1, 4, 5];

const PORTB_COLUMNS: u8 = 0x0F;
const PORTD_COLUMNS: u8 = 0x0C;
const PORTF_ROWS: u8 = 0x33;

/// Configure column pins as outputs driven high (inactive) and row pins as
/// inputs with pull-ups.
pub fn init_gpio(dp: &Peripherals) {
    dp.PORTB.ddrb.modify(|r, w| unsafe { w.bits(r.bits() | PORTB_COLUMNS) });
    dp.PORTB.portb.modify(|r, w| unsafe { w.bits(r.bits() | PORTB_COLUMNS) });
    dp.PORTD.ddrd.modify(|r, w| unsafe { w.bits(r.bits() | PORTD_COLUMNS) });
    dp.PORTD.portd.modify(|r, w| unsafe { w.bits(r.bits() | PORTD_COLUMNS) });

    dp.PORTF.ddrf.modify(|r, w| unsafe { w.bits(r.bits() & !PORTF_ROWS) });
    dp.PORTF.portf.modify(|r, w| unsafe { w.bits(r.bits() | PORTF_ROWS) });
}

/// [`PinIo`] over the Teensy's GPIO registers.
pub struct GpioPins<'a> {
    dp: &'a Peripherals,
}

impl<'a> GpioPins<'a> {
    pub fn new(dp: &'a Peripherals) -> Self {
        Self { dp }
    }
}

impl PinIo for GpioPins<'_> {
    fn set_column(&mut self, index: usize, active: bool) {
        let Some(&(port, bit)) = COLUMN_PINS.get(index) else {
            return;
        };
        let mask = 1u8 << bit;
        let level = |bits: u8| if active { bits & !mask } else { bits | mask };

        match port {
            Port::B => self.dp.PORTB.portb.modify(|r, w| unsafe { w.bits(level(r.bits())) }),
            Port::D => self.dp.PORTD.portd.modify(|r, w| unsafe { w.bits(level(r.bits())) }),
        }
    }

    fn read_row(&mut self, index: usize) -> bool {
        let Some(&bit) = ROW_PINS.get(index) else {
            return false;
        };
        self.dp.PORTF.pinf.read().bits() & (1 << bit) == 0
    }
}
