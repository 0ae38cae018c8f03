//! Busy-wait delays and the millisecond clock used for debouncing.

use avr_device::atmega32u4::Peripherals;
use embedded_hal::delay::DelayNs;
use stickypad_core::Millis;

/// Nanoseconds per iteration of the `nop` loop at 16MHz (~4 cycles).
const NS_PER_SPIN: u32 = 250;

/// Blocking delay that spins on `nop`. Accuracy is approximate.
pub struct BusyDelay;

impl DelayNs for BusyDelay {
    fn delay_ns(&mut self, ns: u32) {
        for _ in 0..ns.div_ceil(NS_PER_SPIN) {
            unsafe { core::arch::asm!("nop") };
        }
    }
}

/// Timer1 prescaler clk/64: one count every 4us at 16MHz.
const TIMER1_CLK_DIV_64: u8 = 0x03;
const US_PER_COUNT: u32 = 4;

/// Millisecond clock built on free-running Timer1.
///
/// The 16-bit counter wraps every ~262ms, so [`Clock::now`] must be called
/// more often than that. The scan loop calls it every tick.
pub struct Clock {
    last_count: u16,
    micros: u32,
    millis: Millis,
}

impl Clock {
    /// Start Timer1 in normal mode.
    pub fn start(dp: &Peripherals) -> Self {
        dp.TC1.tccr1a.write(|w| unsafe { w.bits(0) });
        dp.TC1.tccr1b.write(|w| unsafe { w.bits(TIMER1_CLK_DIV_64) });

        Self {
            last_count: dp.TC1.tcnt1.read().bits(),
            micros: 0,
            millis: 0,
        }
    }

    pub fn now(&mut self, dp: &Peripherals) -> Millis {
        let count = dp.TC1.tcnt1.read().bits();
        let elapsed = count.wrapping_sub(self.last_count);
        self.last_count = count;

        self.micros += u32::from(elapsed) * US_PER_COUNT;
        self.millis = self.millis.wrapping_add(self.micros / 1000);
        self.micros %= 1000;

        self.millis
    }
}
