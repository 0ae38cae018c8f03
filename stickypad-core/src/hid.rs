//! HID output side: the sink trait and a boot keyboard report built from it.

use crate::keycode::Modifier;

/// Receives key events from the dispatcher.
///
/// Codes are HID usage IDs; modifiers use 0xE0..=0xE7. Implementations must
/// accept a press of a code that is already pressed.
pub trait HidSink {
    fn press(&mut self, usage: u8);
    fn release(&mut self, usage: u8);
    fn release_all(&mut self);
}

impl<T: HidSink + ?Sized> HidSink for &mut T {
    fn press(&mut self, usage: u8) {
        (**self).press(usage)
    }

    fn release(&mut self, usage: u8) {
        (**self).release(usage)
    }

    fn release_all(&mut self) {
        (**self).release_all()
    }
}

/// One sink call, for recording sinks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HidEvent {
    Press(u8),
    Release(u8),
    ReleaseAll,
}

impl HidEvent {
    /// Replay this event into `sink`.
    pub fn apply(self, sink: &mut impl HidSink) {
        match self {
            HidEvent::Press(usage) => sink.press(usage),
            HidEvent::Release(usage) => sink.release(usage),
            HidEvent::ReleaseAll => sink.release_all(),
        }
    }
}

/// Standard USB HID keyboard report (8 bytes).
/// Byte 0: modifier keys bitmask
/// Byte 1: reserved (0x00)
/// Bytes 2-7: up to 6 simultaneous keycodes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyboardReport {
    pub modifiers: u8,
    pub reserved: u8,
    pub keys: [u8; 6],
}

impl KeyboardReport {
    pub const fn empty() -> Self {
        Self {
            modifiers: 0,
            reserved: 0,
            keys: [0; 6],
        }
    }

    pub fn as_bytes(&self) -> [u8; 8] {
        let k = self.keys;
        [self.modifiers, self.reserved, k[0], k[1], k[2], k[3], k[4], k[5]]
    }
}

impl Default for KeyboardReport {
    fn default() -> Self {
        Self::empty()
    }
}

/// [`HidSink`] that keeps the current 6KRO report.
///
/// Pressing a seventh non-modifier key while six are held drops it; its
/// later release is then a no-op.
#[derive(Clone, Debug, Default)]
pub struct ReportSink {
    report: KeyboardReport,
}

impl ReportSink {
    pub const fn new() -> Self {
        Self {
            report: KeyboardReport::empty(),
        }
    }

    pub fn report(&self) -> &KeyboardReport {
        &self.report
    }
}

impl HidSink for ReportSink {
    fn press(&mut self, usage: u8) {
        if let Some(m) = Modifier::from_usage(usage) {
            self.report.modifiers |= m.bit();
            return;
        }
        if usage == 0 || self.report.keys.contains(&usage) {
            return;
        }
        match self.report.keys.iter_mut().find(|slot| **slot == 0) {
            Some(slot) => *slot = usage,
            None => log::trace!("report full, dropping usage {:#04x}", usage),
        }
    }

    fn release(&mut self, usage: u8) {
        if let Some(m) = Modifier::from_usage(usage) {
            self.report.modifiers &= !m.bit();
            return;
        }
        for slot in self.report.keys.iter_mut().filter(|slot| **slot == usage) {
            *slot = 0;
        }
    }

    fn release_all(&mut self) {
        self.report = KeyboardReport::empty();
    }
}
