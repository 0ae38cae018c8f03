//! Per-key debounce logic.
//!
//! Each cell remembers its last raw sample and when that sample last
//! changed. The debounced state follows the raw signal only once the raw
//! signal has held still for the debounce interval, so contact bounce shorter
//! than the interval never shows up. Cells are independent of each other.

/// Millisecond timestamp from a free-running clock. Differences are taken
/// with wrapping arithmetic, so the clock may roll over.
pub type Millis = u32;

/// Default hold time before a raw change is accepted.
pub const DEBOUNCE_MS: Millis = 5;

/// State of one matrix position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    /// Debounced state: true = pressed.
    pub stable: bool,
    /// Last raw sample.
    pub raw_last: bool,
    /// When `raw_last` last changed.
    pub changed_at: Millis,
    /// Last state the dispatcher acted on.
    pub dispatched: bool,
}

impl Cell {
    pub const fn new() -> Self {
        Self {
            stable: false,
            raw_last: false,
            changed_at: 0,
            dispatched: false,
        }
    }

    /// Feed one raw sample taken at `now`.
    /// Returns whether the debounced state changed.
    pub fn update(&mut self, sample: bool, now: Millis, debounce_ms: Millis) -> bool {
        if sample != self.raw_last {
            self.raw_last = sample;
            self.changed_at = now;
        }

        if sample != self.stable && now.wrapping_sub(self.changed_at) >= debounce_ms {
            self.stable = sample;
            return true;
        }

        false
    }

    /// Whether the dispatcher still has to act on this cell.
    pub fn is_pending(&self) -> bool {
        self.stable != self.dispatched
    }
}
