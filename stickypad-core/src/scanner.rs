//! The per-tick scan pipeline.

use embedded_hal::delay::DelayNs;

use crate::debounce::{Millis, DEBOUNCE_MS};
use crate::dispatch::dispatch;
use crate::hid::HidSink;
use crate::keymap::Keymap;
use crate::layer::resolve_layer;
use crate::matrix::{self, Matrix, PinIo, RawMatrix, SETTLE_US};
use crate::sticky::StickyState;

/// Timing parameters of a scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanConfig {
    /// Hold time before a raw change is accepted.
    pub debounce_ms: Millis,
    /// Wait between strobing a column and reading the rows.
    pub settle_us: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEBOUNCE_MS,
            settle_us: SETTLE_US,
        }
    }
}

/// Outcome of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    /// Layer used for this tick's dispatch.
    pub layer: usize,
    /// At least one key is debounced-pressed; drives the status indicator.
    pub any_pressed: bool,
}

/// Owns all mutable keyboard state: the debounced matrix and the sticky
/// state. One call to [`Scanner::tick`] is one complete scan.
#[derive(Debug)]
pub struct Scanner<'k, const ROWS: usize, const COLS: usize> {
    keymap: &'k Keymap<ROWS, COLS>,
    config: ScanConfig,
    matrix: Matrix<ROWS, COLS>,
    sticky: StickyState,
    last_layer: usize,
}

impl<'k, const ROWS: usize, const COLS: usize> Scanner<'k, ROWS, COLS> {
    pub fn new(keymap: &'k Keymap<ROWS, COLS>, config: ScanConfig) -> Self {
        Self {
            keymap,
            config,
            matrix: Matrix::new(),
            sticky: StickyState::new(),
            last_layer: 0,
        }
    }

    /// Scan the hardware and process the result.
    pub fn tick<P, D, S>(&mut self, pins: &mut P, delay: &mut D, sink: &mut S, now: Millis) -> Tick
    where
        P: PinIo + ?Sized,
        D: DelayNs + ?Sized,
        S: HidSink,
    {
        let raw = matrix::scan(pins, delay, self.config.settle_us);
        self.process(&raw, sink, now)
    }

    /// Debounce a raw scan, resolve the layer and dispatch events.
    pub fn process<S: HidSink>(&mut self, raw: &RawMatrix<ROWS, COLS>, sink: &mut S, now: Millis) -> Tick {
        self.matrix.debounce(raw, now, self.config.debounce_ms);

        let layer = resolve_layer(&self.matrix, &self.sticky, self.keymap.specials());
        if layer != self.last_layer {
            log::trace!("layer {} -> {}", self.last_layer, layer);
            self.last_layer = layer;
        }

        dispatch(&mut self.matrix, self.keymap, layer, &mut self.sticky, sink);

        Tick {
            layer,
            any_pressed: self.matrix.any_pressed(),
        }
    }

    pub fn sticky(&self) -> &StickyState {
        &self.sticky
    }
}
