//! Key matrix scanning.
//!
//! Columns are strobed one at a time; rows are read while a column is
//! active. Rows follow the pulldown convention: `true` means the switch at
//! that row/column is closed.

use embedded_hal::delay::DelayNs;

use crate::debounce::{Cell, Millis};
use crate::keymap::Position;

/// Default wait between strobing a column and reading the rows.
pub const SETTLE_US: u32 = 10;

/// Raw strobe/read access to the matrix hardware.
pub trait PinIo {
    /// Drive a column active or inactive.
    fn set_column(&mut self, index: usize, active: bool);
    /// Sample a row input. `true` = signal present.
    fn read_row(&mut self, index: usize) -> bool;
}

/// One raw sample of every position, `[row][col]`.
pub type RawMatrix<const ROWS: usize, const COLS: usize> = [[bool; COLS]; ROWS];

/// Strobe every column in turn and sample all rows.
///
/// Blocks for `settle_us` after activating each column. Only one column is
/// active at any time.
pub fn scan<P, D, const ROWS: usize, const COLS: usize>(
    pins: &mut P,
    delay: &mut D,
    settle_us: u32,
) -> RawMatrix<ROWS, COLS>
where
    P: PinIo + ?Sized,
    D: DelayNs + ?Sized,
{
    let mut raw = [[false; COLS]; ROWS];

    for col in 0..COLS {
        pins.set_column(col, true);
        delay.delay_us(settle_us);

        for (row, samples) in raw.iter_mut().enumerate() {
            samples[col] = pins.read_row(row);
        }

        pins.set_column(col, false);
    }

    raw
}

/// Debounced matrix state.
#[derive(Clone, Debug)]
pub struct Matrix<const ROWS: usize, const COLS: usize> {
    cells: [[Cell; COLS]; ROWS],
}

impl<const ROWS: usize, const COLS: usize> Matrix<ROWS, COLS> {
    pub const fn new() -> Self {
        Self {
            cells: [[Cell::new(); COLS]; ROWS],
        }
    }

    /// Run every cell's debounce filter on a fresh raw scan.
    pub fn debounce(&mut self, raw: &RawMatrix<ROWS, COLS>, now: Millis, debounce_ms: Millis) {
        for (cells, samples) in self.cells.iter_mut().zip(raw) {
            for (cell, &sample) in cells.iter_mut().zip(samples) {
                cell.update(sample, now, debounce_ms);
            }
        }
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [[Cell; COLS]; ROWS] {
        &mut self.cells
    }

    /// Debounced state at `pos`.
    pub fn is_pressed(&self, pos: Position) -> bool {
        self.cells[pos.row][pos.col].stable
    }

    /// Whether any of `positions` is pressed.
    pub fn any_of(&self, positions: &[Position]) -> bool {
        positions.iter().any(|pos| self.is_pressed(*pos))
    }

    /// Whether at least one position is pressed, for the status indicator.
    pub fn any_pressed(&self) -> bool {
        self.cells.iter().flatten().any(|cell| cell.stable)
    }
}

impl<const ROWS: usize, const COLS: usize> Default for Matrix<ROWS, COLS> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pins backed by a fixed switch state; records strobe activity.
    struct FakePins {
        closed: RawMatrix<2, 3>,
        active: Option<usize>,
        strobes: std::vec::Vec<usize>,
    }

    impl PinIo for FakePins {
        fn set_column(&mut self, index: usize, active: bool) {
            if active {
                assert_eq!(self.active, None, "two columns active at once");
                self.active = Some(index);
                self.strobes.push(index);
            } else {
                assert_eq!(self.active, Some(index));
                self.active = None;
            }
        }

        fn read_row(&mut self, index: usize) -> bool {
            self.active.is_some_and(|col| self.closed[index][col])
        }
    }

    struct CountingDelay(u32);

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.0 += ns;
        }
    }

    #[test]
    fn scan_strobes_each_column_once() {
        let mut pins = FakePins {
            closed: [[false, true, false], [true, false, false]],
            active: None,
            strobes: std::vec::Vec::new(),
        };
        let mut delay = CountingDelay(0);
        let raw: RawMatrix<2, 3> = scan(&mut pins, &mut delay, SETTLE_US);

        assert_eq!(raw, pins.closed);
        assert_eq!(pins.strobes, [0, 1, 2]);
        assert_eq!(pins.active, None);
        assert_eq!(delay.0, 3 * SETTLE_US * 1_000);
    }

    #[test]
    fn debounce_runs_per_cell() {
        let mut matrix = Matrix::<2, 2>::new();
        let mut raw = [[false; 2]; 2];
        raw[0][1] = true;
        for now in 0..5 {
            matrix.debounce(&raw, now, 5);
        }
        assert!(!matrix.any_pressed());

        raw[1][0] = true;
        matrix.debounce(&raw, 5, 5);

        assert!(matrix.is_pressed(Position::new(0, 1)));
        assert!(!matrix.is_pressed(Position::new(1, 0)));
        assert!(matrix.any_of(&[Position::new(1, 1), Position::new(0, 1)]));
        assert!(!matrix.any_of(&[]));
    }
}
