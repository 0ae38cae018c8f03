//! Active layer resolution.

use crate::keymap::{SpecialKeys, BASE_LAYER, FUNC_LAYER, LAYER1, SHIFT_LAYER};
use crate::matrix::Matrix;
use crate::sticky::{Latch, StickyState};

/// Resolve which layer is active from the debounced matrix and the sticky
/// latches.
///
/// A layer, func or shift input counts as active when its latch is set or
/// any of its keys is held. Layer 1 needs the layer input; with shift it
/// becomes layer 3, and with func layer 2. Func takes precedence when both
/// shift and func are active.
pub fn resolve_layer<const ROWS: usize, const COLS: usize>(
    matrix: &Matrix<ROWS, COLS>,
    sticky: &StickyState,
    specials: &SpecialKeys,
) -> usize {
    let active_l1 = sticky.is_latched(Latch::Layer1) || matrix.any_of(&specials.layer);
    let active_func = sticky.is_latched(Latch::Func) || matrix.any_of(&specials.func);
    let active_shift = sticky.is_latched(Latch::Shift) || matrix.any_of(&specials.shift);

    let mut layer = BASE_LAYER;
    if active_l1 {
        layer = LAYER1;
    }
    if active_l1 && active_shift {
        layer = SHIFT_LAYER;
    }
    if active_l1 && active_func {
        layer = FUNC_LAYER;
    }

    layer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::Cell;
    use crate::hid::ReportSink;
    use crate::keymap::Position;
    use rstest::rstest;

    const LAYER_KEY: Position = Position::new(0, 0);
    const FUNC_KEY: Position = Position::new(0, 1);
    const SHIFT_KEY: Position = Position::new(0, 2);

    fn specials() -> SpecialKeys {
        let mut s = SpecialKeys::default();
        s.layer.push(LAYER_KEY).unwrap();
        s.func.push(FUNC_KEY).unwrap();
        s.shift.push(SHIFT_KEY).unwrap();
        s
    }

    fn held(l1: bool, func: bool, shift: bool) -> Matrix<1, 3> {
        let mut matrix = Matrix::new();
        for (cell, pressed) in matrix.cells_mut()[0].iter_mut().zip([l1, func, shift]) {
            *cell = Cell { stable: pressed, ..Cell::new() };
        }
        matrix
    }

    #[rstest]
    #[case(false, false, false, BASE_LAYER)]
    #[case(false, true, true, BASE_LAYER)]
    #[case(true, false, false, LAYER1)]
    #[case(true, false, true, SHIFT_LAYER)]
    #[case(true, true, false, FUNC_LAYER)]
    #[case(true, true, true, FUNC_LAYER)]
    fn held_keys(#[case] l1: bool, #[case] func: bool, #[case] shift: bool, #[case] expected: usize) {
        let layer = resolve_layer(&held(l1, func, shift), &StickyState::new(), &specials());
        assert_eq!(layer, expected);
    }

    #[rstest]
    #[case(&[Latch::Layer1], LAYER1)]
    #[case(&[Latch::Layer1, Latch::Shift], SHIFT_LAYER)]
    #[case(&[Latch::Layer1, Latch::Func, Latch::Shift], FUNC_LAYER)]
    #[case(&[Latch::Func, Latch::Shift], BASE_LAYER)]
    fn latched_inputs(#[case] latches: &[Latch], #[case] expected: usize) {
        let mut sticky = StickyState::new();
        sticky.toggle_mode(&mut ReportSink::new());
        for latch in latches {
            sticky.toggle_latch(*latch);
        }

        let layer = resolve_layer(&held(false, false, false), &sticky, &specials());
        assert_eq!(layer, expected);
    }

    #[test]
    fn latch_and_held_key_combine() {
        let mut sticky = StickyState::new();
        sticky.toggle_mode(&mut ReportSink::new());
        sticky.toggle_latch(Latch::Layer1);

        let layer = resolve_layer(&held(false, false, true), &sticky, &specials());
        assert_eq!(layer, SHIFT_LAYER);
    }
}
