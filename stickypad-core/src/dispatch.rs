//! Edge-triggered event dispatch.
//!
//! Each cell remembers the last state it produced an event for. A cell is
//! only visited when its debounced state has moved away from that, so every
//! physical transition yields exactly one event and held keys yield none.

use crate::hid::HidSink;
use crate::keycode::Keycode;
use crate::keymap::Keymap;
use crate::matrix::Matrix;
use crate::sticky::{Latch, StickyState};

/// Act on every cell whose debounced state changed since it was last
/// dispatched, resolving keycodes through `layer`.
pub fn dispatch<S, const ROWS: usize, const COLS: usize>(
    matrix: &mut Matrix<ROWS, COLS>,
    keymap: &Keymap<ROWS, COLS>,
    layer: usize,
    sticky: &mut StickyState,
    sink: &mut S,
) where
    S: HidSink,
{
    for (row, cells) in matrix.cells_mut().iter_mut().enumerate() {
        for (col, cell) in cells.iter_mut().enumerate() {
            if !cell.is_pending() {
                continue;
            }
            cell.dispatched = cell.stable;

            let code = keymap.code(layer, row, col);
            log::trace!(
                "({}, {}) {} on layer {}: {}",
                row,
                col,
                if cell.stable { "down" } else { "up" },
                layer,
                code
            );
            handle_edge(code, cell.stable, sticky, sink);
        }
    }
}

fn handle_edge<S>(code: Keycode, pressed: bool, sticky: &mut StickyState, sink: &mut S)
where
    S: HidSink,
{
    match code {
        Keycode::Blank => {}
        Keycode::Layer => sticky.handle_toggle_key(Latch::Layer1, pressed),
        Keycode::Func => sticky.handle_toggle_key(Latch::Func, pressed),
        Keycode::Sticky => {
            if pressed {
                sticky.toggle_mode(&mut *sink);
            }
        }
        Keycode::Modifier(modifier) => {
            if sticky.handle_modifier(modifier, pressed) {
                return;
            }
            if pressed {
                sink.press(modifier.usage());
            } else {
                sink.release(modifier.usage());
            }
        }
        Keycode::Key(key) => {
            if pressed {
                sticky.inject_modifiers(&mut *sink);
                sink.press(key.usage());
            } else {
                sink.release(key.usage());
            }
        }
    }
}
