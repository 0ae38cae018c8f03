//! Plain-text rendering of a keymap, one grid per layer.

use std::fmt::Write;

use stickypad_core::keymap::{BASE_LAYER, FUNC_LAYER, LAYER1, SHIFT_LAYER};
use stickypad_core::{Keymap, Position, NUM_LAYERS};

/// Width of one key cell, borders excluded.
const CELL: usize = 6;

fn layer_title(layer: usize) -> &'static str {
    match layer {
        BASE_LAYER => "base",
        LAYER1 => "layer",
        FUNC_LAYER => "layer + func",
        SHIFT_LAYER => "layer + shift",
        _ => "",
    }
}

fn border(out: &mut String, cols: usize) {
    out.push('+');
    for _ in 0..cols {
        out.push_str(&"-".repeat(CELL));
        out.push('+');
    }
    out.push('\n');
}

fn positions(list: &[Position]) -> String {
    if list.is_empty() {
        return "none".to_owned();
    }
    list.iter()
        .map(|p| format!("({}, {})", p.row, p.col))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render every layer as a grid, special keys marked with `*`, followed by
/// the special key positions found on the base layer.
pub fn render<const ROWS: usize, const COLS: usize>(keymap: &Keymap<ROWS, COLS>) -> String {
    let mut out = String::new();

    for layer in 0..NUM_LAYERS {
        let _ = writeln!(out, "Layer {} ({})", layer, layer_title(layer));
        border(&mut out, COLS);
        for row in keymap.layer(layer) {
            out.push('|');
            for code in row {
                let mark = if code.is_special() { "*" } else { "" };
                let label = format!("{}{}", code.display_name(), mark);
                let _ = write!(out, "{:^width$}|", label, width = CELL);
            }
            out.push('\n');
            border(&mut out, COLS);
        }
        out.push('\n');
    }

    let s = keymap.specials();
    let _ = writeln!(out, "layer keys:  {}", positions(&s.layer));
    let _ = writeln!(out, "func keys:   {}", positions(&s.func));
    let _ = writeln!(out, "shift keys:  {}", positions(&s.shift));
    let _ = writeln!(out, "sticky keys: {}", positions(&s.sticky));

    out
}
