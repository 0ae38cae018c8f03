//! Default keymap for the one-handed stickypad board.
//!
//! 4 rows × 6 columns, left hand. Layer 1 mirrors the right hand's letters
//! onto the same keys, layer 2 (layer + func) holds navigation and function
//! keys, layer 3 (layer + shift) holds digits and brackets. The special keys
//! sit in the same place on every layer.

use crate::keycode::{Key, Keycode, Modifier};
use crate::keymap::{Keymap, KeymapError, Layers};

/// Number of rows in the matrix.
pub const ROWS: usize = 4;
/// Number of columns in the matrix.
pub const COLS: usize = 6;

/// Key is unused in the matrix position.
const ___: Keycode = Keycode::Blank;

const fn k(key: Key) -> Keycode {
    Keycode::Key(key)
}

/// Shorthand aliases for readability.
const LY1: Keycode = Keycode::Layer;
const FN: Keycode = Keycode::Func;
const STKY: Keycode = Keycode::Sticky;
const LSFT: Keycode = Keycode::Modifier(Modifier::LShift);
const LCTL: Keycode = Keycode::Modifier(Modifier::LCtrl);
const LALT: Keycode = Keycode::Modifier(Modifier::LAlt);
const SPC: Keycode = k(Key::Space);

/// Keymap layers, `[layer][row][col]`.
pub static LAYERS: Layers<ROWS, COLS> = [
    // Layer 0: left-hand QWERTY
    [
        [k(Key::Escape), k(Key::Q), k(Key::W), k(Key::E), k(Key::R), k(Key::T)],
        [k(Key::Tab), k(Key::A), k(Key::S), k(Key::D), k(Key::F), k(Key::G)],
        [LSFT, k(Key::Z), k(Key::X), k(Key::C), k(Key::V), k(Key::B)],
        [STKY, LCTL, LALT, LY1, SPC, FN],
    ],
    // Layer 1: right-hand letters, mirrored
    [
        [k(Key::Backspace), k(Key::P), k(Key::O), k(Key::I), k(Key::U), k(Key::Y)],
        [k(Key::Enter), k(Key::Semicolon), k(Key::L), k(Key::K), k(Key::J), k(Key::H)],
        [LSFT, k(Key::Slash), k(Key::Dot), k(Key::Comma), k(Key::M), k(Key::N)],
        [STKY, LCTL, LALT, LY1, SPC, FN],
    ],
    // Layer 2: navigation and function keys
    [
        [k(Key::Grave), k(Key::F1), k(Key::F2), k(Key::F3), k(Key::F4), k(Key::F5)],
        [k(Key::CapsLock), k(Key::Left), k(Key::Down), k(Key::Up), k(Key::Right), k(Key::F6)],
        [LSFT, k(Key::Home), k(Key::PageDown), k(Key::PageUp), k(Key::End), k(Key::F7)],
        [STKY, LCTL, LALT, LY1, k(Key::Delete), FN],
    ],
    // Layer 3: digits and symbols
    [
        [___, k(Key::N1), k(Key::N2), k(Key::N3), k(Key::N4), k(Key::N5)],
        [___, k(Key::N6), k(Key::N7), k(Key::N8), k(Key::N9), k(Key::N0)],
        [LSFT, k(Key::Minus), k(Key::Equal), k(Key::LBracket), k(Key::RBracket), ___],
        [STKY, LCTL, LALT, LY1, ___, FN],
    ],
];

/// Build the default keymap.
pub fn keymap() -> Result<Keymap<ROWS, COLS>, KeymapError> {
    Keymap::new(LAYERS)
}
