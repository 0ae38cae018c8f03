//! Keymap table and the reverse lookup of special keys.

use heapless::Vec;

use crate::keycode::Keycode;

/// Number of layers: base, layer 1, func and layer 1 + shift.
pub const NUM_LAYERS: usize = 4;

pub const BASE_LAYER: usize = 0;
pub const LAYER1: usize = 1;
pub const FUNC_LAYER: usize = 2;
pub const SHIFT_LAYER: usize = 3;

/// Upper bound on matrix positions recorded per special key class.
pub const MAX_SPECIAL_KEYS: usize = 4;

/// Keycode table for every layer.
pub type Layers<const ROWS: usize, const COLS: usize> = [[[Keycode; COLS]; ROWS]; NUM_LAYERS];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

pub type Positions = Vec<Position, MAX_SPECIAL_KEYS>;

/// Matrix positions of the special keys on the base layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpecialKeys {
    pub layer: Positions,
    pub func: Positions,
    pub shift: Positions,
    pub sticky: Positions,
}

impl SpecialKeys {
    fn record(&mut self, code: Keycode, pos: Position) -> Result<(), KeymapError> {
        let (slot, kind) = match code {
            Keycode::Layer => (&mut self.layer, "layer"),
            Keycode::Func => (&mut self.func, "func"),
            Keycode::Sticky => (&mut self.sticky, "sticky"),
            Keycode::Modifier(m) if m.is_shift() => (&mut self.shift, "shift"),
            _ => return Ok(()),
        };
        slot.push(pos).map_err(|_| KeymapError::TooManySpecialKeys {
            kind,
            max: MAX_SPECIAL_KEYS,
        })
    }
}

/// Errors raised while building a keymap.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum KeymapError {
    #[error("more than {max} {kind} keys on the base layer")]
    TooManySpecialKeys { kind: &'static str, max: usize },
    #[error("unknown keycode at layer {layer}, row {row}, column {col}")]
    UnknownKeycode { layer: usize, row: usize, col: usize },
}

/// Immutable keymap for a `ROWS`×`COLS` matrix.
#[derive(Clone, Debug)]
pub struct Keymap<const ROWS: usize, const COLS: usize> {
    layers: Layers<ROWS, COLS>,
    specials: SpecialKeys,
}

impl<const ROWS: usize, const COLS: usize> Keymap<ROWS, COLS> {
    /// Build a keymap, scanning the base layer for special keys.
    pub fn new(layers: Layers<ROWS, COLS>) -> Result<Self, KeymapError> {
        let mut specials = SpecialKeys::default();
        for (row, codes) in layers[BASE_LAYER].iter().enumerate() {
            for (col, code) in codes.iter().enumerate() {
                specials.record(*code, Position::new(row, col))?;
            }
        }

        Ok(Self { layers, specials })
    }

    /// Build a keymap from a fallible per-position constructor, called in
    /// layer, row, column order.
    pub fn try_from_fn<F>(mut f: F) -> Result<Self, KeymapError>
    where
        F: FnMut(usize, usize, usize) -> Result<Keycode, KeymapError>,
    {
        let mut layers = [[[Keycode::Blank; COLS]; ROWS]; NUM_LAYERS];
        for (layer, rows) in layers.iter_mut().enumerate() {
            for (row, codes) in rows.iter_mut().enumerate() {
                for (col, code) in codes.iter_mut().enumerate() {
                    *code = f(layer, row, col)?;
                }
            }
        }

        Self::new(layers)
    }

    pub fn code(&self, layer: usize, row: usize, col: usize) -> Keycode {
        self.layers[layer][row][col]
    }

    pub fn layer(&self, layer: usize) -> &[[Keycode; COLS]; ROWS] {
        &self.layers[layer]
    }

    pub fn specials(&self) -> &SpecialKeys {
        &self.specials
    }

    /// Special keys whose code changes on a higher layer.
    ///
    /// The dispatcher resolves a release through the layer active at release
    /// time, so such a key may never see its own release. Yields the
    /// position, the offending layer and the code found there.
    pub fn inconsistent_specials(&self) -> impl Iterator<Item = (Position, usize, Keycode)> + '_ {
        let s = &self.specials;
        s.layer
            .iter()
            .chain(s.func.iter())
            .chain(s.shift.iter())
            .chain(s.sticky.iter())
            .flat_map(move |pos| {
                let base = self.code(BASE_LAYER, pos.row, pos.col);
                (1..NUM_LAYERS).filter_map(move |layer| {
                    let code = self.code(layer, pos.row, pos.col);
                    (code != base).then_some((*pos, layer, code))
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keycode::{Key, Modifier};

    const ___: Keycode = Keycode::Blank;
    const LY1: Keycode = Keycode::Layer;
    const FN: Keycode = Keycode::Func;
    const STKY: Keycode = Keycode::Sticky;
    const LSFT: Keycode = Keycode::Modifier(Modifier::LShift);
    const RSFT: Keycode = Keycode::Modifier(Modifier::RShift);
    const A: Keycode = Keycode::Key(Key::A);

    #[test]
    fn reverse_lookup_finds_special_keys() {
        let base = [[LSFT, A, LY1], [STKY, FN, RSFT]];
        let keymap = Keymap::new([base; NUM_LAYERS]).unwrap();
        let s = keymap.specials();

        assert_eq!(s.layer.as_slice(), &[Position::new(0, 2)]);
        assert_eq!(s.func.as_slice(), &[Position::new(1, 1)]);
        assert_eq!(s.shift.as_slice(), &[Position::new(0, 0), Position::new(1, 2)]);
        assert_eq!(s.sticky.as_slice(), &[Position::new(1, 0)]);
        assert_eq!(keymap.inconsistent_specials().count(), 0);
    }

    #[test]
    fn special_keys_only_come_from_the_base_layer() {
        let base = [[A, ___]];
        let upper = [[LY1, FN]];
        let keymap = Keymap::new([base, upper, upper, upper]).unwrap();

        assert!(keymap.specials().layer.is_empty());
        assert!(keymap.specials().func.is_empty());
    }

    #[test]
    fn too_many_special_keys() {
        let base = [[LY1; MAX_SPECIAL_KEYS + 1]];
        let err = Keymap::new([base; NUM_LAYERS]).unwrap_err();

        assert_eq!(
            err,
            KeymapError::TooManySpecialKeys { kind: "layer", max: MAX_SPECIAL_KEYS }
        );
    }

    #[test]
    fn reports_specials_that_change_between_layers() {
        let base = [[LY1, A]];
        let upper = [[___, A]];
        let keymap = Keymap::new([base, base, upper, base]).unwrap();
        let found: std::vec::Vec<_> = keymap.inconsistent_specials().collect();

        assert_eq!(found, [(Position::new(0, 0), FUNC_LAYER, ___)]);
    }

    #[test]
    fn try_from_fn_stops_at_first_error() {
        let mut calls = 0;
        let err = Keymap::<2, 2>::try_from_fn(|layer, row, col| {
            calls += 1;
            if (layer, row, col) == (1, 0, 1) {
                Err(KeymapError::UnknownKeycode { layer, row, col })
            } else {
                Ok(A)
            }
        })
        .unwrap_err();

        assert_eq!(err, KeymapError::UnknownKeycode { layer: 1, row: 0, col: 1 });
        assert_eq!(calls, 6);
    }
}
