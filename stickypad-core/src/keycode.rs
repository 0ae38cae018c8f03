//! Keycodes stored in the keymap.
//!
//! A [`Keycode`] is what a matrix position means on one layer: nothing, a
//! plain HID key, a modifier, or one of the three special keys driving the
//! layer resolver and the sticky state machine.

use core::fmt;
use core::str::FromStr;

use crate::sticky::Latch;

macro_rules! keys {
    ($($variant:ident = $usage:literal => $label:literal,)*) => {
        /// USB HID keyboard usages (Keyboard/Keypad page 0x07), modifiers excluded.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Key {
            $($variant = $usage,)*
        }

        impl Key {
            /// Every key, in usage order.
            pub const ALL: &'static [Key] = &[$(Key::$variant,)*];

            /// Name used in keymap files.
            pub fn name(self) -> &'static str {
                match self {
                    $(Key::$variant => stringify!($variant),)*
                }
            }

            /// Short label for layout printouts.
            pub fn display_name(self) -> &'static str {
                match self {
                    $(Key::$variant => $label,)*
                }
            }
        }
    };
}

keys! {
    A = 0x04 => "A",
    B = 0x05 => "B",
    C = 0x06 => "C",
    D = 0x07 => "D",
    E = 0x08 => "E",
    F = 0x09 => "F",
    G = 0x0A => "G",
    H = 0x0B => "H",
    I = 0x0C => "I",
    J = 0x0D => "J",
    K = 0x0E => "K",
    L = 0x0F => "L",
    M = 0x10 => "M",
    N = 0x11 => "N",
    O = 0x12 => "O",
    P = 0x13 => "P",
    Q = 0x14 => "Q",
    R = 0x15 => "R",
    S = 0x16 => "S",
    T = 0x17 => "T",
    U = 0x18 => "U",
    V = 0x19 => "V",
    W = 0x1A => "W",
    X = 0x1B => "X",
    Y = 0x1C => "Y",
    Z = 0x1D => "Z",
    N1 = 0x1E => "1",
    N2 = 0x1F => "2",
    N3 = 0x20 => "3",
    N4 = 0x21 => "4",
    N5 = 0x22 => "5",
    N6 = 0x23 => "6",
    N7 = 0x24 => "7",
    N8 = 0x25 => "8",
    N9 = 0x26 => "9",
    N0 = 0x27 => "0",
    Enter = 0x28 => "Ent",
    Escape = 0x29 => "Esc",
    Backspace = 0x2A => "Bksp",
    Tab = 0x2B => "Tab",
    Space = 0x2C => "Spc",
    Minus = 0x2D => "-",
    Equal = 0x2E => "=",
    LBracket = 0x2F => "[",
    RBracket = 0x30 => "]",
    Backslash = 0x31 => "\\",
    Semicolon = 0x33 => ";",
    Quote = 0x34 => "'",
    Grave = 0x35 => "`",
    Comma = 0x36 => ",",
    Dot = 0x37 => ".",
    Slash = 0x38 => "/",
    CapsLock = 0x39 => "Caps",
    F1 = 0x3A => "F1",
    F2 = 0x3B => "F2",
    F3 = 0x3C => "F3",
    F4 = 0x3D => "F4",
    F5 = 0x3E => "F5",
    F6 = 0x3F => "F6",
    F7 = 0x40 => "F7",
    F8 = 0x41 => "F8",
    F9 = 0x42 => "F9",
    F10 = 0x43 => "F10",
    F11 = 0x44 => "F11",
    F12 = 0x45 => "F12",
    PrintScreen = 0x46 => "PScr",
    ScrollLock = 0x47 => "ScrL",
    Pause = 0x48 => "Paus",
    Insert = 0x49 => "Ins",
    Home = 0x4A => "Home",
    PageUp = 0x4B => "PgUp",
    Delete = 0x4C => "Del",
    End = 0x4D => "End",
    PageDown = 0x4E => "PgDn",
    Right = 0x4F => "\u{2192}",
    Left = 0x50 => "\u{2190}",
    Down = 0x51 => "\u{2193}",
    Up = 0x52 => "\u{2191}",
    NonUsBackslash = 0x64 => "<>",
}

impl Key {
    /// HID usage ID sent to the host.
    pub fn usage(self) -> u8 {
        self as u8
    }
}

/// Modifier keys. Their usages (0xE0..=0xE7) map onto the report's modifier byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Modifier {
    LCtrl = 0xE0,
    LShift = 0xE1,
    LAlt = 0xE2,
    LGui = 0xE3,
    RCtrl = 0xE4,
    RShift = 0xE5,
    RAlt = 0xE6,
    RGui = 0xE7,
}

impl Modifier {
    pub const ALL: [Modifier; 8] = [
        Modifier::LCtrl,
        Modifier::LShift,
        Modifier::LAlt,
        Modifier::LGui,
        Modifier::RCtrl,
        Modifier::RShift,
        Modifier::RAlt,
        Modifier::RGui,
    ];

    pub fn usage(self) -> u8 {
        self as u8
    }

    /// Get the modifier bit mask (bit 0 = LCtrl, bit 7 = RGui).
    pub fn bit(self) -> u8 {
        1 << (self as u8 - 0xE0)
    }

    pub fn from_usage(usage: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.usage() == usage)
    }

    pub fn is_shift(self) -> bool {
        matches!(self, Modifier::LShift | Modifier::RShift)
    }

    /// Sticky latch controlled by this modifier. GUI keys have none.
    pub fn latch(self) -> Option<Latch> {
        match self {
            Modifier::LShift | Modifier::RShift => Some(Latch::Shift),
            Modifier::LCtrl | Modifier::RCtrl => Some(Latch::Ctrl),
            Modifier::LAlt | Modifier::RAlt => Some(Latch::Alt),
            Modifier::LGui | Modifier::RGui => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Modifier::LCtrl => "LCtrl",
            Modifier::LShift => "LShift",
            Modifier::LAlt => "LAlt",
            Modifier::LGui => "LGui",
            Modifier::RCtrl => "RCtrl",
            Modifier::RShift => "RShift",
            Modifier::RAlt => "RAlt",
            Modifier::RGui => "RGui",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Modifier::LCtrl => "Ctrl",
            Modifier::LShift => "Shft",
            Modifier::LAlt => "Alt",
            Modifier::LGui => "Gui",
            Modifier::RCtrl => "RCtl",
            Modifier::RShift => "RSft",
            Modifier::RAlt => "RAlt",
            Modifier::RGui => "RGui",
        }
    }
}

/// One keymap entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Keycode {
    /// Unused position. Never produces an event.
    Blank,
    /// Character or other standard key.
    Key(Key),
    Modifier(Modifier),
    /// Layer 1 toggle.
    Layer,
    /// Func toggle; selects layer 2 together with [`Keycode::Layer`].
    Func,
    /// Flips sticky mode on and off.
    Sticky,
}

impl Keycode {
    /// Layer, func and sticky keys plus shift, the keys the scanner locates
    /// through the keymap's reverse lookup.
    pub fn is_special(self) -> bool {
        match self {
            Keycode::Layer | Keycode::Func | Keycode::Sticky => true,
            Keycode::Modifier(m) => m.is_shift(),
            Keycode::Blank | Keycode::Key(_) => false,
        }
    }

    /// Keycode sending `usage` to the host, if any.
    pub fn from_usage(usage: u8) -> Option<Self> {
        if let Some(m) = Modifier::from_usage(usage) {
            return Some(Keycode::Modifier(m));
        }
        Key::ALL.iter().find(|k| k.usage() == usage).map(|k| Keycode::Key(*k))
    }

    pub fn name(self) -> &'static str {
        match self {
            Keycode::Blank => "___",
            Keycode::Key(k) => k.name(),
            Keycode::Modifier(m) => m.name(),
            Keycode::Layer => "Layer",
            Keycode::Func => "Func",
            Keycode::Sticky => "Sticky",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Keycode::Blank => "",
            Keycode::Key(k) => k.display_name(),
            Keycode::Modifier(m) => m.display_name(),
            Keycode::Layer => "Ly1",
            Keycode::Func => "Fn",
            Keycode::Sticky => "Stky",
        }
    }
}

impl fmt::Display for Keycode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a keycode name is not recognized.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown keycode name")]
pub struct UnknownKeycode;

impl FromStr for Keycode {
    type Err = UnknownKeycode;

    /// Parse a keycode by its [`Keycode::name`], ignoring ASCII case.
    /// `___` and `Blank` both mean an empty position.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "___" => return Ok(Keycode::Blank),
            _ if s.eq_ignore_ascii_case("blank") => return Ok(Keycode::Blank),
            _ if s.eq_ignore_ascii_case("layer") => return Ok(Keycode::Layer),
            _ if s.eq_ignore_ascii_case("func") => return Ok(Keycode::Func),
            _ if s.eq_ignore_ascii_case("sticky") => return Ok(Keycode::Sticky),
            _ => {}
        }

        if let Some(m) = Modifier::ALL.iter().find(|m| m.name().eq_ignore_ascii_case(s)) {
            return Ok(Keycode::Modifier(*m));
        }

        Key::ALL
            .iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .map(|k| Keycode::Key(*k))
            .ok_or(UnknownKeycode)
    }
}
