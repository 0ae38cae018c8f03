//! Sticky mode: layer and modifier keys toggle latches instead of acting
//! while held.
//!
//! In normal mode the layer and func keys only matter through the layer
//! resolver and modifiers go straight to the host. Pressing the sticky key
//! switches to sticky mode, where a press of a layer, func, shift, ctrl or
//! alt key flips its latch and sends nothing. Latched shift, ctrl and alt
//! are pressed again in front of every character key and stay pressed on the
//! host until sticky mode is switched off, which releases everything.

use crate::hid::HidSink;
use crate::keycode::Modifier;

/// Latchable keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Latch {
    Layer1,
    Func,
    Shift,
    Ctrl,
    Alt,
}

/// Modifier latches in the order they are injected.
const INJECTED: [(Latch, Modifier); 3] = [
    (Latch::Shift, Modifier::LShift),
    (Latch::Ctrl, Modifier::LCtrl),
    (Latch::Alt, Modifier::LAlt),
];

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StickyState {
    mode_enabled: bool,
    layer1: bool,
    func: bool,
    shift: bool,
    ctrl: bool,
    alt: bool,
}

impl StickyState {
    pub const fn new() -> Self {
        Self {
            mode_enabled: false,
            layer1: false,
            func: false,
            shift: false,
            ctrl: false,
            alt: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.mode_enabled
    }

    pub fn is_latched(&self, latch: Latch) -> bool {
        match latch {
            Latch::Layer1 => self.layer1,
            Latch::Func => self.func,
            Latch::Shift => self.shift,
            Latch::Ctrl => self.ctrl,
            Latch::Alt => self.alt,
        }
    }

    fn latch_mut(&mut self, latch: Latch) -> &mut bool {
        match latch {
            Latch::Layer1 => &mut self.layer1,
            Latch::Func => &mut self.func,
            Latch::Shift => &mut self.shift,
            Latch::Ctrl => &mut self.ctrl,
            Latch::Alt => &mut self.alt,
        }
    }

    /// Sticky key press. Leaving sticky mode clears every latch and releases
    /// everything on the host.
    pub fn toggle_mode(&mut self, sink: &mut impl HidSink) {
        if self.mode_enabled {
            *self = Self::new();
            sink.release_all();
        } else {
            self.mode_enabled = true;
        }
        log::debug!("sticky mode {}", if self.mode_enabled { "on" } else { "off" });
    }

    /// Flip a latch. Ignored outside sticky mode.
    pub fn toggle_latch(&mut self, latch: Latch) {
        if !self.mode_enabled {
            return;
        }
        let flag = self.latch_mut(latch);
        *flag = !*flag;
        log::debug!("sticky latch {:?} {}", latch, if *flag { "set" } else { "cleared" });
    }

    /// Layer or func key edge.
    pub fn handle_toggle_key(&mut self, latch: Latch, pressed: bool) {
        if pressed {
            self.toggle_latch(latch);
        }
    }

    /// Modifier key edge. Returns `true` when the edge was consumed as a
    /// latch toggle and must not reach the host.
    pub fn handle_modifier(&mut self, modifier: Modifier, pressed: bool) -> bool {
        match modifier.latch() {
            Some(latch) if self.mode_enabled => {
                if pressed {
                    self.toggle_latch(latch);
                }
                true
            }
            _ => false,
        }
    }

    /// Press every latched modifier, shift first, then ctrl and alt.
    pub fn inject_modifiers(&self, sink: &mut impl HidSink) {
        for (latch, modifier) in INJECTED {
            if self.is_latched(latch) {
                sink.press(modifier.usage());
            }
        }
    }
}
