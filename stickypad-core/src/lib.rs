//! Matrix scanning, layers and sticky modifiers for the stickypad keyboard.
//!
//! This crate is `no_std`-compatible so it can be used by both the AVR
//! firmware and the native CLI tool.
//!
//! One scan tick runs the whole pipeline:
//!
//! 1. [`matrix::scan`] strobes every column through a [`PinIo`] and samples
//!    the rows.
//! 2. [`Matrix::debounce`] runs each cell's [`Cell`] filter.
//! 3. [`resolve_layer`] picks the layer from held keys and sticky latches.
//! 4. [`dispatch`] turns debounced edges into [`HidSink`] calls, routing
//!    layer, modifier and sticky keys through the [`StickyState`].
//!
//! [`Scanner`] owns the mutable state and runs the steps in order.

#![cfg_attr(not(test), no_std)]

pub mod debounce;
pub mod dispatch;
pub mod hid;
pub mod keycode;
pub mod keymap;
pub mod layer;
pub mod layout;
pub mod matrix;
pub mod scanner;
pub mod sticky;

pub use debounce::{Cell, Millis, DEBOUNCE_MS};
pub use dispatch::dispatch;
pub use hid::{HidEvent, HidSink, KeyboardReport, ReportSink};
pub use keycode::{Key, Keycode, Modifier, UnknownKeycode};
pub use keymap::{Keymap, KeymapError, Layers, Position, SpecialKeys, NUM_LAYERS};
pub use layer::resolve_layer;
pub use matrix::{Matrix, PinIo, RawMatrix, SETTLE_US};
pub use scanner::{ScanConfig, Scanner, Tick};
pub use sticky::{Latch, StickyState};
