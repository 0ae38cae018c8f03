use embedded_hal::delay::DelayNs;
use pretty_assertions::assert_eq;
use rstest::rstest;

use stickypad_core::keymap::{BASE_LAYER, FUNC_LAYER, LAYER1, SHIFT_LAYER};
use stickypad_core::layout::{self, COLS, ROWS};
use stickypad_core::{
    HidEvent, HidSink, Key, Keycode, Keymap, Latch, Millis, Modifier, PinIo, Position, RawMatrix,
    ReportSink, ScanConfig, Scanner, StickyState, Tick,
};

const Q: Position = Position::new(0, 1);
const ESC: Position = Position::new(0, 0);
const SHIFT: Position = Position::new(2, 0);
const STICKY: Position = Position::new(3, 0);
const CTRL: Position = Position::new(3, 1);
const LAYER: Position = Position::new(3, 3);
const FUNC: Position = Position::new(3, 5);

const DEBOUNCE: Millis = 5;

#[derive(Default)]
struct Recorder(Vec<HidEvent>);

impl HidSink for Recorder {
    fn press(&mut self, usage: u8) {
        self.0.push(HidEvent::Press(usage));
    }
    fn release(&mut self, usage: u8) {
        self.0.push(HidEvent::Release(usage));
    }
    fn release_all(&mut self) {
        self.0.push(HidEvent::ReleaseAll);
    }
}

fn press(usage: u8) -> HidEvent {
    HidEvent::Press(usage)
}

fn release(usage: u8) -> HidEvent {
    HidEvent::Release(usage)
}

/// Drives a scanner with 1ms ticks over a raw matrix the test edits.
struct Harness<'k> {
    scanner: Scanner<'k, ROWS, COLS>,
    raw: RawMatrix<ROWS, COLS>,
    sink: Recorder,
    now: Millis,
    last: Option<Tick>,
}

impl<'k> Harness<'k> {
    fn new(keymap: &'k Keymap<ROWS, COLS>) -> Self {
        let config = ScanConfig { debounce_ms: DEBOUNCE, ..ScanConfig::default() };
        Self {
            scanner: Scanner::new(keymap, config),
            raw: [[false; COLS]; ROWS],
            sink: Recorder::default(),
            now: 1_000,
            last: None,
        }
    }

    fn set(&mut self, pos: Position, closed: bool) {
        self.raw[pos.row][pos.col] = closed;
    }

    fn run(&mut self, ms: Millis) {
        for _ in 0..ms {
            self.last = Some(self.scanner.process(&self.raw, &mut self.sink, self.now));
            self.now += 1;
        }
    }

    /// Close a switch long enough to debounce, then open it again.
    fn tap(&mut self, pos: Position) {
        self.set(pos, true);
        self.run(10);
        self.set(pos, false);
        self.run(10);
    }

    fn take(&mut self) -> Vec<HidEvent> {
        std::mem::take(&mut self.sink.0)
    }

    fn layer(&self) -> usize {
        self.last.map_or(BASE_LAYER, |tick| tick.layer)
    }
}

fn keymap() -> Keymap<ROWS, COLS> {
    layout::keymap().unwrap()
}

#[test]
fn held_key_presses_exactly_once() {
    let keymap = keymap();
    let mut h = Harness::new(&keymap);

    h.set(Q, true);
    h.run(20);
    assert_eq!(h.take(), [press(Key::Q.usage())]);
    assert!(h.last.unwrap().any_pressed);

    h.run(200);
    assert!(h.take().is_empty());

    h.set(Q, false);
    h.run(20);
    assert_eq!(h.take(), [release(Key::Q.usage())]);
    assert!(!h.last.unwrap().any_pressed);
}

#[test]
fn press_is_reported_when_the_interval_has_elapsed() {
    let keymap = keymap();
    let mut h = Harness::new(&keymap);

    h.set(Q, true);
    h.run(DEBOUNCE);
    assert!(h.take().is_empty());
    h.run(1);
    assert_eq!(h.take(), [press(Key::Q.usage())]);
}

#[test]
fn bounce_shorter_than_the_interval_is_noise() {
    let keymap = keymap();
    let mut h = Harness::new(&keymap);

    for i in 0..40 {
        h.set(Q, i % 3 == 0);
        h.run(1);
    }
    h.set(Q, false);
    h.run(20);

    assert!(h.take().is_empty());
    assert!(!h.last.unwrap().any_pressed);
}

#[test]
fn bouncy_press_yields_one_press_and_one_release() {
    let keymap = keymap();
    let mut h = Harness::new(&keymap);

    for closed in [true, false, true, true, false, true] {
        h.set(Q, closed);
        h.run(1);
    }
    h.run(30);
    for closed in [false, true, false, false, true, false] {
        h.set(Q, closed);
        h.run(1);
    }
    h.run(30);

    assert_eq!(h.take(), [press(Key::Q.usage()), release(Key::Q.usage())]);
}

#[test]
fn layer_and_shift_select_layer_three_where_blank_is_silent() {
    let keymap = keymap();
    let mut h = Harness::new(&keymap);

    h.set(LAYER, true);
    h.set(SHIFT, true);
    h.run(10);
    assert_eq!(h.layer(), SHIFT_LAYER);
    // Shift is an ordinary modifier outside sticky mode.
    assert_eq!(h.take(), [press(Modifier::LShift.usage())]);

    assert_eq!(keymap.code(SHIFT_LAYER, ESC.row, ESC.col), Keycode::Blank);
    h.tap(ESC);
    assert!(h.take().is_empty());
}

#[rstest]
#[case(&[LAYER], LAYER1)]
#[case(&[LAYER, FUNC], FUNC_LAYER)]
#[case(&[LAYER, SHIFT, FUNC], FUNC_LAYER)]
#[case(&[FUNC, SHIFT], BASE_LAYER)]
fn held_keys_pick_the_layer(#[case] held: &[Position], #[case] expected: usize) {
    let keymap = keymap();
    let mut h = Harness::new(&keymap);

    for pos in held {
        h.set(*pos, true);
    }
    h.run(10);

    assert_eq!(h.layer(), expected);
}

#[test]
fn layer_key_routes_characters_to_layer_one() {
    let keymap = keymap();
    let mut h = Harness::new(&keymap);

    h.set(LAYER, true);
    h.run(10);
    h.tap(Q);
    h.set(LAYER, false);
    h.run(10);
    h.tap(Q);

    assert_eq!(
        h.take(),
        [
            press(Key::P.usage()),
            release(Key::P.usage()),
            press(Key::Q.usage()),
            release(Key::Q.usage()),
        ]
    );
}

#[test]
fn sticky_layer_key_latches_silently() {
    let keymap = keymap();
    let mut h = Harness::new(&keymap);

    h.tap(STICKY);
    assert!(h.scanner.sticky().is_enabled());

    h.tap(LAYER);
    assert!(h.scanner.sticky().is_latched(Latch::Layer1));
    h.run(1);
    assert_eq!(h.layer(), LAYER1);

    h.tap(LAYER);
    assert!(!h.scanner.sticky().is_latched(Latch::Layer1));
    h.run(1);
    assert_eq!(h.layer(), BASE_LAYER);

    assert!(h.take().is_empty());
}

#[test]
fn latched_shift_is_pressed_before_each_character() {
    let keymap = keymap();
    let mut h = Harness::new(&keymap);

    h.tap(STICKY);
    h.tap(SHIFT);
    assert!(h.scanner.sticky().is_latched(Latch::Shift));
    assert!(h.take().is_empty());

    h.set(Q, true);
    h.run(10);
    assert_eq!(h.take(), [press(Modifier::LShift.usage()), press(Key::Q.usage())]);

    h.set(Q, false);
    h.run(10);
    assert_eq!(h.take(), [release(Key::Q.usage())]);
}

#[test]
fn leaving_sticky_mode_releases_everything_once() {
    let keymap = keymap();
    let mut h = Harness::new(&keymap);

    h.tap(STICKY);
    h.tap(SHIFT);
    h.tap(CTRL);
    h.tap(Q);
    h.take();

    h.tap(STICKY);
    assert_eq!(h.take(), [HidEvent::ReleaseAll]);

    let sticky = h.scanner.sticky();
    assert!(!sticky.is_enabled());
    for latch in [Latch::Layer1, Latch::Func, Latch::Shift, Latch::Ctrl, Latch::Alt] {
        assert!(!sticky.is_latched(latch));
    }
}

#[test]
fn injected_modifiers_stay_pressed_on_the_host() {
    let keymap = keymap();
    let mut h = Harness::new(&keymap);
    let mut report = ReportSink::new();

    h.tap(STICKY);
    h.tap(SHIFT);
    h.tap(Q);
    for event in h.take() {
        event.apply(&mut report);
    }
    assert_eq!(report.report().modifiers, Modifier::LShift.bit());
    assert_eq!(report.report().keys, [0; 6]);

    h.tap(STICKY);
    for event in h.take() {
        event.apply(&mut report);
    }
    assert_eq!(report.report().modifiers, 0);
}

#[test]
fn even_number_of_sticky_toggles_restores_normal_mode() {
    let keymap = keymap();
    let mut h = Harness::new(&keymap);

    for _ in 0..3 {
        h.tap(STICKY);
        h.tap(LAYER);
        h.tap(FUNC);
        h.tap(STICKY);
    }

    assert_eq!(*h.scanner.sticky(), StickyState::new());
}

/// Pins over a fixed switch state that only answer for the strobed column.
struct Switches {
    closed: RawMatrix<ROWS, COLS>,
    active: Option<usize>,
}

impl PinIo for Switches {
    fn set_column(&mut self, index: usize, active: bool) {
        self.active = active.then_some(index);
    }

    fn read_row(&mut self, index: usize) -> bool {
        self.active.is_some_and(|col| self.closed[index][col])
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

#[test]
fn tick_scans_pins_and_feeds_a_report() {
    let keymap = keymap();
    let mut scanner = Scanner::new(&keymap, ScanConfig::default());
    let mut pins = Switches { closed: [[false; COLS]; ROWS], active: None };
    let mut sink = ReportSink::new();

    pins.closed[LAYER.row][LAYER.col] = true;
    pins.closed[Q.row][Q.col] = true;
    let mut tick = None;
    for now in 0..10 {
        tick = Some(scanner.tick(&mut pins, &mut NoDelay, &mut sink, now));
    }

    // Layer and Q debounce on the same tick; Q resolves through layer 1.
    assert_eq!(tick, Some(Tick { layer: LAYER1, any_pressed: true }));
    assert_eq!(sink.report().keys, [Key::P.usage(), 0, 0, 0, 0, 0]);
    assert_eq!(pins.active, None);
}
