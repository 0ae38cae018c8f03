//! Replay a timed trace of switch changes through the scanner.
//!
//! A trace is TOML with one `[[step]]` table per switch change:
//!
//! ```toml
//! tail_ms = 50        # keep scanning this long after the last step
//!
//! [[step]]
//! at = 0              # milliseconds from the start
//! row = 0
//! col = 1
//! closed = true
//! ```
//!
//! The scanner ticks once per simulated millisecond.

use anyhow::{bail, Context, Result};
use embedded_hal::delay::DelayNs;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

use stickypad_core::{
    HidEvent, HidSink, Keycode, Keymap, Millis, PinIo, RawMatrix, ScanConfig, Scanner,
};

const DEFAULT_TAIL_MS: Millis = 50;
/// Longest replay accepted, one simulated hour.
const MAX_TRACE_MS: Millis = 60 * 60 * 1000;

fn default_tail() -> Millis {
    DEFAULT_TAIL_MS
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Trace {
    #[serde(default = "default_tail")]
    pub tail_ms: Millis,
    #[serde(rename = "step", default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    pub at: Millis,
    pub row: usize,
    pub col: usize,
    pub closed: bool,
}

impl Trace {
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing trace {}", path.display()))
    }
}

/// Something observable during a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Event(HidEvent),
    Layer(usize),
    Indicator(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub at: Millis,
    pub output: Output,
}

fn usage_name(usage: u8) -> String {
    Keycode::from_usage(usage).map_or_else(|| format!("{:#04x}", usage), |code| code.to_string())
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6} ms  ", self.at)?;
        match self.output {
            Output::Event(HidEvent::Press(usage)) => write!(f, "press       {}", usage_name(usage)),
            Output::Event(HidEvent::Release(usage)) => {
                write!(f, "release     {}", usage_name(usage))
            }
            Output::Event(HidEvent::ReleaseAll) => write!(f, "release all"),
            Output::Layer(layer) => write!(f, "layer       {}", layer),
            Output::Indicator(on) => write!(f, "indicator   {}", if on { "on" } else { "off" }),
        }
    }
}

/// Matrix pins whose switch state is set by the trace.
struct TracePins<const ROWS: usize, const COLS: usize> {
    closed: RawMatrix<ROWS, COLS>,
    active: Option<usize>,
}

impl<const ROWS: usize, const COLS: usize> PinIo for TracePins<ROWS, COLS> {
    fn set_column(&mut self, index: usize, active: bool) {
        self.active = active.then_some(index);
    }

    fn read_row(&mut self, index: usize) -> bool {
        self.active.is_some_and(|col| self.closed[index][col])
    }
}

/// Simulated time does not advance while the pins settle.
struct NoSettle;

impl DelayNs for NoSettle {
    fn delay_ns(&mut self, _ns: u32) {}
}

#[derive(Default)]
struct EventLog(Vec<HidEvent>);

impl HidSink for EventLog {
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

/// Run `trace` through a fresh scanner and collect everything it produced.
pub fn run<const ROWS: usize, const COLS: usize>(
    keymap: &Keymap<ROWS, COLS>,
    config: ScanConfig,
    trace: &Trace,
) -> Result<Vec<Line>> {
    for step in &trace.steps {
        if step.row >= ROWS || step.col >= COLS {
            bail!(
                "step at {} ms: position ({}, {}) is outside the {}x{} matrix",
                step.at,
                step.row,
                step.col,
                ROWS,
                COLS
            );
        }
    }

    let mut steps = trace.steps.clone();
    steps.sort_by_key(|step| step.at);
    let last = steps.last().map_or(0, |step| step.at);
    let end = match last.checked_add(trace.tail_ms) {
        Some(end) if end <= MAX_TRACE_MS => end,
        _ => bail!(
            "trace is too long: last step at {} ms plus tail_ms {} exceeds {} ms",
            last,
            trace.tail_ms,
            MAX_TRACE_MS
        ),
    };

    let mut scanner = Scanner::new(keymap, config);
    let mut pins = TracePins::<ROWS, COLS> {
        closed: [[false; COLS]; ROWS],
        active: None,
    };
    let mut sink = EventLog::default();
    let mut lines = Vec::new();
    let mut layer = 0;
    let mut indicator = false;
    let mut pending = steps.iter().peekable();

    for now in 0..=end {
        while let Some(step) = pending.next_if(|step| step.at <= now) {
            pins.closed[step.row][step.col] = step.closed;
        }

        let tick = scanner.tick(&mut pins, &mut NoSettle, &mut sink, now);

        if tick.layer != layer {
            layer = tick.layer;
            lines.push(Line { at: now, output: Output::Layer(layer) });
        }
        lines.extend(sink.0.drain(..).map(|event| Line { at: now, output: Output::Event(event) }));
        if tick.any_pressed != indicator {
            indicator = tick.any_pressed;
            lines.push(Line { at: now, output: Output::Indicator(indicator) });
        }
    }

    tracing::debug!(ticks = end + 1, lines = lines.len(), "trace replayed");
    Ok(lines)
}
