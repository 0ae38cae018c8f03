//! Keymap files.
//!
//! A keymap file is TOML: optional timing overrides plus one list of rows
//! per layer, each row a whitespace-separated string of keycode names.
//!
//! ```toml
//! debounce_ms = 5
//! layers = [
//!     ["Escape Q W E R T", "Tab A S D F G", "LShift Z X C V B", "Sticky LCtrl LAlt Layer Space Func"],
//!     # ... three more layers
//! ]
//! ```

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use stickypad_core::layout::{self, COLS, ROWS};
use stickypad_core::{Keymap, KeymapError, Millis, ScanConfig, NUM_LAYERS};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeymapFile {
    debounce_ms: Option<Millis>,
    settle_us: Option<u32>,
    layers: Vec<Vec<String>>,
}

/// A keymap together with the scan timing it asks for.
#[derive(Debug)]
pub struct Loaded {
    pub keymap: Keymap<ROWS, COLS>,
    pub config: ScanConfig,
}

/// Load a keymap file, or the built-in layout when `path` is `None`.
pub fn load_or_default(path: Option<&Path>) -> Result<Loaded> {
    match path {
        Some(path) => load(path),
        None => Ok(Loaded {
            keymap: layout::keymap().context("building the built-in keymap")?,
            config: ScanConfig::default(),
        }),
    }
}

pub fn load(path: &Path) -> Result<Loaded> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse(&contents).with_context(|| format!("loading keymap {}", path.display()))
}

pub fn parse(contents: &str) -> Result<Loaded> {
    let file: KeymapFile = toml::from_str(contents).context("parsing TOML")?;

    if file.layers.len() != NUM_LAYERS {
        bail!("expected {} layers, found {}", NUM_LAYERS, file.layers.len());
    }

    let mut names: Vec<Vec<Vec<&str>>> = Vec::with_capacity(NUM_LAYERS);
    for (layer, rows) in file.layers.iter().enumerate() {
        if rows.len() != ROWS {
            bail!("layer {}: expected {} rows, found {}", layer, ROWS, rows.len());
        }
        let mut layer_names = Vec::with_capacity(ROWS);
        for (row, line) in rows.iter().enumerate() {
            let cells: Vec<&str> = line.split_whitespace().collect();
            if cells.len() != COLS {
                bail!(
                    "layer {}, row {}: expected {} keys, found {}",
                    layer,
                    row,
                    COLS,
                    cells.len()
                );
            }
            layer_names.push(cells);
        }
        names.push(layer_names);
    }

    let keymap = Keymap::try_from_fn(|layer, row, col| {
        names[layer][row][col]
            .parse()
            .map_err(|_| KeymapError::UnknownKeycode { layer, row, col })
    })
    .map_err(|err| match err {
        KeymapError::UnknownKeycode { layer, row, col } => {
            anyhow!("{}: `{}`", err, names[layer][row][col])
        }
        other => other.into(),
    })?;

    let defaults = ScanConfig::default();
    let config = ScanConfig {
        debounce_ms: file.debounce_ms.unwrap_or(defaults.debounce_ms),
        settle_us: file.settle_us.unwrap_or(defaults.settle_us),
    };
    tracing::debug!(?config, "keymap loaded");

    Ok(Loaded { keymap, config })
}
