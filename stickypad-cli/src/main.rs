mod keymap_file;
mod layout;
mod simulate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stickypad")]
#[command(about = "Keymap tools for the stickypad keyboard")]
struct Cli {
    /// Log scanner and sticky state changes (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every layer of a keymap and its special key positions
    Layout {
        /// Keymap file (TOML); defaults to the built-in layout
        #[arg(long)]
        keymap: Option<PathBuf>,
    },
    /// Validate a keymap file
    Check {
        /// Keymap file (TOML)
        keymap: PathBuf,
    },
    /// Replay a timed trace of switch changes and print the key events
    Simulate {
        /// Trace file (TOML)
        trace: PathBuf,
        /// Keymap file (TOML); defaults to the built-in layout
        #[arg(long)]
        keymap: Option<PathBuf>,
        /// Override the debounce interval in milliseconds
        #[arg(long)]
        debounce_ms: Option<u32>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Layout { keymap } => {
            let loaded = keymap_file::load_or_default(keymap.as_deref())?;
            print!("{}", layout::render(&loaded.keymap));
        }
        Command::Check { keymap } => {
            let loaded = keymap_file::load(&keymap)?;
            let specials = loaded.keymap.specials();

            let mut warnings = 0;
            if specials.layer.is_empty() {
                tracing::warn!("no layer key on the base layer: layers 1-3 are unreachable");
                warnings += 1;
            }
            if specials.sticky.is_empty() {
                tracing::warn!("no sticky key on the base layer: sticky mode is unreachable");
                warnings += 1;
            }
            for (pos, layer, code) in loaded.keymap.inconsistent_specials() {
                tracing::warn!(
                    row = pos.row,
                    col = pos.col,
                    layer,
                    %code,
                    "special key changes meaning on a higher layer"
                );
                warnings += 1;
            }

            println!(
                "{}: ok ({} warning{}), debounce {} ms, settle {} us",
                keymap.display(),
                warnings,
                if warnings == 1 { "" } else { "s" },
                loaded.config.debounce_ms,
                loaded.config.settle_us
            );
        }
        Command::Simulate {
            trace,
            keymap,
            debounce_ms,
        } => {
            let mut loaded = keymap_file::load_or_default(keymap.as_deref())?;
            if let Some(ms) = debounce_ms {
                loaded.config.debounce_ms = ms;
            }
            let steps = simulate::Trace::load(&trace)?;

            let lines = simulate::run(&loaded.keymap, loaded.config, &steps)
                .with_context(|| format!("replaying {}", trace.display()))?;
            for line in &lines {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
