//! Command-line argument definitions for the Palimpsest CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the diagram and overlay documents, the
//! mount selector and pass mode, configuration file, and logging verbosity.

use clap::{Parser, ValueEnum};

use palimpsest::RenderMode;

/// Command-line arguments for the Palimpsest overlay compositor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the rendered diagram SVG
    #[arg(help = "Path to the rendered diagram SVG")]
    pub diagram: String,

    /// Path to the document holding the overlay cells
    #[arg(long)]
    pub overlay: String,

    /// Selector locating the content mount inside each diagram cell
    #[arg(short, long)]
    pub mount: String,

    /// Cleanup policy for the pass
    #[arg(long, value_enum, default_value_t = Mode::Fresh)]
    pub mode: Mode,

    /// Fail when any overlay cell cannot be placed
    #[arg(long)]
    pub strict: bool,

    /// Path to the output SVG file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Pass mode accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Purge all mounted content before placing
    Fresh,
    /// Only replace content in the mounts being placed into
    Incremental,
}

impl From<Mode> for RenderMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Fresh => RenderMode::Fresh,
            Mode::Incremental => RenderMode::Incremental,
        }
    }
}
