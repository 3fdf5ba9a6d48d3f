//! Utility functions for CLI commands.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::Context;
use opusrec_recorder::RecorderConfig;

use crate::Cli;

/// Loads the recorder config named by `--config`, or the defaults.
pub fn load_config(cli: &Cli) -> anyhow::Result<RecorderConfig> {
    match cli.config.as_deref() {
        Some(path) => RecorderConfig::load(path).with_context(|| format!("failed to load config {}", path)),
        None => Ok(RecorderConfig::default()),
    }
}

/// Opens an input file, `-` meaning stdin.
pub fn open_input(path: &str) -> anyhow::Result<Box<dyn Read>> {
    if path == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("failed to open {}", path))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Size of a finished output file.
pub fn file_size(path: &Path) -> anyhow::Result<u64> {
    Ok(std::fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .len())
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}
