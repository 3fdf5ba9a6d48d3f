//! Configuration display command.

use anyhow::Context;
use clap::Args;
use opusrec_recorder::RecorderConfig;

use super::load_config;
use crate::Cli;

/// Print the effective recorder configuration as YAML.
///
/// Without `--config` the built-in defaults are shown, which makes a
/// convenient starting point for a config file.
#[derive(Args)]
pub struct ConfigCommand {
    /// Print the built-in defaults even when --config is given
    #[arg(long)]
    defaults: bool,
}

impl ConfigCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let config = if self.defaults {
            RecorderConfig::default()
        } else {
            load_config(cli)?
        };
        print!("{}", config.to_yaml().context("failed to serialize config")?);
        Ok(())
    }
}
