//! Raw Opus packet normalization command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use opusrec_audio::codec::opus::Decoder;
use opusrec_recorder::{CHANNELS, SAMPLE_RATE, Session, normalize, transcode::RAW_PACKET_SIZE};

use super::{file_size, load_config, open_input, print_success};
use crate::Cli;

/// Re-record a headerless raw Opus packet file as Ogg Opus.
///
/// Every packet is decoded at 16 kHz mono and the audio is encoded again
/// through the recorder.
#[derive(Args)]
pub struct NormalizeCommand {
    /// Raw packet input, `-` for stdin
    pub(crate) input: String,

    /// Output Ogg Opus file
    pub(crate) output: PathBuf,

    /// Size of each raw packet in bytes
    #[arg(long, default_value_t = RAW_PACKET_SIZE)]
    pub(crate) packet_size: usize,
}

impl NormalizeCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        if self.packet_size == 0 {
            anyhow::bail!("packet size must be positive");
        }
        let config = load_config(cli)?;
        let input = open_input(&self.input)?;
        let mut decoder =
            Decoder::new(SAMPLE_RATE as i32, CHANNELS as i32).context("failed to create opus decoder")?;

        let mut session = Session::opus(config);
        session
            .start(&self.output)
            .with_context(|| format!("failed to start recording {}", self.output.display()))?;

        let packets = normalize(input, &mut decoder, &mut session, self.packet_size)
            .with_context(|| format!("failed to normalize {}", self.input))?;
        session.end().context("failed to finish recording")?;

        let size = file_size(&self.output)?;
        print_success(&format!(
            "Normalized {} packets to {} ({} bytes)",
            packets,
            self.output.display(),
            size
        ));
        Ok(())
    }
}
