//! Raw PCM recording command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use opusrec_recorder::{FRAME_SIZE, SAMPLE_RATE, Session, read_full};
use tracing::debug;

use super::{file_size, load_config, open_input, print_success};
use crate::Cli;

/// Encode raw PCM into an Ogg Opus file.
///
/// The input is 16-bit little-endian mono PCM at 16 kHz. It is split into
/// 60 ms frames; a trailing partial frame ends the stream.
#[derive(Args)]
pub struct RecordCommand {
    /// Raw PCM input, `-` for stdin
    pub(crate) input: String,

    /// Output Ogg Opus file
    #[arg(short = 'o', long)]
    pub(crate) output: PathBuf,
}

impl RecordCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let config = load_config(cli)?;
        let mut input = open_input(&self.input)?;

        let mut session = Session::opus(config);
        session
            .start(&self.output)
            .with_context(|| format!("failed to start recording {}", self.output.display()))?;

        let mut frame = vec![0u8; FRAME_SIZE * 2];
        loop {
            let n = read_full(&mut input, &mut frame).context("failed to read input")?;
            if n == frame.len() {
                session.submit_frame(&frame).context("failed to encode frame")?;
                continue;
            }
            if n % 2 != 0 {
                debug!("dropping trailing odd byte");
            }
            session
                .submit_frame(&frame[..n - n % 2])
                .context("failed to encode final frame")?;
            break;
        }

        let samples = session.total_samples();
        session.end().context("failed to finish recording")?;

        let size = file_size(&self.output)?;
        print_success(&format!(
            "Recorded {:.2}s to {} ({} bytes)",
            samples as f64 / SAMPLE_RATE as f64,
            self.output.display(),
            size
        ));
        Ok(())
    }
}
