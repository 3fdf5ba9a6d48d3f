//! Recording session lifecycle.
//!
//! `Closed → HeaderWritten → Streaming → Closed`. A session owns its codec,
//! container stream and sink; every fatal error tears all of them down
//! before it is returned.

use std::path::Path;

use opusrec_audio::codec::ogg::Packet;
use opusrec_audio::codec::opus::Application;
use tracing::{debug, error, info, warn};

use crate::backend::{Backend, Codec, Container, OpusBackend, Sink};
use crate::comment::CommentHeader;
use crate::config::{CHANNELS, FRAME_SIZE, GRANULE_RATE, MAX_PACKET_BYTES, RecorderConfig, SAMPLE_RATE};
use crate::error::{Error, Result};
use crate::frame::FrameEncoder;
use crate::header::OpusHeader;
use crate::scheduler::PageFlushScheduler;

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No output open.
    Closed,
    /// The identification header page is on the sink.
    HeaderWritten,
    /// Both header pages are written; frames are accepted.
    Streaming,
}

/// One Ogg Opus recording.
pub struct Session<B: Backend> {
    backend: B,
    config: RecorderConfig,
    state: State,
    sink: Option<B::Sink>,
    codec: Option<B::Codec>,
    container: Option<B::Container>,
    encoder: Option<FrameEncoder>,
    scheduler: PageFlushScheduler,
    preskip: u16,
    serial: u32,
}

impl Session<OpusBackend> {
    /// Creates a closed session writing real Ogg Opus files.
    pub fn opus(config: RecorderConfig) -> Self {
        Self::new(OpusBackend, config)
    }
}

impl<B: Backend> Session<B> {
    /// Creates a closed session.
    pub fn new(backend: B, config: RecorderConfig) -> Self {
        let scheduler = PageFlushScheduler::new(config.max_page_delay);
        Self {
            backend,
            config,
            state: State::Closed,
            sink: None,
            codec: None,
            container: None,
            encoder: None,
            scheduler,
            preskip: 0,
            serial: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Bytes written to the sink.
    pub fn bytes_written(&self) -> u64 {
        self.scheduler.bytes_written()
    }

    /// Pages written to the sink.
    pub fn pages_out(&self) -> u64 {
        self.scheduler.pages_out()
    }

    /// PCM samples submitted, padding excluded.
    pub fn total_samples(&self) -> u64 {
        self.encoder.as_ref().map_or(0, FrameEncoder::total_samples)
    }

    /// Running encoder granule position at 48 kHz.
    pub fn granule_position(&self) -> i64 {
        self.encoder.as_ref().map_or(0, FrameEncoder::granule_position)
    }

    /// Preskip written to the identification header.
    pub fn preskip(&self) -> u16 {
        self.preskip
    }

    /// Serial number of the logical stream.
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// True once the end-of-stream packet was written.
    pub fn is_finished(&self) -> bool {
        self.encoder.as_ref().is_some_and(FrameEncoder::is_finished)
    }

    /// Opens `path` and writes the OpusHead and OpusTags pages.
    ///
    /// A session that is still open is ended first. On failure everything
    /// opened so far is released and the session stays closed.
    pub fn start(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if self.state != State::Closed {
            if let Err(e) = self.end() {
                warn!(error = %e, "ending previous session failed");
            }
        }
        self.teardown();

        let path = path.as_ref();
        match self.open(path) {
            Ok(()) => {
                info!(
                    path = %path.display(),
                    serial = self.serial,
                    preskip = self.preskip,
                    "recording started"
                );
                Ok(())
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "recording start failed");
                self.teardown();
                Err(e)
            }
        }
    }

    /// Encodes one frame of 16-bit little-endian mono PCM.
    ///
    /// A frame shorter than [`FRAME_SIZE`] samples ends the stream.
    pub fn submit_frame(&mut self, pcm: &[u8]) -> Result<()> {
        if self.state != State::Streaming {
            return Err(Error::InvalidState("session is not streaming"));
        }
        if self.is_finished() {
            return Err(Error::InvalidState("end of stream already written"));
        }

        self.encode_and_schedule(pcm).map_err(|e| self.abort(e))
    }

    /// Finishes the stream and releases the session.
    ///
    /// A stream without an end-of-stream packet gets an empty one carrying
    /// the final granule position. Safe to call in any state.
    pub fn end(&mut self) -> Result<()> {
        let mut result = Ok(());
        if self.state == State::Streaming && !self.is_finished() {
            result = self.encode_and_schedule(&[]);
            if let Err(e) = &result {
                error!(error = %e, "finishing stream failed");
            }
        }

        if self.state != State::Closed {
            info!(
                pages = self.pages_out(),
                bytes = self.bytes_written(),
                samples = self.total_samples(),
                "recording ended"
            );
        }

        let closed = self.close_sink();
        self.teardown();
        result.and(closed)
    }

    /// Releases everything without finishing the stream.
    pub fn abort(&mut self, cause: Error) -> Error {
        error!(error = %cause, "recording aborted");
        self.teardown();
        cause
    }

    fn open(&mut self, path: &Path) -> Result<()> {
        self.sink = Some(self.backend.open_sink(path)?);

        let mut codec = self
            .backend
            .create_codec(SAMPLE_RATE, CHANNELS, Application::Audio)?;
        codec.set_bitrate(self.config.bitrate)?;
        if self.config.constrained_vbr {
            codec.set_vbr_constraint(true)?;
        }
        if let Some(complexity) = self.config.complexity {
            codec.set_complexity(complexity)?;
        }
        if let Err(e) = codec.set_lsb_depth(self.config.effective_lsb_depth()) {
            warn!(error = %e, "codec rejected lsb depth");
        }

        let lookahead = codec.lookahead()?;
        self.preskip = preskip_for(lookahead, SAMPLE_RATE)?;
        let vendor = self
            .config
            .vendor
            .clone()
            .unwrap_or_else(|| codec.version());
        self.codec = Some(codec);

        self.serial = random_serial()?;
        self.container = Some(self.backend.new_container(self.serial)?);

        let (Some(container), Some(sink)) = (self.container.as_mut(), self.sink.as_mut()) else {
            return Err(Error::InvalidState("session resources missing"));
        };

        let mut buf = [0u8; 100];
        let header = OpusHeader::new(CHANNELS, self.preskip, SAMPLE_RATE, 0);
        let n = header.write_to(&mut buf)?;
        container.packet_in(&Packet::new(buf[..n].to_vec(), 0, 0).with_bos())?;
        self.scheduler.flush_all(container, sink)?;
        self.state = State::HeaderWritten;
        debug!(preskip = self.preskip, "identification header written");

        let mut tags = CommentHeader::new(vendor).to_packet();
        tags.pad_to_segment(self.config.comment_padding);
        container.packet_in(&Packet::new(tags.into_vec(), 0, 1))?;
        self.scheduler.flush_all(container, sink)?;
        debug!("comment header written");

        self.encoder = Some(FrameEncoder::new(
            FRAME_SIZE,
            SAMPLE_RATE,
            self.preskip,
            MAX_PACKET_BYTES,
        ));
        self.state = State::Streaming;
        Ok(())
    }

    fn encode_and_schedule(&mut self, pcm: &[u8]) -> Result<()> {
        let (Some(codec), Some(container), Some(sink), Some(encoder)) = (
            self.codec.as_mut(),
            self.container.as_mut(),
            self.sink.as_mut(),
            self.encoder.as_mut(),
        ) else {
            return Err(Error::InvalidState("session resources missing"));
        };

        let packet = encoder.encode(codec, pcm)?;
        self.scheduler.submit(
            container,
            sink,
            &packet,
            encoder.granule_position(),
            encoder.frame_granules(),
        )?;

        if packet.eos {
            debug!(granule = packet.granule_position, "end of stream written");
        }
        Ok(())
    }

    fn close_sink(&mut self) -> Result<()> {
        match self.sink.take() {
            Some(mut sink) => Ok(sink.close()?),
            None => Ok(()),
        }
    }

    fn teardown(&mut self) {
        self.codec = None;
        if let Some(mut container) = self.container.take() {
            container.clear();
        }
        if let Err(e) = self.close_sink() {
            warn!(error = %e, "closing sink failed");
        }
        self.encoder = None;
        self.scheduler.reset();
        self.preskip = 0;
        self.serial = 0;
        self.state = State::Closed;
    }
}

impl<B: Backend> Drop for Session<B> {
    fn drop(&mut self) {
        if self.state != State::Closed {
            if let Err(e) = self.end() {
                warn!(error = %e, "ending session on drop failed");
            }
        }
    }
}

/// Converts codec lookahead at `coding_rate` into a 48 kHz preskip.
fn preskip_for(lookahead: i32, coding_rate: u32) -> Result<u16> {
    let preskip = lookahead.max(0) as i64 * GRANULE_RATE as i64 / coding_rate as i64;
    u16::try_from(preskip).map_err(|_| Error::Capacity {
        needed: preskip as usize,
        available: u16::MAX as usize,
    })
}

fn random_serial() -> Result<u32> {
    getrandom::u32().map_err(|e| Error::Container(format!("stream serial: {}", e)))
}
