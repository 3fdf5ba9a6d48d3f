//! Collaborators of a recording session: codec, container stream and sink.
//!
//! [`OpusBackend`] wires them to libopus, the in-crate Ogg stream and a
//! file on disk. Tests substitute in-memory fakes through [`Backend`].

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use opusrec_audio::codec::ogg::{OggStream, Packet, Page};
use opusrec_audio::codec::opus::{self, Application, Encoder};

use crate::error::Result;

/// Audio codec used to compress PCM frames.
pub trait Codec {
    /// Encodes `frame_size` samples per channel into `out`, returning the packet length.
    fn encode(&mut self, pcm: &[i16], frame_size: usize, out: &mut [u8]) -> Result<usize>;

    /// Returns the encoder delay in samples at the coding rate.
    fn lookahead(&mut self) -> Result<i32>;

    /// Sets the target bitrate.
    fn set_bitrate(&mut self, bitrate: i32) -> Result<()>;

    /// Enables constrained VBR.
    fn set_vbr_constraint(&mut self, constrained: bool) -> Result<()>;

    /// Sets the encoder complexity.
    fn set_complexity(&mut self, complexity: i32) -> Result<()>;

    /// Declares the input bit depth.
    fn set_lsb_depth(&mut self, depth: i32) -> Result<()>;

    /// Codec version string, used as the OpusTags vendor.
    fn version(&self) -> String;
}

/// Ogg logical stream that turns packets into pages.
pub trait Container {
    /// Queues a packet.
    fn packet_in(&mut self, packet: &Packet) -> Result<()>;

    /// Forces out a page if anything is pending.
    fn flush(&mut self, fill: usize) -> Option<Page>;

    /// Returns a page only if one is complete.
    fn page_out(&mut self, fill: usize) -> Option<Page>;

    /// Drops all pending state.
    fn clear(&mut self);
}

/// Destination of the serialized pages.
pub trait Sink {
    /// Appends bytes, returning how many were taken.
    fn append(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Flushes and releases the destination.
    fn close(&mut self) -> io::Result<()>;
}

/// Factory for the collaborators of one session.
pub trait Backend {
    type Codec: Codec;
    type Container: Container;
    type Sink: Sink;

    /// Opens the output at `path`.
    fn open_sink(&mut self, path: &Path) -> Result<Self::Sink>;

    /// Creates an encoder.
    fn create_codec(&mut self, sample_rate: u32, channels: u8, application: Application) -> Result<Self::Codec>;

    /// Creates a logical stream with the given serial number.
    fn new_container(&mut self, serial: u32) -> Result<Self::Container>;
}

impl Codec for Encoder {
    fn encode(&mut self, pcm: &[i16], frame_size: usize, out: &mut [u8]) -> Result<usize> {
        Ok(self.encode_to(pcm, frame_size as i32, out)?)
    }

    fn lookahead(&mut self) -> Result<i32> {
        Ok(Encoder::lookahead(self)?)
    }

    fn set_bitrate(&mut self, bitrate: i32) -> Result<()> {
        Ok(Encoder::set_bitrate(self, bitrate)?)
    }

    fn set_vbr_constraint(&mut self, constrained: bool) -> Result<()> {
        Ok(Encoder::set_vbr_constraint(self, constrained)?)
    }

    fn set_complexity(&mut self, complexity: i32) -> Result<()> {
        Ok(Encoder::set_complexity(self, complexity)?)
    }

    fn set_lsb_depth(&mut self, depth: i32) -> Result<()> {
        Ok(Encoder::set_lsb_depth(self, depth)?)
    }

    fn version(&self) -> String {
        opus::version_string()
    }
}

impl Container for OggStream {
    fn packet_in(&mut self, packet: &Packet) -> Result<()> {
        Ok(OggStream::packet_in(self, packet)?)
    }

    fn flush(&mut self, fill: usize) -> Option<Page> {
        OggStream::flush(self, fill)
    }

    fn page_out(&mut self, fill: usize) -> Option<Page> {
        OggStream::page_out(self, fill)
    }

    fn clear(&mut self) {
        OggStream::clear(self)
    }
}

impl Sink for Vec<u8> {
    fn append(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Buffered file sink.
#[derive(Debug)]
pub struct FileSink {
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    /// Creates or truncates the file at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(file)),
        })
    }

    /// Returns true until `close` is called.
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

impl Sink for FileSink {
    fn append(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))?;
        writer.write_all(bytes)?;
        Ok(bytes.len())
    }

    fn close(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

/// libopus encoder, in-crate Ogg stream, file output.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpusBackend;

impl Backend for OpusBackend {
    type Codec = Encoder;
    type Container = OggStream;
    type Sink = FileSink;

    fn open_sink(&mut self, path: &Path) -> Result<FileSink> {
        Ok(FileSink::create(path)?)
    }

    fn create_codec(&mut self, sample_rate: u32, channels: u8, application: Application) -> Result<Encoder> {
        Ok(Encoder::new(sample_rate as i32, channels as i32, application)?)
    }

    fn new_container(&mut self, serial: u32) -> Result<OggStream> {
        Ok(OggStream::new(serial))
    }
}
