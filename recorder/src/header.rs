//! OpusHead identification packet (RFC 7845 section 5.1).

use crate::error::{Error, Result};

/// Magic signature of the identification header.
pub const OPUS_HEAD_MAGIC: &[u8; 8] = b"OpusHead";
/// Identification header version.
pub const OPUS_HEAD_VERSION: u8 = 1;
/// Length of a mapping family 0 header.
pub const OPUS_HEAD_MIN_SIZE: usize = 19;

/// Stream parameters carried by the identification header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpusHeader {
    /// Output channel count (1-255); 0 is rejected when writing.
    pub channels: u8,
    /// Samples at 48 kHz to discard from the decoder output.
    pub preskip: u16,
    /// Sample rate of the input before encoding, informational.
    pub input_sample_rate: u32,
    /// Output gain in Q7.8 dB.
    pub gain: i16,
    /// Channel mapping family. 0 is a single stream.
    pub channel_mapping: u8,
    /// Number of Opus streams; written only when `channel_mapping != 0`.
    pub stream_count: u8,
    /// Number of coupled (stereo) streams; written only when `channel_mapping != 0`.
    pub coupled_count: u8,
    /// One entry per channel; written only when `channel_mapping != 0`.
    pub stream_map: Vec<u8>,
}

impl OpusHeader {
    /// Creates a single-stream (mapping family 0) header.
    pub fn new(channels: u8, preskip: u16, input_sample_rate: u32, gain: i16) -> Self {
        Self {
            channels,
            preskip,
            input_sample_rate,
            gain,
            channel_mapping: 0,
            stream_count: 1,
            coupled_count: 0,
            stream_map: Vec::new(),
        }
    }

    /// Switches to a multistream mapping family.
    pub fn with_mapping(mut self, family: u8, stream_count: u8, coupled_count: u8, stream_map: Vec<u8>) -> Self {
        self.channel_mapping = family;
        self.stream_count = stream_count;
        self.coupled_count = coupled_count;
        self.stream_map = stream_map;
        self
    }

    /// Serialized length in bytes.
    pub fn packet_len(&self) -> usize {
        if self.channel_mapping == 0 {
            OPUS_HEAD_MIN_SIZE
        } else {
            OPUS_HEAD_MIN_SIZE + 2 + self.channels as usize
        }
    }

    /// Writes the header into `buf`, returning the number of bytes written.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<usize> {
        if self.channels == 0 {
            return Err(Error::Config("channel count must be at least 1".to_string()));
        }
        let needed = self.packet_len();
        if buf.len() < needed {
            return Err(Error::Capacity {
                needed,
                available: buf.len(),
            });
        }

        let mut w = ByteWriter::new(buf);
        w.put(OPUS_HEAD_MAGIC)?;
        w.put(&[OPUS_HEAD_VERSION, self.channels])?;
        w.put(&self.preskip.to_le_bytes())?;
        w.put(&self.input_sample_rate.to_le_bytes())?;
        w.put(&self.gain.to_le_bytes())?;
        w.put(&[self.channel_mapping])?;

        if self.channel_mapping != 0 {
            if self.stream_map.len() != self.channels as usize {
                return Err(Error::Config(format!(
                    "stream map has {} entries for {} channels",
                    self.stream_map.len(),
                    self.channels
                )));
            }
            w.put(&[self.stream_count, self.coupled_count])?;
            w.put(&self.stream_map)?;
        }

        Ok(w.pos)
    }

    /// Serializes the header into a new packet.
    pub fn to_packet(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.packet_len()];
        let n = self.write_to(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }
}

/// Cursor over a fixed buffer that refuses to overrun it.
struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            return Err(Error::Capacity {
                needed: end,
                available: self.buf.len(),
            });
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }
}
