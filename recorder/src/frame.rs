//! Turns PCM frames into Opus packets.

use opusrec_audio::codec::ogg::Packet;

use crate::backend::Codec;
use crate::config::GRANULE_RATE;
use crate::error::{Error, Result};

/// Packet number of the first audio packet; 0 and 1 are the headers.
pub const FIRST_AUDIO_PACKET: i64 = 2;

/// Encodes fixed-size PCM frames and tracks granule bookkeeping.
///
/// A frame shorter than the nominal size is the last one: it is padded with
/// silence and its packet carries the end-of-stream flag.
#[derive(Debug)]
pub struct FrameEncoder {
    frame_size: usize,
    coding_rate: u32,
    preskip: u16,
    total_samples: u64,
    granule_position: i64,
    next_packet: i64,
    finished: bool,
    pcm: Vec<i16>,
    packet: Vec<u8>,
}

impl FrameEncoder {
    /// Creates an encoder for `frame_size`-sample frames at `coding_rate`.
    pub fn new(frame_size: usize, coding_rate: u32, preskip: u16, max_packet_bytes: usize) -> Self {
        Self {
            frame_size,
            coding_rate,
            preskip,
            total_samples: 0,
            granule_position: 0,
            next_packet: FIRST_AUDIO_PACKET,
            finished: false,
            pcm: vec![0; frame_size],
            packet: vec![0; max_packet_bytes],
        }
    }

    /// Samples fed in so far, padding excluded.
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Running granule position at 48 kHz.
    pub fn granule_position(&self) -> i64 {
        self.granule_position
    }

    /// Granule advance of one full frame.
    pub fn frame_granules(&self) -> i64 {
        self.frame_size as i64 * GRANULE_RATE as i64 / self.coding_rate as i64
    }

    /// True once the end-of-stream packet was produced.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Granule of the end-of-stream packet: total input duration at 48 kHz,
    /// rounded up, plus the preskip.
    pub fn final_granule_position(&self) -> i64 {
        let rate = self.coding_rate as u64;
        let scaled = (self.total_samples * GRANULE_RATE as u64 + rate - 1) / rate;
        scaled as i64 + self.preskip as i64
    }

    /// Encodes one frame of little-endian 16-bit mono PCM.
    ///
    /// An empty frame produces an empty end-of-stream packet without
    /// invoking the codec.
    pub fn encode<C: Codec>(&mut self, codec: &mut C, pcm: &[u8]) -> Result<Packet> {
        if self.finished {
            return Err(Error::InvalidState("end of stream already encoded"));
        }
        if pcm.len() % 2 != 0 {
            return Err(Error::InvalidFrame(format!("odd PCM byte length {}", pcm.len())));
        }
        let samples = pcm.len() / 2;
        if samples > self.frame_size {
            return Err(Error::Capacity {
                needed: samples,
                available: self.frame_size,
            });
        }

        self.total_samples += samples as u64;
        let eos = samples < self.frame_size;

        let mut len = 0;
        if samples > 0 {
            for (dst, src) in self.pcm.iter_mut().zip(pcm.chunks_exact(2)) {
                *dst = i16::from_le_bytes([src[0], src[1]]);
            }
            self.pcm[samples..].fill(0);

            len = codec.encode(&self.pcm, self.frame_size, &mut self.packet)?;
            self.granule_position += self.frame_granules();
        }

        let granule = if eos {
            self.final_granule_position()
        } else {
            self.granule_position
        };

        let mut packet = Packet::new(self.packet[..len].to_vec(), granule, self.next_packet);
        self.next_packet += 1;
        if eos {
            packet = packet.with_eos();
            self.finished = true;
        }
        Ok(packet)
    }
}
