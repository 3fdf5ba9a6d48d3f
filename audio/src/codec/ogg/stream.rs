//! Ogg stream state.
//!
//! Laces submitted packets into pages following libogg's paging rules, so
//! page boundaries match what a libogg-based muxer would produce.

use super::packet::Packet;
use super::page::{MAX_SEGMENTS, Page, flags};

/// Ogg stream error.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// A packet was submitted after the end-of-stream packet.
    #[error("ogg: packet submitted after end of stream")]
    Ended,
}

#[derive(Debug, Clone, Copy)]
struct Lacing {
    value: u8,
    granule: i64,
    packet_start: bool,
}

/// Ogg stream state for writing one logical bitstream.
#[derive(Debug)]
pub struct OggStream {
    serial: u32,
    sequence: u32,
    granule_position: i64,
    packets: u64,
    body: Vec<u8>,
    lacing: Vec<Lacing>,
    bos_emitted: bool,
    eos: bool,
}

impl OggStream {
    /// Creates a new stream state.
    pub fn new(serial: u32) -> Self {
        Self {
            serial,
            sequence: 0,
            granule_position: 0,
            packets: 0,
            body: Vec::new(),
            lacing: Vec::new(),
            bos_emitted: false,
            eos: false,
        }
    }

    /// Returns the serial number.
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Returns the sequence number of the next page.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Returns the granule position of the last submitted packet.
    pub fn granule_position(&self) -> i64 {
        self.granule_position
    }

    /// Returns the number of packets submitted so far.
    pub fn packets(&self) -> u64 {
        self.packets
    }

    /// Returns true once the end-of-stream packet was submitted.
    pub fn is_eos(&self) -> bool {
        self.eos
    }

    /// Lacing values waiting to be paged.
    pub fn pending_segments(&self) -> usize {
        self.lacing.len()
    }

    /// Submits a packet.
    pub fn packet_in(&mut self, packet: &Packet) -> Result<(), StreamError> {
        if self.eos {
            return Err(StreamError::Ended);
        }

        let n = packet.segments();
        self.lacing.reserve(n);
        for i in 0..n {
            let last = i == n - 1;
            self.lacing.push(Lacing {
                value: if last { (packet.data.len() % 255) as u8 } else { 255 },
                granule: if last { packet.granule_position } else { self.granule_position },
                packet_start: i == 0,
            });
        }
        self.body.extend_from_slice(&packet.data);

        self.granule_position = packet.granule_position;
        self.packets += 1;
        if packet.eos {
            self.eos = true;
        }
        Ok(())
    }

    /// Forces out a page holding whatever is pending.
    ///
    /// A page closes early once it carries more than `fill` body bytes and
    /// at least four completed packets. Returns `None` when nothing is pending.
    pub fn flush(&mut self, fill: usize) -> Option<Page> {
        self.build_page(true, fill)
    }

    /// Returns a page only if one is complete: end of stream reached, more
    /// than `fill` bytes pending, a full segment table, or the first page
    /// not yet written.
    pub fn page_out(&mut self, fill: usize) -> Option<Page> {
        let pending = !self.lacing.is_empty();
        let force = (self.eos && pending)
            || self.body.len() > fill
            || self.lacing.len() >= MAX_SEGMENTS
            || (pending && !self.bos_emitted);
        self.build_page(force, fill)
    }

    /// Drops all pending data and resets the stream, keeping its serial.
    pub fn clear(&mut self) {
        *self = Self::new(self.serial);
    }

    fn build_page(&mut self, mut force: bool, fill: usize) -> Option<Page> {
        let max = self.lacing.len().min(MAX_SEGMENTS);
        if max == 0 {
            return None;
        }

        let mut vals = 0;
        let mut granule = -1;

        if !self.bos_emitted {
            // The first page carries only the first packet.
            granule = 0;
            while vals < max {
                let value = self.lacing[vals].value;
                vals += 1;
                if value < 255 {
                    break;
                }
            }
        } else {
            let mut acc = 0usize;
            let mut packets_done = 0;
            let mut packet_just_done = 0;
            while vals < max {
                if acc > fill && packet_just_done >= 4 {
                    force = true;
                    break;
                }
                let lacing = self.lacing[vals];
                acc += lacing.value as usize;
                if lacing.value < 255 {
                    granule = lacing.granule;
                    packets_done += 1;
                    packet_just_done = packets_done;
                } else {
                    packet_just_done = 0;
                }
                vals += 1;
            }
            if vals == MAX_SEGMENTS {
                force = true;
            }
        }

        if !force {
            return None;
        }

        let mut header_type = 0u8;
        if !self.lacing[0].packet_start {
            header_type |= flags::CONTINUATION;
        }
        if !self.bos_emitted {
            header_type |= flags::BOS;
        }
        if self.eos && self.lacing.len() == vals {
            header_type |= flags::EOS;
        }
        self.bos_emitted = true;

        let segment_table: Vec<u8> = self.lacing.drain(..vals).map(|l| l.value).collect();
        let bytes: usize = segment_table.iter().map(|&v| v as usize).sum();
        let body: Vec<u8> = self.body.drain(..bytes).collect();

        let mut page = Page {
            version: 0,
            header_type,
            granule_position: granule,
            serial: self.serial,
            sequence: self.sequence,
            checksum: 0,
            segments: vals as u8,
            segment_table,
            body,
        };
        page.seal();
        self.sequence += 1;

        Some(page)
    }
}
