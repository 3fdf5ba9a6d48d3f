//! Page flush scheduling.
//!
//! Decides when packets queued in the container become pages on the sink.
//! Pages are drained before a new packet goes in when it would overflow the
//! open page's segment table or the granule gap since the last flushed page
//! exceeds the delay budget, and again after it goes in: forced at end of
//! stream, past the delay budget or on a full segment table, otherwise only
//! when the container already has a complete page.

use opusrec_audio::codec::ogg::{MAX_SEGMENTS, Packet, Page};
use tracing::{debug, error};

use crate::backend::{Container, Sink};
use crate::config::PAGE_FILL;
use crate::error::{Error, Result};

/// Page writer with flush heuristics and output counters.
#[derive(Debug, Default)]
pub struct PageFlushScheduler {
    max_delay: i64,
    last_granule_position: i64,
    pending_segments: usize,
    bytes_written: u64,
    pages_out: u64,
}

impl PageFlushScheduler {
    /// Creates a scheduler allowing at most `max_delay` granules between pages.
    pub fn new(max_delay: i64) -> Self {
        Self {
            max_delay,
            ..Default::default()
        }
    }

    /// Bytes written to the sink.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Pages written to the sink.
    pub fn pages_out(&self) -> u64 {
        self.pages_out
    }

    /// Granule position of the last written page that completed a packet.
    pub fn last_granule_position(&self) -> i64 {
        self.last_granule_position
    }

    /// Audio segments queued but not yet written.
    pub fn pending_segments(&self) -> usize {
        self.pending_segments
    }

    /// Forces out every pending page. Used for the header packets.
    pub fn flush_all<O: Container, S: Sink>(&mut self, container: &mut O, sink: &mut S) -> Result<()> {
        while let Some(page) = container.flush(PAGE_FILL) {
            self.write_page(sink, &page)?;
        }
        Ok(())
    }

    /// Queues an audio packet and writes whatever pages are due.
    ///
    /// `encoder_granule` is the running granule after this packet and
    /// `frame_granules` the advance of one full frame.
    pub fn submit<O: Container, S: Sink>(
        &mut self,
        container: &mut O,
        sink: &mut S,
        packet: &Packet,
        encoder_granule: i64,
        frame_granules: i64,
    ) -> Result<()> {
        let segments = packet.segments();

        loop {
            let overflow = segments <= MAX_SEGMENTS && self.pending_segments + segments > MAX_SEGMENTS;
            let late = encoder_granule - self.last_granule_position > self.max_delay;
            if !(overflow || late) {
                break;
            }
            match container.flush(PAGE_FILL) {
                Some(page) => self.drain(sink, &page)?,
                None => break,
            }
        }

        container.packet_in(packet)?;
        self.pending_segments += segments;

        loop {
            let force = packet.eos
                || encoder_granule + frame_granules - self.last_granule_position > self.max_delay
                || self.pending_segments >= MAX_SEGMENTS;
            let page = if force {
                container.flush(PAGE_FILL)
            } else {
                container.page_out(PAGE_FILL)
            };
            match page {
                Some(page) => self.drain(sink, &page)?,
                None => break,
            }
        }

        Ok(())
    }

    /// Resets counters and heuristics.
    pub fn reset(&mut self) {
        *self = Self::new(self.max_delay);
    }

    fn drain<S: Sink>(&mut self, sink: &mut S, page: &Page) -> Result<()> {
        if page.packets() > 0 {
            self.last_granule_position = page.granule_position;
        }
        self.pending_segments = self.pending_segments.saturating_sub(page.segments as usize);
        self.write_page(sink, page)
    }

    fn write_page<S: Sink>(&mut self, sink: &mut S, page: &Page) -> Result<()> {
        let header = page.header_bytes();
        let expected = header.len() + page.body.len();
        let written = sink.append(&header)? + sink.append(&page.body)?;
        if written != expected {
            error!(sequence = page.sequence, expected, written, "short page write");
            return Err(Error::ShortWrite { expected, written });
        }

        self.bytes_written += written as u64;
        self.pages_out += 1;
        debug!(
            sequence = page.sequence,
            granule = page.granule_position,
            segments = page.segments,
            bytes = written,
            "page written"
        );
        Ok(())
    }
}
