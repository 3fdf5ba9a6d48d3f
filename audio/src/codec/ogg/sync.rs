//! Ogg sync/decoder for reading Ogg streams.

use std::io::{self, Read};

use super::page::{CAPTURE_PATTERN, HEADER_SIZE, Page};

/// Ogg sync state for reading pages.
pub struct OggSync<R: Read> {
    reader: R,
}

impl<R: Read> OggSync<R> {
    /// Creates a new Ogg sync state.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Reads the next Ogg page, verifying its checksum.
    ///
    /// Returns `Ok(None)` when the input ends on a page boundary; input that
    /// ends inside a page is `InvalidData` or `UnexpectedEof`.
    pub fn read_page(&mut self) -> io::Result<Option<Page>> {
        let mut header = [0u8; HEADER_SIZE];
        let mut filled = 0;
        while filled < HEADER_SIZE {
            match self.reader.read(&mut header[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        if filled == 0 {
            return Ok(None);
        }
        if filled < HEADER_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("truncated Ogg page header: {} of {} bytes", filled, HEADER_SIZE),
            ));
        }

        if &header[0..4] != CAPTURE_PATTERN {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "invalid Ogg magic"));
        }

        let segments = header[26];
        let mut segment_table = vec![0u8; segments as usize];
        self.reader.read_exact(&mut segment_table)?;

        let body_size: usize = segment_table.iter().map(|&s| s as usize).sum();
        let mut body = vec![0u8; body_size];
        self.reader.read_exact(&mut body)?;

        let page = Page {
            version: header[4],
            header_type: header[5],
            granule_position: i64::from_le_bytes(le_field(&header[6..14])),
            serial: u32::from_le_bytes(le_field(&header[14..18])),
            sequence: u32::from_le_bytes(le_field(&header[18..22])),
            checksum: u32::from_le_bytes(le_field(&header[22..26])),
            segments,
            segment_table,
            body,
        };

        if page.compute_checksum() != page.checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Ogg page {} checksum mismatch", page.sequence),
            ));
        }

        Ok(Some(page))
    }

    /// Reads all remaining pages.
    pub fn read_all(&mut self) -> io::Result<Vec<Page>> {
        let mut pages = Vec::new();
        while let Some(page) = self.read_page()? {
            pages.push(page);
        }
        Ok(pages)
    }

    /// Returns the inner reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

fn le_field<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

/// Reassembles the packets carried by consecutive pages of one stream.
///
/// A packet continued across pages is joined; a trailing unfinished packet
/// is dropped.
pub fn packets_from_pages(pages: &[Page]) -> Vec<Vec<u8>> {
    let mut packets = Vec::new();
    let mut current = Vec::new();
    for page in pages {
        let mut offset = 0;
        for &lacing in &page.segment_table {
            let len = lacing as usize;
            current.extend_from_slice(&page.body[offset..offset + len]);
            offset += len;
            if lacing < 255 {
                packets.push(std::mem::take(&mut current));
            }
        }
    }
    packets
}
