//! Ogg page structures.

use super::crc::{crc32, crc32_update};

/// Capture pattern at the start of every page.
pub const CAPTURE_PATTERN: &[u8; 4] = b"OggS";

/// Fixed part of the page header, before the segment table.
pub const HEADER_SIZE: usize = 27;

/// Maximum lacing values on one page.
pub const MAX_SEGMENTS: usize = 255;

/// Ogg page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Version (always 0)
    pub version: u8,
    /// Header type flags
    pub header_type: u8,
    /// Absolute granule position, -1 when no packet completes on this page
    pub granule_position: i64,
    /// Stream serial number
    pub serial: u32,
    /// Page sequence number
    pub sequence: u32,
    /// CRC checksum
    pub checksum: u32,
    /// Number of segments
    pub segments: u8,
    /// Segment table
    pub segment_table: Vec<u8>,
    /// Page body data
    pub body: Vec<u8>,
}

impl Page {
    /// Creates a new empty page.
    pub fn new() -> Self {
        Self {
            version: 0,
            header_type: 0,
            granule_position: 0,
            serial: 0,
            sequence: 0,
            checksum: 0,
            segments: 0,
            segment_table: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Returns true if this is a beginning-of-stream page.
    pub fn is_bos(&self) -> bool {
        (self.header_type & flags::BOS) != 0
    }

    /// Returns true if this is an end-of-stream page.
    pub fn is_eos(&self) -> bool {
        (self.header_type & flags::EOS) != 0
    }

    /// Returns true if this is a continuation page.
    pub fn is_continuation(&self) -> bool {
        (self.header_type & flags::CONTINUATION) != 0
    }

    /// Number of packets that complete on this page.
    pub fn packets(&self) -> usize {
        self.segment_table.iter().filter(|&&v| v < 255).count()
    }

    /// Serialized header length: fixed part plus segment table.
    pub fn header_len(&self) -> usize {
        HEADER_SIZE + self.segment_table.len()
    }

    /// Body length in bytes.
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Serializes the page header with the stored checksum.
    pub fn header_bytes(&self) -> Vec<u8> {
        self.header_with_checksum(self.checksum)
    }

    /// Computes the checksum over header (with a zeroed CRC field) and body.
    pub fn compute_checksum(&self) -> u32 {
        let header = self.header_with_checksum(0);
        crc32_update(crc32(&header), &self.body)
    }

    /// Recomputes and stores the checksum.
    pub fn seal(&mut self) {
        self.checksum = self.compute_checksum();
    }

    /// Serializes the whole page: header then body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.header_bytes();
        out.extend_from_slice(&self.body);
        out
    }

    fn header_with_checksum(&self, checksum: u32) -> Vec<u8> {
        let mut header = Vec::with_capacity(self.header_len());
        header.extend_from_slice(CAPTURE_PATTERN);
        header.push(self.version);
        header.push(self.header_type);
        header.extend_from_slice(&self.granule_position.to_le_bytes());
        header.extend_from_slice(&self.serial.to_le_bytes());
        header.extend_from_slice(&self.sequence.to_le_bytes());
        header.extend_from_slice(&checksum.to_le_bytes());
        header.push(self.segments);
        header.extend_from_slice(&self.segment_table);
        header
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

/// Header type flags.
pub mod flags {
    /// Continuation of previous packet.
    pub const CONTINUATION: u8 = 0x01;
    /// Beginning of stream.
    pub const BOS: u8 = 0x02;
    /// End of stream.
    pub const EOS: u8 = 0x04;
}
