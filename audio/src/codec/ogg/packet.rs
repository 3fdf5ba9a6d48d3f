//! Ogg logical packets.

/// One logical packet handed to an [`OggStream`](super::OggStream).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    /// Packet payload.
    pub data: Vec<u8>,
    /// Beginning of stream.
    pub bos: bool,
    /// End of stream.
    pub eos: bool,
    /// Granule position stamped on the page this packet completes.
    pub granule_position: i64,
    /// Packet sequence number within the logical stream.
    pub packet_no: i64,
}

impl Packet {
    /// Creates a packet with no BOS/EOS flags.
    pub fn new(data: Vec<u8>, granule_position: i64, packet_no: i64) -> Self {
        Self {
            data,
            bos: false,
            eos: false,
            granule_position,
            packet_no,
        }
    }

    /// Marks the packet as beginning of stream.
    pub fn with_bos(mut self) -> Self {
        self.bos = true;
        self
    }

    /// Marks the packet as end of stream.
    pub fn with_eos(mut self) -> Self {
        self.eos = true;
        self
    }

    /// Number of lacing values (segments) the packet occupies.
    ///
    /// A packet whose length is a multiple of 255 ends with a zero lacing value.
    pub fn segments(&self) -> usize {
        segments_for(self.data.len())
    }
}

/// Number of lacing values needed for a packet of `len` bytes.
pub fn segments_for(len: usize) -> usize {
    len / 255 + 1
}
