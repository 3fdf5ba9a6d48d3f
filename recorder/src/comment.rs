//! OpusTags comment packet (RFC 7845 section 5.2).

/// Magic signature of the comment header.
pub const OPUS_TAGS_MAGIC: &[u8; 8] = b"OpusTags";

/// Comment header content: a vendor string and no user comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentHeader {
    vendor: String,
}

impl CommentHeader {
    /// Creates a comment header with the given vendor string.
    pub fn new(vendor: impl Into<String>) -> Self {
        Self { vendor: vendor.into() }
    }

    /// Returns the vendor string.
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// Serializes the comment packet, unpadded.
    pub fn to_packet(&self) -> CommentBuffer {
        let vendor = self.vendor.as_bytes();
        let mut data = Vec::with_capacity(8 + 4 + vendor.len() + 4);
        data.extend_from_slice(OPUS_TAGS_MAGIC);
        data.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
        data.extend_from_slice(vendor);
        data.extend_from_slice(&0u32.to_le_bytes()); // user comment count
        CommentBuffer(data)
    }
}

/// Growable comment packet buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBuffer(Vec<u8>);

impl CommentBuffer {
    /// Returns the length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// Zero-extends the buffer so at least `amount` spare bytes follow the
    /// content, rounded up to fill the last Ogg segment (length ≡ 254 mod 255).
    ///
    /// Does nothing when `amount` is 0.
    pub fn pad_to_segment(&mut self, amount: usize) {
        if amount == 0 {
            return;
        }
        let new_len = padded_len(self.0.len(), amount);
        self.0.resize(new_len, 0);
    }
}

fn padded_len(len: usize, amount: usize) -> usize {
    (len + amount + 255) / 255 * 255 - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_layout() {
        let packet = CommentHeader::new("libopus 1.4").to_packet();
        let bytes = packet.as_bytes();

        assert_eq!(packet.len(), 8 + 4 + 11 + 4);
        assert_eq!(&bytes[0..8], b"OpusTags");
        assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), 11);
        assert_eq!(&bytes[12..23], b"libopus 1.4");
        assert_eq!(u32::from_le_bytes(bytes[23..27].try_into().unwrap()), 0);
    }

    #[test]
    fn test_empty_vendor() {
        let packet = CommentHeader::new("").to_packet();
        assert_eq!(packet.len(), 16);
    }

    #[test]
    fn test_pad_to_segment() {
        let mut packet = CommentHeader::new("libopus 1.4").to_packet();
        let before = packet.len();
        packet.pad_to_segment(512);

        assert_eq!(packet.len(), 764);
        assert!(packet.len() - before >= 512);
        assert_eq!(packet.len() % 255, 254);
        assert!(packet.as_bytes()[before..].iter().all(|&b| b == 0));
        assert_eq!(&packet.as_bytes()[..8], b"OpusTags");
    }

    #[test]
    fn test_pad_exact_segment_multiple_keeps_slack() {
        // 16 + 494 = 510 = 2 * 255: still at least 494 spare bytes.
        let mut packet = CommentHeader::new("").to_packet();
        packet.pad_to_segment(494);
        assert_eq!(packet.len(), 764);
        assert!(packet.len() - 16 >= 494);
    }

    #[test]
    fn test_pad_zero_is_noop() {
        let mut packet = CommentHeader::new("x").to_packet();
        let before = packet.clone();
        packet.pad_to_segment(0);
        assert_eq!(packet, before);
    }

    #[test]
    fn test_padded_len_values() {
        assert_eq!(padded_len(27, 512), 764);
        assert_eq!(padded_len(1, 1), 254);
        assert_eq!(padded_len(254, 1), 509);
    }
}
