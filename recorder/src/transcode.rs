//! Re-recording of headerless raw Opus packet files.
//!
//! Some capture pipelines dump fixed-size Opus packets back to back with no
//! container. [`normalize`] decodes them and feeds the PCM through a
//! [`Session`], producing a regular Ogg Opus file.

use std::io::{self, Read};

use opusrec_audio::codec::opus::Decoder;
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::config::FRAME_SIZE;
use crate::error::Result;
use crate::session::Session;

/// Default size of one raw packet.
pub const RAW_PACKET_SIZE: usize = 133;

/// Decodes one Opus packet into mono PCM samples.
pub trait PacketDecoder {
    fn decode(&mut self, packet: &[u8]) -> Result<Vec<i16>>;
}

impl PacketDecoder for Decoder {
    fn decode(&mut self, packet: &[u8]) -> Result<Vec<i16>> {
        Ok(Decoder::decode(self, packet)?)
    }
}

/// Decodes `packet_size`-byte packets from `reader` into an open session.
///
/// Decoded audio is regrouped into full frames; the remainder goes out as
/// the final short frame. A trailing partial packet is skipped. Returns the
/// number of packets decoded. Any failure tears the session down.
pub fn normalize<R, D, B>(mut reader: R, decoder: &mut D, session: &mut Session<B>, packet_size: usize) -> Result<usize>
where
    R: Read,
    D: PacketDecoder,
    B: Backend,
{
    let frame_bytes = FRAME_SIZE * 2;
    let mut packet = vec![0u8; packet_size.max(1)];
    let mut pending: Vec<u8> = Vec::with_capacity(frame_bytes * 2);
    let mut packets = 0;

    loop {
        let n = read_full(&mut reader, &mut packet).map_err(|e| session.abort(e.into()))?;
        if n == 0 {
            break;
        }
        if n < packet.len() {
            warn!(bytes = n, packet_size, "ignoring trailing partial packet");
            break;
        }

        let pcm = decoder.decode(&packet).map_err(|e| session.abort(e))?;
        packets += 1;
        for sample in pcm {
            pending.extend_from_slice(&sample.to_le_bytes());
        }

        let full = pending.len() / frame_bytes * frame_bytes;
        for frame in pending[..full].chunks_exact(frame_bytes) {
            session.submit_frame(frame)?;
        }
        pending.drain(..full);
    }

    if !pending.is_empty() {
        session.submit_frame(&pending)?;
    }

    debug!(packets, "raw packets normalized");
    Ok(packets)
}

/// Reads until `buf` is full or the input ends. Returns the bytes read;
/// fewer than `buf.len()` means the input is exhausted.
pub fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecorderConfig;
    use crate::error::Error;
    use crate::session::State;
    use crate::testutil::{FakeBackend, FakeDecoder};
    use opusrec_audio::codec::ogg::packets_from_pages;
    use std::io::Cursor;

    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.0.len().min(3).min(buf.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_read_full_joins_short_reads() {
        let data: Vec<u8> = (0..10).collect();
        let mut reader = Trickle(&data);
        let mut buf = [0u8; 8];
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 8);
        assert_eq!(&buf, &data[..8]);
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 2);
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 0);
    }

    fn session(backend: &FakeBackend) -> Session<FakeBackend> {
        let mut session = Session::new(backend.clone(), RecorderConfig::default());
        session.start("normalized.opus").unwrap();
        session
    }

    #[test]
    fn test_normalize_full_frames() {
        let backend = FakeBackend::default();
        let mut session = session(&backend);
        let mut decoder = FakeDecoder { samples: 960, fail_at: None, decoded: 0 };

        let input = vec![7u8; 133 * 4];
        let packets = normalize(Cursor::new(input), &mut decoder, &mut session, RAW_PACKET_SIZE).unwrap();
        assert_eq!(packets, 4);
        assert_eq!(session.total_samples(), 3840);
        assert!(!session.is_finished());

        session.end().unwrap();
        let pages = backend.pages();
        let audio = packets_from_pages(&pages[2..]);
        // Four frames plus the empty end-of-stream packet.
        assert_eq!(audio.len(), 5);
        assert!(pages.last().unwrap().is_eos());
    }

    #[test]
    fn test_normalize_regroups_short_packets() {
        let backend = FakeBackend::default();
        let mut session = session(&backend);
        // 20ms packets: three make one 960-sample frame.
        let mut decoder = FakeDecoder { samples: 320, fail_at: None, decoded: 0 };

        let input = vec![1u8; 40 * 7];
        let packets = normalize(Cursor::new(input), &mut decoder, &mut session, 40).unwrap();
        assert_eq!(packets, 7);
        assert_eq!(session.total_samples(), 2240);
        // 2 full frames, then 320 leftover samples end the stream.
        assert!(session.is_finished());
        assert_eq!(backend.observed.borrow().encodes, 3);
    }

    #[test]
    fn test_normalize_ignores_partial_tail() {
        let backend = FakeBackend::default();
        let mut session = session(&backend);
        let mut decoder = FakeDecoder { samples: 960, fail_at: None, decoded: 0 };

        let input = vec![0u8; 133 * 2 + 50];
        let packets = normalize(Cursor::new(input), &mut decoder, &mut session, 133).unwrap();
        assert_eq!(packets, 2);
        assert_eq!(decoder.decoded, 2);
    }

    #[test]
    fn test_normalize_decode_failure_aborts() {
        let backend = FakeBackend::default();
        let mut session = session(&backend);
        let mut decoder = FakeDecoder { samples: 960, fail_at: Some(2), decoded: 0 };

        let err = normalize(Cursor::new(vec![0u8; 133 * 3]), &mut decoder, &mut session, 133).unwrap_err();
        assert!(matches!(err, Error::Codec { code: -4, .. }));
        assert_eq!(session.state(), State::Closed);
        assert_eq!(session.pages_out(), 0);
        assert_eq!(backend.observed.borrow().sinks_closed, 1);
    }

    #[test]
    fn test_normalize_empty_input() {
        let backend = FakeBackend::default();
        let mut session = session(&backend);
        let mut decoder = FakeDecoder { samples: 960, fail_at: None, decoded: 0 };

        let packets = normalize(Cursor::new(Vec::new()), &mut decoder, &mut session, 133).unwrap();
        assert_eq!(packets, 0);
        assert_eq!(session.state(), State::Streaming);
    }
}
