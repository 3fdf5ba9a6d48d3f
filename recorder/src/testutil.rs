//! In-memory collaborators shared by the unit tests.

use std::cell::RefCell;
use std::io::{self, Cursor};
use std::path::Path;
use std::rc::Rc;

use opusrec_audio::codec::ogg::{OggStream, OggSync, Packet, Page};
use opusrec_audio::codec::opus::Application;

use crate::backend::{Backend, Codec, Container, Sink};
use crate::error::{Error, Result};
use crate::transcode::PacketDecoder;

/// What the fakes observed.
#[derive(Debug, Default)]
pub struct Observed {
    pub output: Vec<u8>,
    pub opened: Vec<String>,
    pub sinks_closed: usize,
    pub appends: usize,
    pub encodes: usize,
    pub containers_cleared: usize,
    pub codecs_dropped: usize,
    pub bitrate: Option<i32>,
    pub vbr_constraint: Option<bool>,
    pub lsb_depth: Option<i32>,
}

/// Backend whose failures are switched on per test.
#[derive(Clone)]
pub struct FakeBackend {
    pub observed: Rc<RefCell<Observed>>,
    pub lookahead: i32,
    pub packet_len: usize,
    pub fail_open: bool,
    pub fail_create: Option<i32>,
    pub fail_container: bool,
    pub fail_encode_at: Option<usize>,
    pub reject_lsb_depth: bool,
    pub short_write_at: Option<usize>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            observed: Rc::default(),
            lookahead: 104,
            packet_len: 40,
            fail_open: false,
            fail_create: None,
            fail_container: false,
            fail_encode_at: None,
            reject_lsb_depth: false,
            short_write_at: None,
        }
    }
}

impl FakeBackend {
    pub fn output(&self) -> Vec<u8> {
        self.observed.borrow().output.clone()
    }

    pub fn pages(&self) -> Vec<Page> {
        parse_pages(&self.output())
    }
}

pub fn parse_pages(bytes: &[u8]) -> Vec<Page> {
    OggSync::new(Cursor::new(bytes)).read_all().unwrap()
}

pub struct FakeCodec {
    observed: Rc<RefCell<Observed>>,
    lookahead: i32,
    packet_len: usize,
    fail_encode_at: Option<usize>,
    reject_lsb_depth: bool,
}

impl Drop for FakeCodec {
    fn drop(&mut self) {
        self.observed.borrow_mut().codecs_dropped += 1;
    }
}

impl Codec for FakeCodec {
    fn encode(&mut self, pcm: &[i16], frame_size: usize, out: &mut [u8]) -> Result<usize> {
        assert!(pcm.len() >= frame_size, "codec handed a short frame");
        let mut observed = self.observed.borrow_mut();
        observed.encodes += 1;
        if self.fail_encode_at == Some(observed.encodes) {
            return Err(Error::Codec {
                code: -3,
                message: "internal error".to_string(),
            });
        }
        let n = self.packet_len.min(out.len());
        out[..n].fill(observed.encodes as u8);
        Ok(n)
    }

    fn lookahead(&mut self) -> Result<i32> {
        Ok(self.lookahead)
    }

    fn set_bitrate(&mut self, bitrate: i32) -> Result<()> {
        self.observed.borrow_mut().bitrate = Some(bitrate);
        Ok(())
    }

    fn set_vbr_constraint(&mut self, constrained: bool) -> Result<()> {
        self.observed.borrow_mut().vbr_constraint = Some(constrained);
        Ok(())
    }

    fn set_complexity(&mut self, _complexity: i32) -> Result<()> {
        Ok(())
    }

    fn set_lsb_depth(&mut self, depth: i32) -> Result<()> {
        if self.reject_lsb_depth {
            return Err(Error::Codec {
                code: -5,
                message: "unimplemented".to_string(),
            });
        }
        self.observed.borrow_mut().lsb_depth = Some(depth);
        Ok(())
    }

    fn version(&self) -> String {
        "fake-opus 0.0".to_string()
    }
}

pub struct FakeContainer {
    observed: Rc<RefCell<Observed>>,
    stream: OggStream,
}

impl Container for FakeContainer {
    fn packet_in(&mut self, packet: &Packet) -> Result<()> {
        Ok(self.stream.packet_in(packet)?)
    }

    fn flush(&mut self, fill: usize) -> Option<Page> {
        self.stream.flush(fill)
    }

    fn page_out(&mut self, fill: usize) -> Option<Page> {
        self.stream.page_out(fill)
    }

    fn clear(&mut self) {
        self.observed.borrow_mut().containers_cleared += 1;
        self.stream.clear();
    }
}

pub struct FakeSink {
    observed: Rc<RefCell<Observed>>,
    short_write_at: Option<usize>,
}

impl Sink for FakeSink {
    fn append(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut observed = self.observed.borrow_mut();
        observed.appends += 1;
        let n = if self.short_write_at == Some(observed.appends) {
            bytes.len() / 2
        } else {
            bytes.len()
        };
        observed.output.extend_from_slice(&bytes[..n]);
        Ok(n)
    }

    fn close(&mut self) -> io::Result<()> {
        self.observed.borrow_mut().sinks_closed += 1;
        Ok(())
    }
}

impl Backend for FakeBackend {
    type Codec = FakeCodec;
    type Container = FakeContainer;
    type Sink = FakeSink;

    fn open_sink(&mut self, path: &Path) -> Result<FakeSink> {
        if self.fail_open {
            return Err(Error::Io(io::Error::new(io::ErrorKind::PermissionDenied, "denied")));
        }
        let mut observed = self.observed.borrow_mut();
        observed.opened.push(path.display().to_string());
        observed.output.clear();
        observed.appends = 0;
        Ok(FakeSink {
            observed: self.observed.clone(),
            short_write_at: self.short_write_at,
        })
    }

    fn create_codec(&mut self, _sample_rate: u32, _channels: u8, _application: Application) -> Result<FakeCodec> {
        if let Some(code) = self.fail_create {
            return Err(Error::Codec {
                code,
                message: "create failed".to_string(),
            });
        }
        Ok(FakeCodec {
            observed: self.observed.clone(),
            lookahead: self.lookahead,
            packet_len: self.packet_len,
            fail_encode_at: self.fail_encode_at,
            reject_lsb_depth: self.reject_lsb_depth,
        })
    }

    fn new_container(&mut self, serial: u32) -> Result<FakeContainer> {
        if self.fail_container {
            return Err(Error::Container("stream init failed".to_string()));
        }
        Ok(FakeContainer {
            observed: self.observed.clone(),
            stream: OggStream::new(serial),
        })
    }
}

/// Decoder that turns every packet into `samples` copies of its first byte.
pub struct FakeDecoder {
    pub samples: usize,
    pub fail_at: Option<usize>,
    pub decoded: usize,
}

impl PacketDecoder for FakeDecoder {
    fn decode(&mut self, packet: &[u8]) -> Result<Vec<i16>> {
        self.decoded += 1;
        if self.fail_at == Some(self.decoded) {
            return Err(Error::Codec {
                code: -4,
                message: "corrupted stream".to_string(),
            });
        }
        Ok(vec![packet.first().copied().unwrap_or(0) as i16; self.samples])
    }
}

/// Codec double for encoder-level tests.
pub fn codec(backend: &mut FakeBackend) -> FakeCodec {
    backend.create_codec(16000, 1, Application::Audio).unwrap()
}

/// `samples` mono samples of silence as PCM bytes.
pub fn silence(samples: usize) -> Vec<u8> {
    vec![0u8; samples * 2]
}
