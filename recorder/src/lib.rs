//! Streaming Ogg Opus recorder.
//!
//! Packages 16 kHz mono PCM frames into a single-stream Ogg Opus file
//! (RFC 7845): the `OpusHead` and `OpusTags` packets go out on their own
//! pages, every PCM frame becomes one Opus packet, and the page scheduler
//! decides when pending packets are written as pages.
//!
//! # Example
//!
//! ```ignore
//! use opusrec_recorder::{FRAME_SIZE, RecorderConfig, Session};
//!
//! let mut session = Session::opus(RecorderConfig::default());
//! session.start("out.opus")?;
//! for frame in pcm.chunks(FRAME_SIZE * 2) {
//!     session.submit_frame(frame)?;
//! }
//! session.end()?;
//! ```

pub mod backend;
pub mod comment;
pub mod config;
pub mod error;
pub mod frame;
pub mod header;
pub mod scheduler;
pub mod session;
pub mod transcode;

#[cfg(test)]
mod testutil;

pub use backend::{Backend, Codec, Container, FileSink, OpusBackend, Sink};
pub use comment::{CommentBuffer, CommentHeader};
pub use config::*;
pub use error::{Error, Result};
pub use frame::FrameEncoder;
pub use header::OpusHeader;
pub use scheduler::PageFlushScheduler;
pub use session::{Session, State};
pub use transcode::{PacketDecoder, normalize, read_full};
