//! Audio codec plumbing for the Ogg Opus recorder.
//!
//! - `codec::opus`: libopus encoder/decoder bindings
//! - `codec::ogg`: Ogg bitstream packets, pages and stream state
//!
//! # Example
//!
//! ```rust
//! use opusrec_audio::codec::ogg::{OggStream, Packet};
//!
//! let mut stream = OggStream::new(0x1234);
//! stream.packet_in(&Packet::new(b"OpusHead".to_vec(), 0, 0).with_bos()).unwrap();
//! let page = stream.flush(255 * 255).expect("header page");
//! assert!(page.is_bos());
//! ```

pub mod codec;
