//! Opus audio codec.
//!
//! Encoding and decoding via libopus FFI (RFC 6716).
//!
//! # Example
//!
//! ```ignore
//! use opusrec_audio::codec::opus::{Application, Encoder};
//!
//! let mut encoder = Encoder::new(16000, 1, Application::Audio)?;
//! encoder.set_bitrate(16000)?;
//! encoder.set_vbr_constraint(true)?;
//!
//! let pcm = vec![0i16; 960]; // 60ms at 16kHz
//! let mut packet = vec![0u8; 383];
//! let n = encoder.encode_to(&pcm, 960, &mut packet)?;
//! ```

mod decoder;
mod encoder;
mod ffi;

pub use decoder::*;
pub use encoder::*;

/// Returns the libopus version string, e.g. `"libopus 1.4"`.
pub fn version_string() -> String {
    ffi::version_string()
}
