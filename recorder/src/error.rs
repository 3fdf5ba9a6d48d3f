//! Error types for the recorder.

use std::io;

use opusrec_audio::codec::ogg::StreamError;
use opusrec_audio::codec::opus::{DecoderError, EncoderError};

/// Result type alias for the recorder.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for recorder operations.
///
/// Everything except `InvalidState` aborts the session it came from.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Sink open, write or close failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The sink accepted fewer page bytes than were handed to it.
    #[error("short write: wrote {written} of {expected} page bytes")]
    ShortWrite { expected: usize, written: usize },

    /// Codec creation, control or encode failure with the codec's reason code.
    #[error("codec error {code}: {message}")]
    Codec { code: i32, message: String },

    /// Container stream failure.
    #[error("container error: {0}")]
    Container(String),

    /// A fixed-size buffer cannot hold the data.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    Capacity { needed: usize, available: usize },

    /// A PCM frame the encoder cannot take.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// Operation not valid in the session's current state.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Invalid configuration.
    #[error("invalid config: {0}")]
    Config(String),
}

impl Error {
    /// Returns true if the error leaves the session untouched.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::InvalidState(_))
    }
}

/// Reason code reported when libopus itself gave none.
const OPUS_INVALID_STATE: i32 = -6;

impl From<EncoderError> for Error {
    fn from(e: EncoderError) -> Self {
        Error::Codec {
            code: e.code().unwrap_or(OPUS_INVALID_STATE),
            message: e.to_string(),
        }
    }
}

impl From<DecoderError> for Error {
    fn from(e: DecoderError) -> Self {
        Error::Codec {
            code: e.code().unwrap_or(OPUS_INVALID_STATE),
            message: e.to_string(),
        }
    }
}

impl From<StreamError> for Error {
    fn from(e: StreamError) -> Self {
        Error::Container(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_error_keeps_code() {
        let err: Error = EncoderError::EncodeFailed {
            code: -3,
            message: "internal error".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Codec { code: -3, .. }));
    }

    #[test]
    fn test_closed_encoder_maps_to_invalid_state_code() {
        let err: Error = EncoderError::Closed.into();
        assert!(matches!(err, Error::Codec { code: OPUS_INVALID_STATE, .. }));
    }

    #[test]
    fn test_error_display() {
        let err = Error::ShortWrite { expected: 100, written: 50 };
        assert_eq!(err.to_string(), "short write: wrote 50 of 100 page bytes");

        let err = Error::Capacity { needed: 19, available: 10 };
        assert_eq!(err.to_string(), "buffer too small: need 19 bytes, have 10");
    }

    #[test]
    fn test_recoverable() {
        assert!(Error::InvalidState("closed").is_recoverable());
        assert!(!Error::Container("x".into()).is_recoverable());
    }
}
