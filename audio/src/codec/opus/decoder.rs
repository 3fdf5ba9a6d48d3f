//! Opus decoder.

use std::ptr;

use super::ffi::{self, OpusDecoder as OpusDecoderHandle};

/// Max frame size: 120ms at 48kHz.
const MAX_FRAME_SAMPLES: i32 = 5760;

/// Opus decoder error.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    /// Failed to create decoder.
    #[error("opus: decoder create failed: {message}")]
    CreateFailed { code: i32, message: String },
    /// Decoder is closed.
    #[error("opus: decoder is closed")]
    Closed,
    /// Decoding failed.
    #[error("opus: decode failed: {message}")]
    DecodeFailed { code: i32, message: String },
}

impl DecoderError {
    /// Returns the libopus error code, if any.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::CreateFailed { code, .. } | Self::DecodeFailed { code, .. } => Some(*code),
            Self::Closed => None,
        }
    }
}

/// Opus decoder.
pub struct Decoder {
    channels: i32,
    handle: *mut OpusDecoderHandle,
}

// Safety: The decoder handle is not shared across threads.
unsafe impl Send for Decoder {}

impl Drop for Decoder {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ffi::opus_decoder_destroy(self.handle) };
            self.handle = ptr::null_mut();
        }
    }
}

impl Decoder {
    /// Creates a new Opus decoder.
    ///
    /// # Parameters
    /// - `sample_rate`: Sample rate to decode at (8000, 12000, 16000, 24000, or 48000)
    /// - `channels`: Number of channels (1 or 2)
    pub fn new(sample_rate: i32, channels: i32) -> Result<Self, DecoderError> {
        let mut error: i32 = 0;
        let handle = unsafe { ffi::opus_decoder_create(sample_rate, channels, &mut error) };

        if handle.is_null() || error != ffi::OPUS_OK {
            return Err(DecoderError::CreateFailed {
                code: error,
                message: ffi::error_string(error),
            });
        }

        Ok(Self { channels, handle })
    }

    /// Decodes one Opus packet into interleaved i16 samples.
    ///
    /// An empty packet asks libopus for packet loss concealment.
    pub fn decode(&mut self, packet: &[u8]) -> Result<Vec<i16>, DecoderError> {
        if self.handle.is_null() {
            return Err(DecoderError::Closed);
        }

        let max_samples = MAX_FRAME_SAMPLES * self.channels;
        let mut buf = vec![0i16; max_samples as usize];

        let (data_ptr, data_len) = if packet.is_empty() {
            (ptr::null(), 0)
        } else {
            (packet.as_ptr(), packet.len() as i32)
        };

        let n = unsafe {
            ffi::opus_decode(
                self.handle,
                data_ptr,
                data_len,
                buf.as_mut_ptr(),
                MAX_FRAME_SAMPLES,
                0, // decode_fec
            )
        };

        if n < 0 {
            return Err(DecoderError::DecodeFailed {
                code: n,
                message: ffi::error_string(n),
            });
        }

        buf.truncate(n as usize * self.channels as usize);
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::opus::{Application, Encoder};

    #[test]
    fn test_decoder_create() {
        let dec = Decoder::new(16000, 1).unwrap();
        assert!(!dec.handle.is_null());
    }

    #[test]
    fn test_decoder_create_invalid() {
        let err = Decoder::new(16000, 3).err().unwrap();
        assert!(err.code().is_some());
    }

    #[test]
    fn test_encode_decode_frame_size() {
        let mut encoder = Encoder::new(16000, 1, Application::Audio).unwrap();
        let mut decoder = Decoder::new(16000, 1).unwrap();

        let packet = encoder.encode(&vec![0i16; 960], 960).unwrap();
        let pcm = decoder.decode(&packet).unwrap();
        assert_eq!(pcm.len(), 960);
    }

    #[test]
    fn test_decode_garbage() {
        let mut decoder = Decoder::new(16000, 1).unwrap();
        // TOC code 3 with a zero frame count is malformed.
        let result = decoder.decode(&[0xFF, 0x00]);
        assert!(matches!(result, Err(DecoderError::DecodeFailed { .. })));
    }
}
