//! Opus encoder.

use std::ptr;

use super::ffi::{self, OpusEncoder as OpusEncoderHandle};

/// Opus application type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Application {
    /// Best quality for voice signals.
    VoIP,
    /// Best quality for non-voice signals.
    Audio,
    /// Minimum possible coding delay.
    RestrictedLowdelay,
}

impl Application {
    fn to_ffi(self) -> i32 {
        match self {
            Self::VoIP => ffi::application::VOIP,
            Self::Audio => ffi::application::AUDIO,
            Self::RestrictedLowdelay => ffi::application::RESTRICTED_LOWDELAY,
        }
    }
}

/// Opus encoder error.
///
/// Every libopus failure keeps the raw (negative) return code.
#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    /// Failed to create encoder.
    #[error("opus: encoder create failed: {message}")]
    CreateFailed { code: i32, message: String },
    /// Encoder is closed.
    #[error("opus: encoder is closed")]
    Closed,
    /// Encoding failed.
    #[error("opus: encode failed: {message}")]
    EncodeFailed { code: i32, message: String },
    /// Failed to set or query an option.
    #[error("opus: {option} failed: {message}")]
    CtlFailed {
        option: &'static str,
        code: i32,
        message: String,
    },
}

impl EncoderError {
    /// Returns the libopus error code, if any.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::CreateFailed { code, .. }
            | Self::EncodeFailed { code, .. }
            | Self::CtlFailed { code, .. } => Some(*code),
            Self::Closed => None,
        }
    }
}

/// Opus encoder.
pub struct Encoder {
    channels: i32,
    handle: *mut OpusEncoderHandle,
}

// Safety: The encoder handle is not shared across threads.
unsafe impl Send for Encoder {}

impl Drop for Encoder {
    fn drop(&mut self) {
        self.close();
    }
}

impl Encoder {
    /// Creates a new Opus encoder.
    ///
    /// # Parameters
    /// - `sample_rate`: Sample rate (8000, 12000, 16000, 24000, or 48000)
    /// - `channels`: Number of channels (1 or 2)
    /// - `application`: Intended application type
    pub fn new(sample_rate: i32, channels: i32, application: Application) -> Result<Self, EncoderError> {
        let mut error: i32 = 0;
        let handle = unsafe {
            ffi::opus_encoder_create(sample_rate, channels, application.to_ffi(), &mut error)
        };

        if handle.is_null() || error != ffi::OPUS_OK {
            return Err(EncoderError::CreateFailed {
                code: error,
                message: ffi::error_string(error),
            });
        }

        Ok(Self { channels, handle })
    }

    /// Releases the libopus state. Further calls fail with `Closed`.
    pub fn close(&mut self) {
        if !self.handle.is_null() {
            unsafe { ffi::opus_encoder_destroy(self.handle) };
            self.handle = ptr::null_mut();
        }
    }

    /// Encodes `frame_size` samples per channel into `buf`.
    /// Returns number of bytes written.
    ///
    /// `pcm` must hold at least `frame_size * channels` samples.
    pub fn encode_to(&mut self, pcm: &[i16], frame_size: i32, buf: &mut [u8]) -> Result<usize, EncoderError> {
        if self.handle.is_null() {
            return Err(EncoderError::Closed);
        }

        let needed = frame_size.max(0) as usize * self.channels as usize;
        if pcm.len() < needed {
            return Err(EncoderError::EncodeFailed {
                code: ffi::OPUS_BAD_ARG,
                message: format!("pcm holds {} samples, need {}", pcm.len(), needed),
            });
        }

        let n = unsafe {
            ffi::opus_encode(
                self.handle,
                pcm.as_ptr(),
                frame_size,
                buf.as_mut_ptr(),
                buf.len().min(i32::MAX as usize) as i32,
            )
        };

        if n < 0 {
            return Err(EncoderError::EncodeFailed {
                code: n,
                message: ffi::error_string(n),
            });
        }

        Ok(n as usize)
    }

    /// Encodes PCM samples into a freshly allocated packet.
    pub fn encode(&mut self, pcm: &[i16], frame_size: i32) -> Result<Vec<u8>, EncoderError> {
        let mut buf = vec![0u8; 4000]; // Max Opus packet size
        let n = self.encode_to(pcm, frame_size, &mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    fn ctl_set(&mut self, option: &'static str, request: i32, value: i32) -> Result<(), EncoderError> {
        if self.handle.is_null() {
            return Err(EncoderError::Closed);
        }

        let ret = unsafe { ffi::opus_encoder_ctl(self.handle, request, value) };
        if ret != ffi::OPUS_OK {
            return Err(EncoderError::CtlFailed {
                option,
                code: ret,
                message: ffi::error_string(ret),
            });
        }
        Ok(())
    }

    /// Sets the target bitrate in bits per second.
    pub fn set_bitrate(&mut self, bitrate: i32) -> Result<(), EncoderError> {
        self.ctl_set("set bitrate", ffi::ctl::SET_BITRATE, bitrate)
    }

    /// Enables or disables variable bitrate.
    pub fn set_vbr(&mut self, enabled: bool) -> Result<(), EncoderError> {
        self.ctl_set("set vbr", ffi::ctl::SET_VBR, enabled as i32)
    }

    /// Enables or disables constrained VBR.
    pub fn set_vbr_constraint(&mut self, constrained: bool) -> Result<(), EncoderError> {
        self.ctl_set(
            "set vbr constraint",
            ffi::ctl::SET_VBR_CONSTRAINT,
            constrained as i32,
        )
    }

    /// Sets the encoder complexity (0-10).
    pub fn set_complexity(&mut self, complexity: i32) -> Result<(), EncoderError> {
        self.ctl_set("set complexity", ffi::ctl::SET_COMPLEXITY, complexity)
    }

    /// Declares the bit depth of the input signal (8-24).
    pub fn set_lsb_depth(&mut self, depth: i32) -> Result<(), EncoderError> {
        self.ctl_set("set lsb depth", ffi::ctl::SET_LSB_DEPTH, depth)
    }

    /// Returns the encoder lookahead in samples at the encoder's sample rate.
    pub fn lookahead(&mut self) -> Result<i32, EncoderError> {
        if self.handle.is_null() {
            return Err(EncoderError::Closed);
        }

        let mut lookahead: i32 = 0;
        let ret = unsafe {
            ffi::opus_encoder_ctl(
                self.handle,
                ffi::ctl::GET_LOOKAHEAD,
                &mut lookahead as *mut i32,
            )
        };
        if ret != ffi::OPUS_OK {
            return Err(EncoderError::CtlFailed {
                option: "get lookahead",
                code: ret,
                message: ffi::error_string(ret),
            });
        }
        Ok(lookahead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_create() {
        let enc = Encoder::new(16000, 1, Application::Audio).unwrap();
        assert!(!enc.handle.is_null());
    }

    #[test]
    fn test_encoder_create_invalid_rate() {
        let err = Encoder::new(44100, 1, Application::Audio).err().unwrap();
        assert!(matches!(err, EncoderError::CreateFailed { .. }));
        assert!(err.code().unwrap() < 0);
    }

    #[test]
    fn test_encode_60ms_frame() {
        let mut encoder = Encoder::new(16000, 1, Application::Audio).unwrap();
        let pcm = vec![0i16; 960];
        let mut buf = vec![0u8; 383];
        let n = encoder.encode_to(&pcm, 960, &mut buf).unwrap();
        assert!(n > 0 && n <= buf.len());
    }

    #[test]
    fn test_encode_short_pcm_rejected() {
        let mut encoder = Encoder::new(16000, 1, Application::Audio).unwrap();
        let pcm = vec![0i16; 100];
        assert!(encoder.encode(&pcm, 960).is_err());
    }

    #[test]
    fn test_encode_after_close() {
        let mut encoder = Encoder::new(16000, 1, Application::Audio).unwrap();
        encoder.close();
        encoder.close();
        let err = encoder.encode(&[0i16; 320], 320).unwrap_err();
        assert!(matches!(err, EncoderError::Closed));
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_ctls() {
        let mut encoder = Encoder::new(16000, 1, Application::Audio).unwrap();
        encoder.set_bitrate(16000).unwrap();
        encoder.set_vbr(true).unwrap();
        encoder.set_vbr_constraint(true).unwrap();
        encoder.set_complexity(5).unwrap();
        encoder.set_lsb_depth(16).unwrap();
    }

    #[test]
    fn test_lookahead_positive() {
        let mut encoder = Encoder::new(16000, 1, Application::Audio).unwrap();
        let lookahead = encoder.lookahead().unwrap();
        assert!(lookahead > 0);
    }

    #[test]
    fn test_encode_non_silence() {
        let mut encoder = Encoder::new(16000, 1, Application::Audio).unwrap();
        let frame_size = 960;
        let pcm: Vec<i16> = (0..frame_size)
            .map(|i| ((i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 16000.0).sin() * 10000.0) as i16)
            .collect();

        let packet = encoder.encode(&pcm, frame_size as i32).unwrap();
        assert!(!packet.is_empty());
    }

    #[test]
    fn test_encoder_error_display() {
        let err = EncoderError::CtlFailed {
            option: "set bitrate",
            code: -1,
            message: "invalid argument".to_string(),
        };
        assert_eq!(format!("{}", err), "opus: set bitrate failed: invalid argument");
        assert!(format!("{}", EncoderError::Closed).contains("closed"));
    }
}
