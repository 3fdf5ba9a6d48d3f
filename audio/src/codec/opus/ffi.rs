//! Raw libopus declarations (opus.h, opus_defines.h).

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_uchar};

/// Opaque `OpusEncoder`.
pub enum OpusEncoder {}

/// Opaque `OpusDecoder`.
pub enum OpusDecoder {}

pub const OPUS_OK: c_int = 0;
pub const OPUS_BAD_ARG: c_int = -1;

/// `OPUS_APPLICATION_*` values for `opus_encoder_create`.
pub mod application {
    use std::os::raw::c_int;

    pub const VOIP: c_int = 2048;
    pub const AUDIO: c_int = 2049;
    pub const RESTRICTED_LOWDELAY: c_int = 2051;
}

/// Encoder CTL request codes.
pub mod ctl {
    use std::os::raw::c_int;

    pub const SET_BITRATE: c_int = 4002;
    pub const SET_VBR: c_int = 4006;
    pub const SET_COMPLEXITY: c_int = 4010;
    pub const SET_VBR_CONSTRAINT: c_int = 4020;
    pub const GET_LOOKAHEAD: c_int = 4027;
    pub const SET_LSB_DEPTH: c_int = 4036;
}

unsafe extern "C" {
    pub fn opus_strerror(error: c_int) -> *const c_char;
    pub fn opus_get_version_string() -> *const c_char;

    pub fn opus_encoder_create(fs: i32, channels: c_int, application: c_int, error: *mut c_int) -> *mut OpusEncoder;
    pub fn opus_encoder_destroy(st: *mut OpusEncoder);
    pub fn opus_encoder_ctl(st: *mut OpusEncoder, request: c_int, ...) -> c_int;
    pub fn opus_encode(
        st: *mut OpusEncoder,
        pcm: *const i16,
        frame_size: c_int,
        data: *mut c_uchar,
        max_data_bytes: i32,
    ) -> i32;

    pub fn opus_decoder_create(fs: i32, channels: c_int, error: *mut c_int) -> *mut OpusDecoder;
    pub fn opus_decoder_destroy(st: *mut OpusDecoder);
    pub fn opus_decode(
        st: *mut OpusDecoder,
        data: *const c_uchar,
        len: i32,
        pcm: *mut i16,
        frame_size: c_int,
        decode_fec: c_int,
    ) -> c_int;
}

fn static_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // Safety: libopus hands out pointers to static NUL-terminated strings.
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

/// Human-readable message for a libopus return code.
pub fn error_string(code: c_int) -> String {
    static_str(unsafe { opus_strerror(code) }).unwrap_or_else(|| format!("opus error {}", code))
}

/// libopus version, e.g. `"libopus 1.4"`.
pub fn version_string() -> String {
    static_str(unsafe { opus_get_version_string() }).unwrap_or_else(|| "libopus".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_string() {
        assert_eq!(error_string(OPUS_OK), "success");
        assert_eq!(error_string(OPUS_BAD_ARG), "invalid argument");
        assert_eq!(error_string(-6), "invalid state");
    }

    #[test]
    fn test_version_string() {
        assert!(version_string().starts_with("libopus"));
    }
}
