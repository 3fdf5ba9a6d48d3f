//! Audio codec implementations.
//!
//! - `opus`: Opus audio codec (RFC 6716)
//! - `ogg`: Ogg container format (RFC 3533)

pub mod ogg;
pub mod opus;
