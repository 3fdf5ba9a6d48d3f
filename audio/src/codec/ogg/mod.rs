//! Ogg container format.
//!
//! This module implements the Ogg bitstream format as defined in RFC 3533:
//! packets are laced into pages by [`OggStream`], pages are read back by
//! [`OggSync`].

mod crc;
mod packet;
mod page;
mod stream;
mod sync;

pub use crc::crc32;
pub use packet::*;
pub use page::*;
pub use stream::*;
pub use sync::*;
