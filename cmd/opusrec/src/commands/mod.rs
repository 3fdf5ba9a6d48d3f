//! CLI commands module.

mod config;
mod normalize;
mod record;
mod util;

pub use config::ConfigCommand;
pub use normalize::NormalizeCommand;
pub use record::RecordCommand;

pub(crate) use util::*;
