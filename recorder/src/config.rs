//! Recorder configuration.
//!
//! Stream parameters that define the file format are constants; encoder
//! tuning lives in [`RecorderConfig`], loadable from YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Input and coding sample rate in Hz.
pub const SAMPLE_RATE: u32 = 16000;
/// Channel count.
pub const CHANNELS: u8 = 1;
/// Nominal frame size in samples per channel (60ms at 16kHz).
pub const FRAME_SIZE: usize = 960;
/// Target bitrate in bits per second.
pub const BITRATE: i32 = 16000;
/// Spare bytes guaranteed after the OpusTags content.
pub const COMMENT_PADDING: usize = 512;
/// Largest allowed granule gap between flushed pages.
pub const MAX_PAGE_DELAY: i64 = 0;
/// Granule clock of Ogg Opus, independent of the coding rate.
pub const GRANULE_RATE: u32 = 48000;
/// Upper bound on one encoded packet.
pub const MAX_PACKET_BYTES: usize = (1275 * 3 + 7) / 10;
/// Fill threshold passed to the container when paging.
pub const PAGE_FILL: usize = 255 * 255;
/// Bit depth of the PCM input.
pub const LSB_DEPTH: i32 = 16;

/// Encoder tuning for a recording session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Target bitrate in bits per second.
    pub bitrate: i32,

    /// Constrained VBR.
    pub constrained_vbr: bool,

    /// Encoder complexity (0-10), libopus default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<i32>,

    /// Input bit depth, clamped to 8..=24 when applied.
    pub lsb_depth: i32,

    /// Spare bytes reserved in the OpusTags packet.
    pub comment_padding: usize,

    /// Max granule gap (48 kHz units) between flushed pages.
    pub max_page_delay: i64,

    /// OpusTags vendor string, the codec version when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            bitrate: BITRATE,
            constrained_vbr: true,
            complexity: None,
            lsb_depth: LSB_DEPTH,
            comment_padding: COMMENT_PADDING,
            max_page_delay: MAX_PAGE_DELAY,
            vendor: None,
        }
    }
}

impl RecorderConfig {
    /// Loads and validates a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(data).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the config as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(500..=512_000).contains(&self.bitrate) {
            return Err(Error::Config(format!(
                "bitrate {} out of range 500..=512000",
                self.bitrate
            )));
        }
        if let Some(c) = self.complexity {
            if !(0..=10).contains(&c) {
                return Err(Error::Config(format!("complexity {} out of range 0..=10", c)));
            }
        }
        if self.max_page_delay < 0 {
            return Err(Error::Config("max_page_delay must not be negative".to_string()));
        }
        Ok(())
    }

    /// LSB depth as handed to the codec.
    pub fn effective_lsb_depth(&self) -> i32 {
        self.lsb_depth.clamp(8, 24)
    }
}
