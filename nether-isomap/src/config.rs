//! Codec configuration (isomap.toml)
//!
//! Controls how partitions are laid out on the wire. Every field has a default
//! matching existing map data, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::bitstream::Endian;
use crate::error::Result;

/// Codec configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CodecConfig {
    /// Byte order of multi-byte fields (default: little)
    #[serde(default)]
    pub byte_order: Endian,
    /// Wrap encoded partitions in zlib, and inflate before decoding (default: false)
    #[serde(default)]
    pub compress: bool,
    /// Merge horizontal runs of occupied cells into one rectangle when encoding
    /// graphics partitions (default: false, one rectangle per cell)
    #[serde(default)]
    pub coalesce_rectangles: bool,
}

impl CodecConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
