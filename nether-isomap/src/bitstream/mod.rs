//! Endian-aware bit stream reader and writer
//!
//! Every partition codec in this crate sits on these two types. Byte-aligned
//! fields go through `byteorder`; sub-byte fields (booleans, table indices) are
//! packed most-significant bit first into shared bytes.
//!
//! # Bit sharing
//!
//! ```text
//! read_bool  read_bool  read_u16      read_bool
//! ┌─────────────────┐ ┌──────┬──────┐ ┌─────────────────┐
//! │ b7 b6 . . . . . │ │  lo  │  hi  │ │ b7 . . . . . . .│
//! └─────────────────┘ └──────┴──────┘ └─────────────────┘
//!   shared byte         aligned read     fresh byte
//! ```
//!
//! The reader keeps sharing a bit byte only while the cursor sits directly
//! behind it; the writer keeps accumulating only while no aligned write has
//! happened. The two rules produce the same layout.

mod reader;
mod writer;


pub use reader::BitReader;
pub use writer::BitWriter;

use flate2::read::ZlibDecoder;
use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::error::{MapError, Result};

/// Byte order of multi-byte fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// Minimum number of bits needed to store `value` unsigned (at least 1)
#[inline]
pub const fn min_bits_unsigned(value: u32) -> u32 {
    let bits = 32 - value.leading_zeros();
    if bits == 0 { 1 } else { bits }
}

/// Minimum number of bits needed to store `value` in two's complement
#[inline]
pub const fn min_bits_signed(value: i32) -> u32 {
    let magnitude = (if value < 0 { !value } else { value }) as u32;
    let bits = 32 - magnitude.leading_zeros();
    bits + 1
}

/// Inflate a zlib-wrapped partition produced by [`BitWriter::compress`]
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

pub(crate) fn check_width(bits: u32) -> Result<()> {
    if (1..=32).contains(&bits) {
        Ok(())
    } else {
        Err(MapError::InvalidBitWidth(bits))
    }
}
