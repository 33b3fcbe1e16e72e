//! Element colors and their byte encoding

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::bitstream::{BitReader, BitWriter};
use crate::error::{MapError, Result};

bitflags::bitflags! {
    /// Which channels an element color carries
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ColorType: u8 {
        /// RGB tint (3 channels)
        const TEINT = 0b001;
        /// Alpha (1 channel)
        const ALPHA = 0b010;
        /// Two stops instead of one (doubles the channels)
        const GRADIENT = 0b100;
    }
}

impl ColorType {
    /// Number of float channels a color of this type carries (0, 1, 2, 3, 4, 6 or 8)
    pub const fn channel_count(self) -> usize {
        let base = if self.contains(Self::TEINT) { 3 } else { 0 }
            + if self.contains(Self::ALPHA) { 1 } else { 0 };
        if self.contains(Self::GRADIENT) { base * 2 } else { base }
    }
}

impl Serialize for ColorType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ColorType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(ColorType::from_bits_truncate(bits))
    }
}

/// Encode a channel as a signed byte centered on 0.5.
///
/// Rounded to nearest so decoded channels re-encode to the same byte. Values
/// in [0, 1] saturate at the byte range (1.0 is 127, 0.0 is -128); values
/// outside it wrap.
#[inline]
pub fn encode_channel(value: f32) -> i8 {
    let scaled = ((value - 0.5) * 255.0).round() as i32;
    if (0.0..=1.0).contains(&value) {
        scaled.clamp(i32::from(i8::MIN), i32::from(i8::MAX)) as i8
    } else {
        scaled as i8
    }
}

/// Decode a channel byte produced by [`encode_channel`]
#[inline]
pub fn decode_channel(byte: i8) -> f32 {
    f32::from(byte) / 255.0 + 0.5
}

/// Encoded identity of a color: equal keys share one color table entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ColorKey {
    kind: u8,
    bytes: SmallVec<[i8; 8]>,
}

/// Color vector of an element
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementColor {
    kind: ColorType,
    channels: Vec<f32>,
}

impl ElementColor {
    /// Build a color, checking the channel count against the type
    pub fn new(kind: ColorType, channels: Vec<f32>) -> Result<Self> {
        if channels.len() != kind.channel_count() {
            return Err(MapError::out_of_range(
                "color channel count",
                channels.len() as i64,
            ));
        }
        Ok(Self { kind, channels })
    }

    /// Untinted color with no channels
    pub fn none() -> Self {
        Self::default()
    }

    /// Opaque white, used when a color table index dangles
    pub fn opaque_white() -> Self {
        Self {
            kind: ColorType::TEINT | ColorType::ALPHA,
            channels: vec![1.0; 4],
        }
    }

    pub fn kind(&self) -> ColorType {
        self.kind
    }

    pub fn channels(&self) -> &[f32] {
        &self.channels
    }

    pub(crate) fn key(&self) -> ColorKey {
        ColorKey {
            kind: self.kind.bits(),
            bytes: self.channels.iter().map(|&c| encode_channel(c)).collect(),
        }
    }

    /// Read a color table entry: three type bits, then one byte per channel
    pub(crate) fn read(reader: &mut BitReader) -> Result<Self> {
        let mut kind = ColorType::empty();
        kind.set(ColorType::TEINT, reader.read_bool()?);
        kind.set(ColorType::ALPHA, reader.read_bool()?);
        kind.set(ColorType::GRADIENT, reader.read_bool()?);

        let bytes = reader.read_bytes(kind.channel_count())?;
        let channels = bytes.iter().map(|&b| decode_channel(b as i8)).collect();
        Ok(Self { kind, channels })
    }

    pub(crate) fn write(&self, writer: &mut BitWriter) {
        writer.write_bool(self.kind.contains(ColorType::TEINT));
        writer.write_bool(self.kind.contains(ColorType::ALPHA));
        writer.write_bool(self.kind.contains(ColorType::GRADIENT));
        for byte in self.key().bytes {
            writer.write_i8(byte);
        }
    }
}
