//! Topology partitions
//!
//! A topology partition describes movement cost, elevation and line of sight
//! for every cell of one 18×18 map region. Six encodings exist, from a single
//! cost byte up to sparse lists of packed cell words; the stored tag selects
//! one at decode time and queries go through [`CellTopology`].
//!
//! # Layout
//!
//! ```text
//! header  tag u8, x i16, y i16, z i16
//! body    variant specific, see the variant modules
//! ```

mod cell;
mod m3;
mod m5;
mod m6;
mod map;
mod sparse;
mod variant_a;
mod variant_b;
mod variant_bi;


pub use cell::{CellEntry, CellPathData, CellStack, CellVisibilityData};
pub use m3::{M3Cell, TopologyM3};
pub use m5::{M5Cell, TopologyM5};
pub use m6::{M6Cell, TopologyM6};
pub use map::TopologyMap;
pub use variant_a::TopologyA;
pub use variant_b::TopologyB;
pub use variant_bi::{BiCell, TopologyBi};

use serde::{Deserialize, Serialize};

use crate::CHUNK_SIZE;
use crate::bitstream::{self, BitReader, BitWriter};
use crate::config::CodecConfig;
use crate::error::{MapError, Result};

/// Movement cost marking a cell that cannot be walked through
pub const COST_BLOCKED: i8 = -1;

/// Cells per partition
pub const CELL_COUNT: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;

/// Largest elevation offset a packed cell word can hold
pub const MAX_ELEVATION_OFFSET: u16 = 0x3FF;

/// Stored type tag of a topology partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopologyKind {
    A,
    B,
    Bi,
    M3,
    M5,
    M6,
}

impl TopologyKind {
    pub const ALL: [TopologyKind; 6] = [Self::A, Self::B, Self::Bi, Self::M3, Self::M5, Self::M6];

    pub const fn tag(self) -> u8 {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::Bi => 2,
            Self::M3 => 3,
            Self::M5 => 4,
            Self::M6 => 5,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(tag))
            .copied()
            .ok_or(MapError::UnknownTopologyKind(tag))
    }
}

/// Region coordinates (in chunks) and base elevation of a topology partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TopologyHeader {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl TopologyHeader {
    pub fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Absolute cell at the region's top-left corner
    pub fn origin(&self) -> (i32, i32) {
        (i32::from(self.x) * CHUNK_SIZE, i32::from(self.y) * CHUNK_SIZE)
    }

    /// Local cell coordinates of an absolute cell, if it lies in the footprint
    pub fn local(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        let (ox, oy) = self.origin();
        let dx = i64::from(x) - i64::from(ox);
        let dy = i64::from(y) - i64::from(oy);
        let range = 0..i64::from(CHUNK_SIZE);
        (range.contains(&dx) && range.contains(&dy)).then_some((dx as usize, dy as usize))
    }

    /// Elevation encoded by a packed offset; 0 means "no data" and reports the base
    pub fn elevation(&self, offset: u16) -> i16 {
        if offset == 0 {
            self.z
        } else {
            self.z.wrapping_add(offset as i16 - 1)
        }
    }

    /// Packed offset for an elevation, `None` meaning "no data"
    pub fn elevation_offset(&self, z: Option<i16>) -> Result<u16> {
        let Some(z) = z else {
            return Ok(0);
        };
        let offset = i32::from(z) - i32::from(self.z) + 1;
        u16::try_from(offset)
            .ok()
            .filter(|&o| (1..=MAX_ELEVATION_OFFSET).contains(&o))
            .ok_or_else(|| MapError::out_of_range("elevation offset", offset))
    }

    fn read(reader: &mut BitReader) -> Result<Self> {
        Ok(Self {
            x: reader.read_i16()?,
            y: reader.read_i16()?,
            z: reader.read_i16()?,
        })
    }

    fn write(&self, writer: &mut BitWriter) {
        writer.write_i16(self.x);
        writer.write_i16(self.y);
        writer.write_i16(self.z);
    }
}

/// Cell lookup shared by every topology variant
pub trait CellTopology {
    fn kind(&self) -> TopologyKind;

    fn header(&self) -> &TopologyHeader;

    /// Entries stacked on a local cell, in stored order
    fn cell_entries(&self, local_x: usize, local_y: usize) -> CellStack;

    /// Write the path records of an absolute cell into `pool[offset..]`.
    ///
    /// Returns the number written: 0 outside the footprint, for an empty
    /// table, or when the pool has no room left.
    fn path_data(&self, x: i32, y: i32, pool: &mut [CellPathData], offset: usize) -> usize {
        let Some((lx, ly)) = self.header().local(x, y) else {
            return 0;
        };
        let entries = self.cell_entries(lx, ly);
        cell::fill_pool(
            pool,
            offset,
            entries.iter().map(|entry| entry.path_data(x, y)),
            self.kind(),
        )
    }

    /// Write the visibility records of an absolute cell into `pool[offset..]`
    fn visibility_data(
        &self,
        x: i32,
        y: i32,
        pool: &mut [CellVisibilityData],
        offset: usize,
    ) -> usize {
        let Some((lx, ly)) = self.header().local(x, y) else {
            return 0;
        };
        let entries = self.cell_entries(lx, ly);
        cell::fill_pool(
            pool,
            offset,
            entries.iter().map(|entry| entry.visibility_data(x, y)),
            self.kind(),
        )
    }
}

/// Row-major index of a local cell
#[inline]
pub(crate) fn cell_index(local_x: usize, local_y: usize) -> usize {
    local_y * CHUNK_SIZE as usize + local_x
}

/// Fail before reading a cell table the reader cannot supply in full
pub(crate) fn ensure_table(kind: TopologyKind, reader: &BitReader, expected: usize) -> Result<()> {
    let available = reader.remaining();
    if available < expected {
        return Err(MapError::TruncatedCellTable {
            kind,
            expected,
            available,
        });
    }
    Ok(())
}

/// Reject a deserialized table whose length disagrees with the layout
pub(crate) fn check_table_len(
    kind: TopologyKind,
    table: &'static str,
    expected: usize,
    actual: usize,
) -> Result<()> {
    if expected != actual {
        return Err(MapError::TableLengthMismatch {
            kind,
            table,
            expected,
            actual,
        });
    }
    Ok(())
}

/// A decoded topology partition of any variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TopologyPartition {
    A(TopologyA),
    B(TopologyB),
    Bi(TopologyBi),
    M3(TopologyM3),
    M5(TopologyM5),
    M6(TopologyM6),
}

macro_rules! dispatch {
    ($self:expr, $inner:ident => $body:expr) => {
        match $self {
            TopologyPartition::A($inner) => $body,
            TopologyPartition::B($inner) => $body,
            TopologyPartition::Bi($inner) => $body,
            TopologyPartition::M3($inner) => $body,
            TopologyPartition::M5($inner) => $body,
            TopologyPartition::M6($inner) => $body,
        }
    };
}

impl CellTopology for TopologyPartition {
    fn kind(&self) -> TopologyKind {
        dispatch!(self, t => t.kind())
    }

    fn header(&self) -> &TopologyHeader {
        dispatch!(self, t => t.header())
    }

    fn cell_entries(&self, local_x: usize, local_y: usize) -> CellStack {
        dispatch!(self, t => t.cell_entries(local_x, local_y))
    }
}

impl TopologyPartition {
    /// Decode a partition from raw (possibly zlib-wrapped) bytes
    pub fn from_bytes(bytes: &[u8], config: &CodecConfig) -> Result<Self> {
        let inflated;
        let data = if config.compress {
            inflated = bitstream::decompress(bytes)?;
            inflated.as_slice()
        } else {
            bytes
        };
        let mut reader = BitReader::with_order(data, config.byte_order);
        Self::decode(&mut reader)
    }

    pub fn to_bytes(&self, config: &CodecConfig) -> Result<Vec<u8>> {
        let mut writer = BitWriter::with_order(config.byte_order);
        if config.compress {
            writer.compress();
        }
        self.encode(&mut writer)?;
        writer.finish()
    }

    /// Read the tag and header, then the body of the tagged variant
    pub fn decode(reader: &mut BitReader) -> Result<Self> {
        let kind = TopologyKind::from_tag(reader.read_u8()?)?;
        let header = TopologyHeader::read(reader)?;
        let partition = match kind {
            TopologyKind::A => Self::A(TopologyA::decode_body(header, reader)?),
            TopologyKind::B => Self::B(TopologyB::decode_body(header, reader)?),
            TopologyKind::Bi => Self::Bi(TopologyBi::decode_body(header, reader)?),
            TopologyKind::M3 => Self::M3(TopologyM3::decode_body(header, reader)?),
            TopologyKind::M5 => Self::M5(TopologyM5::decode_body(header, reader)?),
            TopologyKind::M6 => Self::M6(TopologyM6::decode_body(header, reader)?),
        };
        tracing::debug!(
            ?kind,
            x = header.x,
            y = header.y,
            z = header.z,
            "decoded topology partition"
        );
        Ok(partition)
    }

    pub fn encode(&self, writer: &mut BitWriter) -> Result<()> {
        writer.write_u8(self.kind().tag());
        self.header().write(writer);
        dispatch!(self, t => t.encode_body(writer))
    }
}
