//! Dense word-per-cell topology
//!
//! ```text
//! words  u16 × 324, row-major
//!        bits 0-9 elevation offset, 10 move-block, 11 view-block, 12-15 cost (signed)
//! ```

use serde::{Deserialize, Serialize};
use smallvec::smallvec;

use super::{
    CELL_COUNT, CellEntry, CellStack, CellTopology, MAX_ELEVATION_OFFSET, TopologyHeader,
    TopologyKind, cell_index, check_table_len, ensure_table,
};
use crate::bitstream::{BitReader, BitWriter};
use crate::error::{MapError, Result};

const MOVE_BLOCK: u16 = 1 << 10;
const VIEW_BLOCK: u16 = 1 << 11;
const COST_SHIFT: u16 = 12;

/// Properties of one cell handed to [`TopologyM3::from_cells`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct M3Cell {
    /// `None` when the cell has no elevation data
    pub z: Option<i16>,
    /// Four-bit signed cost, -8..=7
    pub cost: i8,
    pub move_block: bool,
    pub view_block: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTopologyM3")]
pub struct TopologyM3 {
    pub header: TopologyHeader,
    words: Vec<u16>,
}

#[derive(Deserialize)]
struct RawTopologyM3 {
    header: TopologyHeader,
    words: Vec<u16>,
}

impl TryFrom<RawTopologyM3> for TopologyM3 {
    type Error = MapError;

    fn try_from(raw: RawTopologyM3) -> Result<Self> {
        check_table_len(TopologyKind::M3, "word", CELL_COUNT, raw.words.len())?;
        Ok(Self {
            header: raw.header,
            words: raw.words,
        })
    }
}

impl TopologyM3 {
    /// Build from one cell per position in row-major order
    pub fn from_cells(header: TopologyHeader, cells: &[M3Cell]) -> Result<Self> {
        if cells.len() != CELL_COUNT {
            return Err(MapError::out_of_range("M3 cell count", cells.len() as i64));
        }
        let words = cells
            .iter()
            .map(|cell| {
                if !(-8..=7).contains(&cell.cost) {
                    return Err(MapError::out_of_range("M3 cost", cell.cost));
                }
                let mut word = header.elevation_offset(cell.z)?;
                if cell.move_block {
                    word |= MOVE_BLOCK;
                }
                if cell.view_block {
                    word |= VIEW_BLOCK;
                }
                Ok(word | (u16::from(cell.cost as u8 & 0xF) << COST_SHIFT))
            })
            .collect::<Result<_>>()?;
        Ok(Self { header, words })
    }

    pub(crate) fn decode_body(header: TopologyHeader, reader: &mut BitReader) -> Result<Self> {
        ensure_table(TopologyKind::M3, reader, CELL_COUNT * 2)?;
        let words = (0..CELL_COUNT)
            .map(|_| reader.read_u16())
            .collect::<Result<_>>()?;
        Ok(Self { header, words })
    }

    pub(crate) fn encode_body(&self, writer: &mut BitWriter) -> Result<()> {
        for &word in &self.words {
            writer.write_u16(word);
        }
        Ok(())
    }
}

impl CellTopology for TopologyM3 {
    fn kind(&self) -> TopologyKind {
        TopologyKind::M3
    }

    fn header(&self) -> &TopologyHeader {
        &self.header
    }

    fn cell_entries(&self, local_x: usize, local_y: usize) -> CellStack {
        let Some(&word) = self.words.get(cell_index(local_x, local_y)) else {
            return CellStack::new();
        };
        // Arithmetic shift sign-extends the top nibble
        let cost = ((word >> 8) as u8 as i8) >> 4;
        smallvec![CellEntry {
            z: self.header.elevation(word & MAX_ELEVATION_OFFSET),
            cost,
            hollow: word & MOVE_BLOCK == 0,
            can_view_through: word & VIEW_BLOCK == 0,
            height: 0,
            murfin: 0,
        }]
    }
}
