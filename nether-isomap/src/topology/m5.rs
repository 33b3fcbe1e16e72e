//! Sparse topology with a side table of heights
//!
//! ```text
//! count    u16
//! words    u32 × count, sorted by (y, x)
//!          bits 0-4 x, 5-9 y, 10-19 elevation offset, 20 move-block,
//!          21 view-block, 22-29 cost (i8)
//! heights  u8 × count
//! ```

use serde::{Deserialize, Serialize};

use super::{
    CellEntry, CellStack, CellTopology, TopologyHeader, TopologyKind, check_table_len,
    ensure_table, sparse,
};
use crate::bitstream::{BitReader, BitWriter};
use crate::error::{MapError, Result};

const MOVE_BLOCK: u32 = 1 << 20;
const VIEW_BLOCK: u32 = 1 << 21;
const COST_SHIFT: u32 = 22;

/// One stacked entry handed to [`TopologyM5::from_cells`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct M5Cell {
    /// Local cell coordinates
    pub x: u8,
    pub y: u8,
    pub z: Option<i16>,
    pub cost: i8,
    pub height: u8,
    pub move_block: bool,
    pub view_block: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTopologyM5")]
pub struct TopologyM5 {
    pub header: TopologyHeader,
    words: Vec<u32>,
    heights: Vec<u8>,
}

#[derive(Deserialize)]
struct RawTopologyM5 {
    header: TopologyHeader,
    words: Vec<u32>,
    heights: Vec<u8>,
}

impl TryFrom<RawTopologyM5> for TopologyM5 {
    type Error = MapError;

    fn try_from(raw: RawTopologyM5) -> Result<Self> {
        sparse::validate(TopologyKind::M5, &raw.words)?;
        check_table_len(TopologyKind::M5, "height", raw.words.len(), raw.heights.len())?;
        Ok(Self {
            header: raw.header,
            words: raw.words,
            heights: raw.heights,
        })
    }
}

impl TopologyM5 {
    /// Build from entries in any order; entries sharing a cell keep their order
    pub fn from_cells(header: TopologyHeader, mut cells: Vec<M5Cell>) -> Result<Self> {
        if cells.len() > usize::from(u16::MAX) {
            return Err(MapError::out_of_range("M5 entry count", cells.len() as i64));
        }
        sparse::sort_entries(&mut cells, |cell| (cell.x, cell.y));

        let mut words = Vec::with_capacity(cells.len());
        for cell in &cells {
            let offset = header.elevation_offset(cell.z)?;
            let mut word = sparse::pack_cell(TopologyKind::M5, cell.x, cell.y, offset)?;
            if cell.move_block {
                word |= MOVE_BLOCK;
            }
            if cell.view_block {
                word |= VIEW_BLOCK;
            }
            words.push(word | (u32::from(cell.cost as u8) << COST_SHIFT));
        }
        Ok(Self {
            header,
            words,
            heights: cells.iter().map(|cell| cell.height).collect(),
        })
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub(crate) fn decode_body(header: TopologyHeader, reader: &mut BitReader) -> Result<Self> {
        let count = usize::from(reader.read_u16()?);
        ensure_table(TopologyKind::M5, reader, count * 5)?;

        let words = (0..count)
            .map(|_| reader.read_u32())
            .collect::<Result<Vec<_>>>()?;
        sparse::validate(TopologyKind::M5, &words)?;
        let heights = reader.read_bytes(count)?.to_vec();
        Ok(Self {
            header,
            words,
            heights,
        })
    }

    pub(crate) fn encode_body(&self, writer: &mut BitWriter) -> Result<()> {
        let count = u16::try_from(self.words.len())
            .map_err(|_| MapError::out_of_range("M5 entry count", self.words.len() as i64))?;
        writer.write_u16(count);
        for &word in &self.words {
            writer.write_u32(word);
        }
        writer.write_bytes(&self.heights);
        Ok(())
    }
}

impl CellTopology for TopologyM5 {
    fn kind(&self) -> TopologyKind {
        TopologyKind::M5
    }

    fn header(&self) -> &TopologyHeader {
        &self.header
    }

    fn cell_entries(&self, local_x: usize, local_y: usize) -> CellStack {
        sparse::find(&self.words, local_x as u32, local_y as u32)
            .map(|index| {
                let word = self.words[index];
                CellEntry {
                    z: self.header.elevation(sparse::word_offset(word)),
                    cost: (word >> COST_SHIFT) as u8 as i8,
                    hollow: word & MOVE_BLOCK == 0,
                    can_view_through: word & VIEW_BLOCK == 0,
                    height: self.heights[index],
                    murfin: 0,
                }
            })
            .collect()
    }
}
