//! Sparse topology with packed heights, flag nibbles and wall metadata
//!
//! ```text
//! count    u16
//! words    u32 × count, sorted by (y, x)
//!          bits 0-4 x, 5-9 y, 10-19 elevation offset, 20-27 cost (i8), 28-31 height
//! flags    u8 × ceil(count / 2), two entries per byte (even entry in the low nibble)
//!          bit 0 move-block, 1 view-block, 2 hollow override
//! murfins  u8 × count
//! ```

use serde::{Deserialize, Serialize};

use super::{
    CellEntry, CellStack, CellTopology, TopologyHeader, TopologyKind, check_table_len,
    ensure_table, sparse,
};
use crate::bitstream::{BitReader, BitWriter};
use crate::error::{MapError, Result};

const COST_SHIFT: u32 = 20;
const HEIGHT_SHIFT: u32 = 28;
const MAX_HEIGHT: u8 = 0xF;

const FLAG_MOVE_BLOCK: u8 = 0b001;
const FLAG_VIEW_BLOCK: u8 = 0b010;
const FLAG_HOLLOW: u8 = 0b100;

/// One stacked entry handed to [`TopologyM6::from_cells`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct M6Cell {
    /// Local cell coordinates
    pub x: u8,
    pub y: u8,
    pub z: Option<i16>,
    pub cost: i8,
    /// 0..=15
    pub height: u8,
    pub move_block: bool,
    pub view_block: bool,
    /// Walkable even when move-blocked
    pub hollow: bool,
    pub murfin: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTopologyM6")]
pub struct TopologyM6 {
    pub header: TopologyHeader,
    words: Vec<u32>,
    flags: Vec<u8>,
    murfins: Vec<u8>,
}

#[derive(Deserialize)]
struct RawTopologyM6 {
    header: TopologyHeader,
    words: Vec<u32>,
    flags: Vec<u8>,
    murfins: Vec<u8>,
}

impl TryFrom<RawTopologyM6> for TopologyM6 {
    type Error = MapError;

    fn try_from(raw: RawTopologyM6) -> Result<Self> {
        let count = raw.words.len();
        sparse::validate(TopologyKind::M6, &raw.words)?;
        check_table_len(TopologyKind::M6, "flag", count.div_ceil(2), raw.flags.len())?;
        check_table_len(TopologyKind::M6, "murfin", count, raw.murfins.len())?;
        Ok(Self {
            header: raw.header,
            words: raw.words,
            flags: raw.flags,
            murfins: raw.murfins,
        })
    }
}

impl TopologyM6 {
    /// Build from entries in any order; entries sharing a cell keep their order
    pub fn from_cells(header: TopologyHeader, mut cells: Vec<M6Cell>) -> Result<Self> {
        if cells.len() > usize::from(u16::MAX) {
            return Err(MapError::out_of_range("M6 entry count", cells.len() as i64));
        }
        sparse::sort_entries(&mut cells, |cell| (cell.x, cell.y));

        let mut words = Vec::with_capacity(cells.len());
        let mut flags = vec![0u8; cells.len().div_ceil(2)];
        for (index, cell) in cells.iter().enumerate() {
            if cell.height > MAX_HEIGHT {
                return Err(MapError::out_of_range("M6 height", cell.height));
            }
            let offset = header.elevation_offset(cell.z)?;
            let word = sparse::pack_cell(TopologyKind::M6, cell.x, cell.y, offset)?
                | (u32::from(cell.cost as u8) << COST_SHIFT)
                | (u32::from(cell.height) << HEIGHT_SHIFT);
            words.push(word);

            let mut nibble = 0;
            if cell.move_block {
                nibble |= FLAG_MOVE_BLOCK;
            }
            if cell.view_block {
                nibble |= FLAG_VIEW_BLOCK;
            }
            if cell.hollow {
                nibble |= FLAG_HOLLOW;
            }
            flags[index / 2] |= if index % 2 == 0 { nibble } else { nibble << 4 };
        }
        Ok(Self {
            header,
            words,
            flags,
            murfins: cells.iter().map(|cell| cell.murfin).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn flag_nibble(&self, index: usize) -> u8 {
        let byte = self.flags[index / 2];
        if index % 2 == 0 { byte & 0xF } else { byte >> 4 }
    }

    pub(crate) fn decode_body(header: TopologyHeader, reader: &mut BitReader) -> Result<Self> {
        let count = usize::from(reader.read_u16()?);
        let flag_len = count.div_ceil(2);
        ensure_table(TopologyKind::M6, reader, count * 4 + flag_len + count)?;

        let words = (0..count)
            .map(|_| reader.read_u32())
            .collect::<Result<Vec<_>>>()?;
        sparse::validate(TopologyKind::M6, &words)?;
        let flags = reader.read_bytes(flag_len)?.to_vec();
        let murfins = reader.read_bytes(count)?.to_vec();
        Ok(Self {
            header,
            words,
            flags,
            murfins,
        })
    }

    pub(crate) fn encode_body(&self, writer: &mut BitWriter) -> Result<()> {
        let count = u16::try_from(self.words.len())
            .map_err(|_| MapError::out_of_range("M6 entry count", self.words.len() as i64))?;
        writer.write_u16(count);
        for &word in &self.words {
            writer.write_u32(word);
        }
        writer.write_bytes(&self.flags);
        writer.write_bytes(&self.murfins);
        Ok(())
    }
}

impl CellTopology for TopologyM6 {
    fn kind(&self) -> TopologyKind {
        TopologyKind::M6
    }

    fn header(&self) -> &TopologyHeader {
        &self.header
    }

    fn cell_entries(&self, local_x: usize, local_y: usize) -> CellStack {
        sparse::find(&self.words, local_x as u32, local_y as u32)
            .map(|index| {
                let word = self.words[index];
                let flags = self.flag_nibble(index);
                CellEntry {
                    z: self.header.elevation(sparse::word_offset(word)),
                    cost: (word >> COST_SHIFT) as u8 as i8,
                    hollow: flags & FLAG_MOVE_BLOCK == 0 || flags & FLAG_HOLLOW != 0,
                    can_view_through: flags & FLAG_VIEW_BLOCK == 0,
                    height: (word >> HEIGHT_SHIFT) as u8,
                    murfin: self.murfins[index],
                }
            })
            .collect()
    }
}
