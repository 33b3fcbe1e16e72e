//! Byte-per-cell topology: up to 16 elevations, 4 costs and 4 wall metadata bytes
//!
//! ```text
//! costs    i8 × 4
//! murfins  u8 × 4
//! zs       i16 × 16
//! cells    u8 × 324: bits 0-3 elevation index, 4-5 cost index, 6-7 murfin index
//! ```

use serde::{Deserialize, Serialize};
use smallvec::smallvec;

use super::{
    CELL_COUNT, CellEntry, CellStack, CellTopology, TopologyHeader, TopologyKind, cell_index,
    check_table_len, ensure_table,
};
use crate::bitstream::{BitReader, BitWriter};
use crate::error::{MapError, Result};
use crate::tables::DedupTable;

const COSTS: usize = 4;
const MURFINS: usize = 4;
const LEVELS: usize = 16;
const BODY_LEN: usize = COSTS + MURFINS + LEVELS * 2 + CELL_COUNT;

/// Properties of one cell handed to [`TopologyBi::from_cells`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BiCell {
    pub z: i16,
    pub cost: i8,
    pub murfin: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTopologyBi")]
pub struct TopologyBi {
    pub header: TopologyHeader,
    costs: [i8; COSTS],
    murfins: [u8; MURFINS],
    zs: [i16; LEVELS],
    cells: Vec<u8>,
}

#[derive(Deserialize)]
struct RawTopologyBi {
    header: TopologyHeader,
    costs: [i8; COSTS],
    murfins: [u8; MURFINS],
    zs: [i16; LEVELS],
    cells: Vec<u8>,
}

impl TryFrom<RawTopologyBi> for TopologyBi {
    type Error = MapError;

    fn try_from(raw: RawTopologyBi) -> Result<Self> {
        check_table_len(TopologyKind::Bi, "cell", CELL_COUNT, raw.cells.len())?;
        Ok(Self {
            header: raw.header,
            costs: raw.costs,
            murfins: raw.murfins,
            zs: raw.zs,
            cells: raw.cells,
        })
    }
}

impl TopologyBi {
    /// Build from one cell per position in row-major order
    pub fn from_cells(header: TopologyHeader, cells: &[BiCell]) -> Result<Self> {
        if cells.len() != CELL_COUNT {
            return Err(MapError::out_of_range("Bi cell count", cells.len() as i64));
        }
        let mut zs = DedupTable::new();
        let mut costs = DedupTable::new();
        let mut murfins = DedupTable::new();
        let packed = cells
            .iter()
            .map(|cell| {
                let z = zs.insert(cell.z, cell.z) as u8 & 0xF;
                let cost = costs.insert(cell.cost, cell.cost) as u8 & 0x3;
                let murfin = murfins.insert(cell.murfin, cell.murfin) as u8 & 0x3;
                z | (cost << 4) | (murfin << 6)
            })
            .collect();
        Ok(Self {
            header,
            costs: costs.to_array("Bi cost count")?,
            murfins: murfins.to_array("Bi murfin count")?,
            zs: zs.to_array("Bi elevation count")?,
            cells: packed,
        })
    }

    pub(crate) fn decode_body(header: TopologyHeader, reader: &mut BitReader) -> Result<Self> {
        ensure_table(TopologyKind::Bi, reader, BODY_LEN)?;
        let mut costs = [0i8; COSTS];
        for cost in &mut costs {
            *cost = reader.read_i8()?;
        }
        let mut murfins = [0u8; MURFINS];
        murfins.copy_from_slice(reader.read_bytes(MURFINS)?);
        let mut zs = [0i16; LEVELS];
        for z in &mut zs {
            *z = reader.read_i16()?;
        }
        let cells = reader.read_bytes(CELL_COUNT)?.to_vec();
        Ok(Self {
            header,
            costs,
            murfins,
            zs,
            cells,
        })
    }

    pub(crate) fn encode_body(&self, writer: &mut BitWriter) -> Result<()> {
        for &cost in &self.costs {
            writer.write_i8(cost);
        }
        writer.write_bytes(&self.murfins);
        for &z in &self.zs {
            writer.write_i16(z);
        }
        writer.write_bytes(&self.cells);
        Ok(())
    }
}

impl CellTopology for TopologyBi {
    fn kind(&self) -> TopologyKind {
        TopologyKind::Bi
    }

    fn header(&self) -> &TopologyHeader {
        &self.header
    }

    fn cell_entries(&self, local_x: usize, local_y: usize) -> CellStack {
        let byte = self.cells[cell_index(local_x, local_y)];
        let z = self.zs[usize::from(byte & 0xF)];
        let cost = self.costs[usize::from((byte >> 4) & 0x3)];
        let murfin = self.murfins[usize::from(byte >> 6)];
        smallvec![CellEntry::from_cost(z, cost, murfin)]
    }
}
