//! Nibble-packed topology: up to 8 elevations and 2 costs
//!
//! ```text
//! costs  i8 × 2
//! zs     i16 × 8
//! cells  u8 × 162, two cells per byte (even cell in the low nibble)
//!        nibble bits 0-2 elevation index, bit 3 cost index
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

const COSTS: usize = 2;
const LEVELS: usize = 8;
const PACKED_LEN: usize = CELL_COUNT / 2;
const BODY_LEN: usize = COSTS + LEVELS * 2 + PACKED_LEN;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTopologyB")]
pub struct TopologyB {
    pub header: TopologyHeader,
    costs: [i8; COSTS],
    zs: [i16; LEVELS],
    cells: Vec<u8>,
}

#[derive(Deserialize)]
struct RawTopologyB {
    header: TopologyHeader,
    costs: [i8; COSTS],
    zs: [i16; LEVELS],
    cells: Vec<u8>,
}

impl TryFrom<RawTopologyB> for TopologyB {
    type Error = MapError;

    fn try_from(raw: RawTopologyB) -> Result<Self> {
        check_table_len(TopologyKind::B, "cell", PACKED_LEN, raw.cells.len())?;
        Ok(Self {
            header: raw.header,
            costs: raw.costs,
            zs: raw.zs,
            cells: raw.cells,
        })
    }
}

impl TopologyB {
    /// Build from one `(z, cost)` pair per cell in row-major order
    pub fn from_cells(header: TopologyHeader, cells: &[(i16, i8)]) -> Result<Self> {
        if cells.len() != CELL_COUNT {
            return Err(MapError::out_of_range("B cell count", cells.len() as i64));
        }
        let mut zs = DedupTable::new();
        let mut costs = DedupTable::new();
        let mut packed = vec![0u8; PACKED_LEN];
        for (index, &(z, cost)) in cells.iter().enumerate() {
            let z_index = zs.insert(z, z) as u8;
            let cost_index = costs.insert(cost, cost) as u8;
            let nibble = (z_index & 0x7) | ((cost_index & 0x1) << 3);
            packed[index / 2] |= if index % 2 == 0 { nibble } else { nibble << 4 };
        }
        Ok(Self {
            header,
            costs: costs.to_array("B cost count")?,
            zs: zs.to_array("B elevation count")?,
            cells: packed,
        })
    }

    fn nibble(&self, index: usize) -> u8 {
        let byte = self.cells[index / 2];
        if index % 2 == 0 { byte & 0xF } else { byte >> 4 }
    }

    pub(crate) fn decode_body(header: TopologyHeader, reader: &mut BitReader) -> Result<Self> {
        ensure_table(TopologyKind::B, reader, BODY_LEN)?;
        let mut costs = [0i8; COSTS];
        for cost in &mut costs {
            *cost = reader.read_i8()?;
        }
        let mut zs = [0i16; LEVELS];
        for z in &mut zs {
            *z = reader.read_i16()?;
        }
        let cells = reader.read_bytes(PACKED_LEN)?.to_vec();
        Ok(Self {
            header,
            costs,
            zs,
            cells,
        })
    }

    pub(crate) fn encode_body(&self, writer: &mut BitWriter) -> Result<()> {
        for &cost in &self.costs {
            writer.write_i8(cost);
        }
        for &z in &self.zs {
            writer.write_i16(z);
        }
        writer.write_bytes(&self.cells);
        Ok(())
    }
}

impl CellTopology for TopologyB {
    fn kind(&self) -> TopologyKind {
        TopologyKind::B
    }

    fn header(&self) -> &TopologyHeader {
        &self.header
    }

    fn cell_entries(&self, local_x: usize, local_y: usize) -> CellStack {
        let nibble = self.nibble(cell_index(local_x, local_y));
        let z = self.zs[usize::from(nibble & 0x7)];
        let cost = self.costs[usize::from(nibble >> 3)];
        smallvec![CellEntry::from_cost(z, cost, 0)]
    }
}
