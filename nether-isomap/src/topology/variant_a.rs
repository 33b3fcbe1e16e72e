//! Uniform topology: one cost for the whole region at the base elevation

use serde::{Deserialize, Serialize};
use smallvec::smallvec;

use super::{CellEntry, CellStack, CellTopology, TopologyHeader, TopologyKind};
use crate::bitstream::{BitReader, BitWriter};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyA {
    pub header: TopologyHeader,
    pub cost: i8,
}

impl TopologyA {
    pub fn new(header: TopologyHeader, cost: i8) -> Self {
        Self { header, cost }
    }

    pub(crate) fn decode_body(header: TopologyHeader, reader: &mut BitReader) -> Result<Self> {
        Ok(Self {
            header,
            cost: reader.read_i8()?,
        })
    }

    pub(crate) fn encode_body(&self, writer: &mut BitWriter) -> Result<()> {
        writer.write_i8(self.cost);
        Ok(())
    }
}

impl CellTopology for TopologyA {
    fn kind(&self) -> TopologyKind {
        TopologyKind::A
    }

    fn header(&self) -> &TopologyHeader {
        &self.header
    }

    fn cell_entries(&self, _local_x: usize, _local_y: usize) -> CellStack {
        smallvec![CellEntry::from_cost(self.header.z, self.cost, 0)]
    }
}
