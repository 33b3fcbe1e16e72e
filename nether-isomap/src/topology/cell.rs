//! Cell query records

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{COST_BLOCKED, TopologyKind};

/// Path-finding properties of one entry on a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellPathData {
    pub x: i32,
    pub y: i32,
    pub z: i16,
    pub cost: i8,
    /// The entry does not block movement
    pub hollow: bool,
    pub height: u8,
    /// Wall metadata byte
    pub murfin: u8,
}

/// Line-of-sight properties of one entry on a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellVisibilityData {
    pub x: i32,
    pub y: i32,
    pub z: i16,
    pub height: u8,
    pub can_view_through: bool,
}

/// Decoded properties of one entry on a cell, before it is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CellEntry {
    pub z: i16,
    pub cost: i8,
    pub hollow: bool,
    pub can_view_through: bool,
    pub height: u8,
    pub murfin: u8,
}

/// Entries stacked on one cell; almost always one or two
pub type CellStack = SmallVec<[CellEntry; 4]>;

impl CellEntry {
    /// Entry of a cost-only variant: walkable unless blocked, never hides the view
    pub(crate) fn from_cost(z: i16, cost: i8, murfin: u8) -> Self {
        Self {
            z,
            cost,
            hollow: cost != COST_BLOCKED,
            can_view_through: true,
            height: 0,
            murfin,
        }
    }

    pub fn path_data(&self, x: i32, y: i32) -> CellPathData {
        CellPathData {
            x,
            y,
            z: self.z,
            cost: self.cost,
            hollow: self.hollow,
            height: self.height,
            murfin: self.murfin,
        }
    }

    pub fn visibility_data(&self, x: i32, y: i32) -> CellVisibilityData {
        CellVisibilityData {
            x,
            y,
            z: self.z,
            height: self.height,
            can_view_through: self.can_view_through,
        }
    }
}

/// Copy records into `pool[offset..]`, dropping what does not fit
pub(crate) fn fill_pool<T>(
    pool: &mut [T],
    offset: usize,
    records: impl ExactSizeIterator<Item = T>,
    kind: TopologyKind,
) -> usize {
    let total = records.len();
    let Some(slots) = pool.get_mut(offset..) else {
        if total > 0 {
            tracing::debug!(?kind, offset, total, "pool offset past end, records dropped");
        }
        return 0;
    };

    let mut written = 0;
    for (slot, record) in slots.iter_mut().zip(records) {
        *slot = record;
        written += 1;
    }
    if written < total {
        tracing::debug!(?kind, written, dropped = total - written, "cell pool full");
    }
    written
}
