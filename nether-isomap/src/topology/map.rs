//! Absolute-cell queries over many topology partitions

use std::collections::BTreeMap;

use super::{CellPathData, CellTopology, CellVisibilityData, TopologyPartition};
use crate::CHUNK_SIZE;

/// Topology partitions of one map, keyed by header coordinates
#[derive(Debug, Clone, Default)]
pub struct TopologyMap {
    partitions: BTreeMap<(i32, i32), TopologyPartition>,
}

impl TopologyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a partition, replacing any partition with the same header coordinates
    pub fn insert(&mut self, partition: TopologyPartition) -> Option<TopologyPartition> {
        let header = partition.header();
        let key = (i32::from(header.x), i32::from(header.y));
        self.partitions.insert(key, partition)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&TopologyPartition> {
        self.partitions.get(&(x, y))
    }

    /// Partition whose footprint contains an absolute cell
    pub fn partition_at(&self, cell_x: i32, cell_y: i32) -> Option<&TopologyPartition> {
        self.get(cell_x.div_euclid(CHUNK_SIZE), cell_y.div_euclid(CHUNK_SIZE))
    }

    pub fn partitions(&self) -> impl Iterator<Item = &TopologyPartition> {
        self.partitions.values()
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Path records of an absolute cell; 0 when no loaded partition covers it
    pub fn path_data(&self, x: i32, y: i32, pool: &mut [CellPathData], offset: usize) -> usize {
        self.partition_at(x, y)
            .map_or(0, |partition| partition.path_data(x, y, pool, offset))
    }

    pub fn visibility_data(
        &self,
        x: i32,
        y: i32,
        pool: &mut [CellVisibilityData],
        offset: usize,
    ) -> usize {
        self.partition_at(x, y)
            .map_or(0, |partition| partition.visibility_data(x, y, pool, offset))
    }
}

impl FromIterator<TopologyPartition> for TopologyMap {
    fn from_iter<I: IntoIterator<Item = TopologyPartition>>(iter: I) -> Self {
        let mut map = Self::new();
        for partition in iter {
            map.insert(partition);
        }
        map
    }
}
