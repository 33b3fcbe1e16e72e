//! Parallel decoding of many partitions
//!
//! Each partition decodes from its own bytes into its own object graph, so a
//! batch fans out over rayon's pool. A partition that fails to decode is
//! recorded and skipped; its siblings are unaffected.

use rayon::prelude::*;
use std::sync::Arc;

use crate::config::CodecConfig;
use crate::error::MapError;
use crate::gfx::{ElementRegistry, GfxMap, GfxPartition};
use crate::topology::{CellTopology, TopologyMap, TopologyPartition};

/// Encoded partition bytes with the coordinates the container declared for them
#[derive(Debug, Clone, Copy)]
pub struct PartitionSource<'a> {
    pub x: i32,
    pub y: i32,
    pub bytes: &'a [u8],
}

impl<'a> PartitionSource<'a> {
    pub fn new(x: i32, y: i32, bytes: &'a [u8]) -> Self {
        Self { x, y, bytes }
    }
}

/// A partition that could not be decoded
#[derive(Debug)]
pub struct PartitionFailure {
    pub x: i32,
    pub y: i32,
    pub error: MapError,
}

/// Decoded partitions and failures, both in source order
#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub decoded: Vec<T>,
    pub failures: Vec<PartitionFailure>,
}

impl<T> BatchOutcome<T> {
    fn collect(sources: &[PartitionSource], results: Vec<Result<T, MapError>>) -> Self {
        let mut outcome = Self {
            decoded: Vec::with_capacity(results.len()),
            failures: Vec::new(),
        };
        for (source, result) in sources.iter().zip(results) {
            match result {
                Ok(partition) => outcome.decoded.push(partition),
                Err(error) => {
                    tracing::warn!(x = source.x, y = source.y, %error, "partition failed to decode");
                    outcome.failures.push(PartitionFailure {
                        x: source.x,
                        y: source.y,
                        error,
                    });
                }
            }
        }
        tracing::debug!(
            decoded = outcome.decoded.len(),
            failed = outcome.failures.len(),
            "batch decoded"
        );
        outcome
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl BatchOutcome<GfxPartition> {
    /// Gather the decoded partitions into a map sharing `registry`
    pub fn into_map(self, registry: Arc<ElementRegistry>) -> GfxMap {
        let mut map = GfxMap::new(registry);
        for partition in self.decoded {
            map.insert_partition(partition);
        }
        map
    }
}

impl BatchOutcome<TopologyPartition> {
    pub fn into_map(self) -> TopologyMap {
        self.decoded.into_iter().collect()
    }
}

/// Decode graphics partitions in parallel
pub fn decode_gfx_batch(
    sources: &[PartitionSource],
    registry: &ElementRegistry,
    config: &CodecConfig,
) -> BatchOutcome<GfxPartition> {
    let results: Vec<_> = sources
        .par_iter()
        .map(|source| GfxPartition::from_bytes(source.x, source.y, source.bytes, registry, config))
        .collect();
    BatchOutcome::collect(sources, results)
}

/// Decode topology partitions in parallel.
///
/// Topology headers carry their own coordinates; a header that disagrees with
/// the declared coordinates is logged and kept.
pub fn decode_topology_batch(
    sources: &[PartitionSource],
    config: &CodecConfig,
) -> BatchOutcome<TopologyPartition> {
    let results: Vec<_> = sources
        .par_iter()
        .map(|source| -> Result<TopologyPartition, MapError> {
            let partition = TopologyPartition::from_bytes(source.bytes, config)?;
            let header = partition.header();
            if (i32::from(header.x), i32::from(header.y)) != (source.x, source.y) {
                tracing::warn!(
                    declared_x = source.x,
                    declared_y = source.y,
                    header_x = header.x,
                    header_y = header.y,
                    "topology header coordinates differ from declared"
                );
            }
            Ok(partition)
        })
        .collect();
    BatchOutcome::collect(sources, results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{Element, ElementData};
    use crate::topology::{TopologyA, TopologyHeader};

    #[test]
    fn test_gfx_batch_isolates_failures() {
        let registry = ElementRegistry::from_entries([ElementData::placeholder(1)]);
        let config = CodecConfig::default();
        let good = GfxPartition::from_elements(0, 0, vec![Element::new(1, 2, 3, 0)], &registry)
            .to_bytes(&config)
            .unwrap();
        let sources = [
            PartitionSource::new(0, 0, &good),
            PartitionSource::new(1, 0, &good[..7]),
            PartitionSource::new(2, 0, &good),
        ];

        let outcome = decode_gfx_batch(&sources, &registry, &config);
        assert_eq!(outcome.decoded.len(), 2);
        assert_eq!(outcome.decoded[1].x, 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!((outcome.failures[0].x, outcome.failures[0].y), (1, 0));
        assert!(matches!(outcome.failures[0].error, MapError::OutOfData { .. }));
        assert!(!outcome.is_complete());

        let map = outcome.into_map(Arc::new(registry));
        assert_eq!(map.len(), 2);
    }

    /// Partition whose single rectangle lands one cell past `i32::MAX`
    fn overflowing_partition() -> Vec<u8> {
        let mut writer = crate::bitstream::BitWriter::new();
        writer.write_bytes(&[0; 20]);
        writer.write_u16(0);
        writer.write_u16(0);
        writer.write_i32(i32::MAX);
        writer.write_i32(0);
        writer.write_u16(1);
        writer.write_bytes(&[1, 1, 0, 0]);
        writer.write_u8(0);
        writer.finish().unwrap()
    }

    #[test]
    fn test_gfx_batch_isolates_coordinate_overflow() {
        let registry = ElementRegistry::new();
        let config = CodecConfig::default();
        let good = GfxPartition::from_elements(0, 0, vec![Element::new(1, 2, 3, 0)], &registry)
            .to_bytes(&config)
            .unwrap();
        let bad = overflowing_partition();
        let sources = [
            PartitionSource::new(0, 0, &good),
            PartitionSource::new(5, 5, &bad),
        ];

        let outcome = decode_gfx_batch(&sources, &registry, &config);
        assert_eq!(outcome.decoded.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!((outcome.failures[0].x, outcome.failures[0].y), (5, 5));
        assert!(matches!(
            outcome.failures[0].error,
            MapError::ValueOutOfRange { field: "cell coordinate", .. }
        ));
    }

    #[test]
    fn test_topology_batch_keeps_mismatched_header() {
        let config = CodecConfig::default();
        let bytes = TopologyPartition::A(TopologyA::new(TopologyHeader::new(4, 4, 0), 1))
            .to_bytes(&config)
            .unwrap();
        let sources = [PartitionSource::new(4, 4, &bytes), PartitionSource::new(9, 9, &bytes)];

        let outcome = decode_topology_batch(&sources, &config);
        assert!(outcome.is_complete());
        assert_eq!(outcome.decoded.len(), 2);
        // Both land on the header's coordinates
        assert_eq!(outcome.into_map().len(), 1);
    }
}
