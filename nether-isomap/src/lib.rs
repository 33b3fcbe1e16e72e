//! Isometric map partition codec
//!
//! Decodes and encodes the two binary partition formats of an isometric map:
//!
//! - **Graphics partitions** ([`gfx`]): visual elements placed on map cells,
//!   with deduplicated group and color tables and a stacking order key.
//! - **Topology partitions** ([`topology`]): movement cost, elevation and line
//!   of sight per cell, in one of six dense or sparse encodings.
//!
//! Both formats sit on the endian-aware [`bitstream`] primitives. A map is cut
//! into regions of [`CHUNK_SIZE`] × [`CHUNK_SIZE`] cells; the caller supplies
//! each partition's bytes and region coordinates, and [`batch`] decodes many
//! of them in parallel.
//!
//! # Example
//!
//! ```
//! use nether_isomap::topology::{CellPathData, CellTopology, TopologyA, TopologyHeader, TopologyPartition};
//! use nether_isomap::CodecConfig;
//!
//! let partition = TopologyPartition::A(TopologyA::new(TopologyHeader::new(1, 0, 4), 2));
//! let bytes = partition.to_bytes(&CodecConfig::default()).unwrap();
//! let decoded = TopologyPartition::from_bytes(&bytes, &CodecConfig::default()).unwrap();
//!
//! let mut pool = [CellPathData::default(); 4];
//! assert_eq!(decoded.path_data(20, 3, &mut pool, 0), 1);
//! assert_eq!(pool[0].cost, 2);
//! ```

pub mod batch;
pub mod bitstream;
pub mod config;
pub mod error;
pub mod gfx;
pub mod topology;

mod tables;

pub use batch::{BatchOutcome, PartitionFailure, PartitionSource};
pub use bitstream::{BitReader, BitWriter, Endian};
pub use config::CodecConfig;
pub use error::{MapError, Result};
pub use gfx::{Element, ElementData, ElementRegistry, GfxMap, GfxPartition};
pub use topology::{CellTopology, TopologyMap, TopologyPartition};

/// Side length of a map region in cells
pub const CHUNK_SIZE: i32 = 18;
