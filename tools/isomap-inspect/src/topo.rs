//! `topo` command: decode a topology partition and query cells

use anyhow::{Context, Result};
use clap::Args;
use nether_isomap::topology::{
    CellPathData, CellVisibilityData, TopologyHeader, TopologyKind,
};
use nether_isomap::{CellTopology, CHUNK_SIZE, TopologyPartition};
use serde::Serialize;
use std::path::PathBuf;

use crate::common;

/// Records fetched per cell query
const POOL_SIZE: usize = 32;

#[derive(Args)]
pub struct TopoArgs {
    /// Partition file
    pub input: PathBuf,

    /// Absolute cell to query
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_hyphen_values = true)]
    pub cell: Option<Vec<i32>>,

    /// Codec config (isomap.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Records stored on one cell
#[derive(Debug, Serialize)]
pub struct CellReport {
    pub x: i32,
    pub y: i32,
    pub path: Vec<CellPathData>,
    pub visibility: Vec<CellVisibilityData>,
}

impl CellReport {
    pub fn query(partition: &TopologyPartition, x: i32, y: i32) -> Self {
        let mut path = vec![CellPathData::default(); POOL_SIZE];
        let mut visibility = vec![CellVisibilityData::default(); POOL_SIZE];
        let path_count = partition.path_data(x, y, &mut path, 0);
        let visibility_count = partition.visibility_data(x, y, &mut visibility, 0);
        path.truncate(path_count);
        visibility.truncate(visibility_count);
        Self {
            x,
            y,
            path,
            visibility,
        }
    }
}

/// What a topology partition holds
#[derive(Debug, Serialize)]
pub struct TopoSummary {
    pub kind: TopologyKind,
    pub header: TopologyHeader,
    /// Absolute cell range covered, inclusive
    pub first_cell: (i32, i32),
    pub last_cell: (i32, i32),
    /// Footprint cells with at least one record
    pub occupied_cells: usize,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<CellReport>,
}

impl TopoSummary {
    pub fn of(partition: &TopologyPartition) -> Self {
        let header = *partition.header();
        let (ox, oy) = header.origin();
        let mut pool = vec![CellPathData::default(); POOL_SIZE];
        let (mut occupied_cells, mut records) = (0, 0);
        for y in oy..oy + CHUNK_SIZE {
            for x in ox..ox + CHUNK_SIZE {
                let count = partition.path_data(x, y, &mut pool, 0);
                if count > 0 {
                    occupied_cells += 1;
                    records += count;
                }
            }
        }
        Self {
            kind: partition.kind(),
            header,
            first_cell: (ox, oy),
            last_cell: (ox + CHUNK_SIZE - 1, oy + CHUNK_SIZE - 1),
            occupied_cells,
            records,
            cell: None,
        }
    }
}

pub fn execute(args: TopoArgs) -> Result<()> {
    let config = common::load_config(args.config.as_deref())?;
    let bytes = common::read_file(&args.input)?;
    let partition = TopologyPartition::from_bytes(&bytes, &config)
        .with_context(|| format!("Failed to decode {}", args.input.display()))?;

    let mut summary = TopoSummary::of(&partition);
    if let Some(&[x, y]) = args.cell.as_deref() {
        summary.cell = Some(CellReport::query(&partition, x, y));
    }

    if args.json {
        return common::print_json(&summary);
    }

    let h = &summary.header;
    println!("Topology partition {:?} ({}, {}) base z {}", summary.kind, h.x, h.y, h.z);
    println!(
        "  cells ({}, {}) ..= ({}, {})",
        summary.first_cell.0, summary.first_cell.1, summary.last_cell.0, summary.last_cell.1
    );
    println!("  occupied cells: {}", summary.occupied_cells);
    println!("  records:        {}", summary.records);

    if let Some(cell) = &summary.cell {
        println!("Cell ({}, {}): {} record(s)", cell.x, cell.y, cell.path.len());
        for (path, vis) in cell.path.iter().zip(&cell.visibility) {
            println!(
                "  z {:>5}  cost {:>4}  hollow {:<5}  height {:>3}  murfin {:#04x}  view {}",
                path.z, path.cost, path.hollow, path.height, path.murfin, vis.can_view_through
            );
        }
    }
    Ok(())
}
