//! `gfx` command: decode and summarize a graphics partition

use anyhow::{Context, Result};
use clap::Args;
use nether_isomap::gfx::PartitionBounds;
use nether_isomap::GfxPartition;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::common;

#[derive(Args)]
pub struct GfxArgs {
    /// Partition file
    pub input: PathBuf,

    /// Region x coordinate of the partition
    #[arg(long, allow_hyphen_values = true)]
    pub x: i32,

    /// Region y coordinate of the partition
    #[arg(long, allow_hyphen_values = true)]
    pub y: i32,

    /// JSON array of element asset records used to place elements
    #[arg(long)]
    pub elements: Option<PathBuf>,

    /// Codec config (isomap.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// What a graphics partition holds
#[derive(Debug, Serialize)]
pub struct GfxSummary {
    pub x: i32,
    pub y: i32,
    pub elements: usize,
    pub cells: usize,
    pub occluders: usize,
    pub groups: usize,
    pub bounds: PartitionBounds,
}

impl GfxSummary {
    pub fn of(partition: &GfxPartition) -> Self {
        let elements = partition.elements();
        let cells: BTreeSet<_> = elements.iter().map(|e| (e.cell_x, e.cell_y)).collect();
        let groups: BTreeSet<_> = elements.iter().map(|e| e.group.group_id).collect();
        Self {
            x: partition.x,
            y: partition.y,
            elements: elements.len(),
            cells: cells.len(),
            occluders: elements.iter().filter(|e| e.occluder).count(),
            groups: groups.len(),
            bounds: *partition.bounds(),
        }
    }
}

pub fn execute(args: GfxArgs) -> Result<()> {
    let config = common::load_config(args.config.as_deref())?;
    let registry = common::load_registry(args.elements.as_deref())?;
    let bytes = common::read_file(&args.input)?;

    let partition = GfxPartition::from_bytes(args.x, args.y, &bytes, &registry, &config)
        .with_context(|| format!("Failed to decode {}", args.input.display()))?;
    let summary = GfxSummary::of(&partition);

    if args.json {
        return common::print_json(&summary);
    }

    let b = &summary.bounds;
    println!("Graphics partition ({}, {})", summary.x, summary.y);
    println!("  elements:  {}", summary.elements);
    println!("  cells:     {}", summary.cells);
    println!("  occluders: {}", summary.occluders);
    println!("  groups:    {}", summary.groups);
    println!(
        "  cells x {}..={}, y {}..={}, z {}..={}",
        b.min_x, b.max_x, b.min_y, b.max_y, b.min_z, b.max_z
    );
    println!(
        "  pixels left {} top {} right {} bottom {}",
        b.left, b.top, b.right, b.bottom
    );
    Ok(())
}
