//! isomap-inspect - Inspect isometric map partitions
//!
//! # Commands
//!
//! - `isomap-inspect gfx` - Decode a graphics partition and summarize it
//! - `isomap-inspect topo` - Decode a topology partition, optionally query a cell
//! - `isomap-inspect verify` - Decode, re-encode and decode again, then compare
//! - `isomap-inspect batch` - Decode every `X_Y` partition file in a directory
//!
//! # Usage
//!
//! ```bash
//! # Summarize a graphics partition, placing elements with an asset list
//! isomap-inspect gfx maps/12/3_-1 --x 3 --y -1 --elements elements.json
//!
//! # Query one cell of a topology partition
//! isomap-inspect topo maps/12/topology/3_-1 --cell 60 -5 --json
//!
//! # Load a whole directory in parallel
//! isomap-inspect batch maps/12/topology --kind topo --config isomap.toml
//! ```
//!
//! # Config (isomap.toml)
//!
//! ```toml
//! byte_order = "little"
//! compress = false
//! coalesce_rectangles = false
//! ```

mod batch;
mod common;
mod gfx;
mod topo;
mod verify;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// isomap-inspect - Inspect isometric map partitions
#[derive(Parser)]
#[command(name = "isomap-inspect")]
#[command(about = "Inspect, verify and batch-load isometric map partitions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a graphics partition and summarize it
    Gfx(gfx::GfxArgs),

    /// Decode a topology partition and optionally query a cell
    Topo(topo::TopoArgs),

    /// Check that a partition survives decode -> encode -> decode
    Verify(verify::VerifyArgs),

    /// Decode every partition file in a directory in parallel
    Batch(batch::BatchArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Gfx(args) => gfx::execute(args),
        Commands::Topo(args) => topo::execute(args),
        Commands::Verify(args) => verify::execute(args),
        Commands::Batch(args) => batch::execute(args),
    }
}
