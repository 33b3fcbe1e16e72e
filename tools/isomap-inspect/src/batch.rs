//! `batch` command: decode every partition file in a directory

use anyhow::Result;
use clap::Args;
use nether_isomap::batch::{self, PartitionSource};
use nether_isomap::CodecConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::common::{self, PartitionKind};

#[derive(Args)]
pub struct BatchArgs {
    /// Directory holding `X_Y[.ext]` partition files
    pub dir: PathBuf,

    /// Partition format
    #[arg(long, value_enum)]
    pub kind: PartitionKind,

    /// JSON array of element asset records (graphics partitions)
    #[arg(long)]
    pub elements: Option<PathBuf>,

    /// Codec config (isomap.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// A partition file found in the directory
#[derive(Debug)]
pub struct PartitionFile {
    pub x: i32,
    pub y: i32,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub x: i32,
    pub y: i32,
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub kind: PartitionKind,
    pub files: usize,
    pub decoded: usize,
    pub failures: Vec<FailureReport>,
}

/// Read every file directly in `dir` whose name is `X_Y[.ext]`, sorted by path
pub fn collect_partition_files(dir: &Path) -> Result<Vec<PartitionFile>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some((x, y)) = common::partition_coords(path) else {
            tracing::debug!("Skipping {}", path.display());
            continue;
        };
        files.push(PartitionFile {
            x,
            y,
            path: path.to_path_buf(),
            bytes: common::read_file(path)?,
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

pub fn run(
    files: &[PartitionFile],
    kind: PartitionKind,
    elements: Option<&Path>,
    config: &CodecConfig,
) -> Result<BatchReport> {
    let sources: Vec<_> = files
        .iter()
        .map(|file| PartitionSource::new(file.x, file.y, &file.bytes))
        .collect();

    let (decoded, failures) = match kind {
        PartitionKind::Gfx => {
            let registry = common::load_registry(elements)?;
            let outcome = batch::decode_gfx_batch(&sources, &registry, config);
            (outcome.decoded.len(), outcome.failures)
        }
        PartitionKind::Topo => {
            let outcome = batch::decode_topology_batch(&sources, config);
            (outcome.decoded.len(), outcome.failures)
        }
    };

    let failures = failures
        .into_iter()
        .map(|failure| FailureReport {
            x: failure.x,
            y: failure.y,
            path: files
                .iter()
                .find(|f| (f.x, f.y) == (failure.x, failure.y))
                .map(|f| f.path.clone())
                .unwrap_or_default(),
            error: failure.error.to_string(),
        })
        .collect();

    Ok(BatchReport {
        kind,
        files: files.len(),
        decoded,
        failures,
    })
}

pub fn execute(args: BatchArgs) -> Result<()> {
    let config = common::load_config(args.config.as_deref())?;
    let files = collect_partition_files(&args.dir)?;
    tracing::info!("Decoding {} partition files from {}", files.len(), args.dir.display());

    let report = run(&files, args.kind, args.elements.as_deref(), &config)?;

    if args.json {
        return common::print_json(&report);
    }

    println!("Decoded {}/{} partitions", report.decoded, report.files);
    for failure in &report.failures {
        println!(
            "  ({}, {}) {}: {}",
            failure.x,
            failure.y,
            failure.path.display(),
            failure.error
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nether_isomap::topology::{TopologyA, TopologyHeader};
    use nether_isomap::{Element, ElementRegistry, GfxPartition, TopologyPartition};
    use tempfile::tempdir;

    #[test]
    fn test_batch_topology_directory() {
        let dir = tempdir().expect("Failed to create temp dir");
        let config = CodecConfig::default();
        for (x, y) in [(0, 0), (1, -2)] {
            let header = TopologyHeader::new(x, y, 0);
            let bytes = TopologyPartition::A(TopologyA::new(header, 1))
                .to_bytes(&config)
                .expect("encode");
            std::fs::write(dir.path().join(format!("{x}_{y}.topo")), bytes)
                .expect("Failed to write partition");
        }
        std::fs::write(dir.path().join("2_2.topo"), [0xFFu8]).expect("Failed to write partition");
        std::fs::write(dir.path().join("notes.txt"), "not a partition").expect("Failed to write");
        std::fs::create_dir(dir.path().join("3_3")).expect("Failed to create dir");

        let files = collect_partition_files(dir.path()).expect("collect");
        assert_eq!(files.len(), 3);
        assert_eq!((files[0].x, files[0].y), (0, 0));

        let report = run(&files, PartitionKind::Topo, None, &config).expect("run");
        assert_eq!(report.files, 3);
        assert_eq!(report.decoded, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!((report.failures[0].x, report.failures[0].y), (2, 2));
        assert!(report.failures[0].path.ends_with("2_2.topo"));
    }

    #[test]
    fn test_batch_gfx_directory() {
        let dir = tempdir().expect("Failed to create temp dir");
        let config = CodecConfig {
            compress: true,
            ..CodecConfig::default()
        };
        let registry = ElementRegistry::new();
        let bytes = GfxPartition::from_elements(4, 5, vec![Element::new(9, 75, 92, 1)], &registry)
            .to_bytes(&config)
            .expect("encode");
        std::fs::write(dir.path().join("4_5"), bytes).expect("Failed to write partition");

        let files = collect_partition_files(dir.path()).expect("collect");
        let report = run(&files, PartitionKind::Gfx, None, &config).expect("run");
        assert_eq!((report.files, report.decoded), (1, 1));
        assert!(report.failures.is_empty());
    }
}
