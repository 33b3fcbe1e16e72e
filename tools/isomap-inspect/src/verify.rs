//! `verify` command: decode -> encode -> decode and compare

use anyhow::{Context, Result, bail};
use clap::Args;
use nether_isomap::{CodecConfig, ElementRegistry, GfxPartition, TopologyPartition};
use std::path::PathBuf;

use crate::common::{self, PartitionKind};

#[derive(Args)]
pub struct VerifyArgs {
    /// Partition file
    pub input: PathBuf,

    /// Partition format
    #[arg(long, value_enum)]
    pub kind: PartitionKind,

    /// Region x coordinate (graphics partitions)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub x: i32,

    /// Region y coordinate (graphics partitions)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub y: i32,

    /// JSON array of element asset records
    #[arg(long)]
    pub elements: Option<PathBuf>,

    /// Codec config (isomap.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Result of re-encoding a partition
#[derive(Debug, PartialEq, Eq)]
pub struct Verification {
    /// Decoded content survived the round trip
    pub stable: bool,
    /// Re-encoded bytes equal the input bytes
    pub identical: bool,
    pub input_len: usize,
    pub output_len: usize,
}

pub fn verify_gfx(
    bytes: &[u8],
    x: i32,
    y: i32,
    registry: &ElementRegistry,
    config: &CodecConfig,
) -> Result<Verification> {
    let first = GfxPartition::from_bytes(x, y, bytes, registry, config).context("Initial decode failed")?;
    let encoded = first.to_bytes(config).context("Re-encode failed")?;
    let second = GfxPartition::from_bytes(x, y, &encoded, registry, config).context("Second decode failed")?;
    Ok(Verification {
        stable: first == second,
        identical: encoded == bytes,
        input_len: bytes.len(),
        output_len: encoded.len(),
    })
}

pub fn verify_topology(bytes: &[u8], config: &CodecConfig) -> Result<Verification> {
    let first = TopologyPartition::from_bytes(bytes, config).context("Initial decode failed")?;
    let encoded = first.to_bytes(config).context("Re-encode failed")?;
    let second = TopologyPartition::from_bytes(&encoded, config).context("Second decode failed")?;
    Ok(Verification {
        stable: first == second,
        identical: encoded == bytes,
        input_len: bytes.len(),
        output_len: encoded.len(),
    })
}

pub fn execute(args: VerifyArgs) -> Result<()> {
    let config = common::load_config(args.config.as_deref())?;
    let bytes = common::read_file(&args.input)?;

    let verification = match args.kind {
        PartitionKind::Gfx => {
            let registry = common::load_registry(args.elements.as_deref())?;
            verify_gfx(&bytes, args.x, args.y, &registry, &config)?
        }
        PartitionKind::Topo => verify_topology(&bytes, &config)?,
    };

    if !verification.stable {
        bail!("{} changed after re-encoding", args.input.display());
    }
    if verification.identical {
        tracing::info!("{}: round trip is byte-identical", args.input.display());
    } else {
        // Table order and rectangle layout may differ from the original writer
        tracing::info!(
            "{}: content stable, bytes differ ({} -> {})",
            args.input.display(),
            verification.input_len,
            verification.output_len
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nether_isomap::Element;
    use nether_isomap::topology::{TopologyA, TopologyHeader};

    #[test]
    fn test_verify_canonical_gfx() {
        let registry = ElementRegistry::new();
        let config = CodecConfig::default();
        let bytes = GfxPartition::from_elements(
            0,
            0,
            vec![Element::new(1, 0, 0, 0), Element::new(1, 1, 0, 2)],
            &registry,
        )
        .to_bytes(&config)
        .expect("encode");

        let verification = verify_gfx(&bytes, 0, 0, &registry, &config).expect("verify");
        assert!(verification.stable);
        assert!(verification.identical);
    }

    #[test]
    fn test_verify_topology_rejects_garbage() {
        let config = CodecConfig::default();
        assert!(verify_topology(&[42, 0, 0], &config).is_err());

        let bytes = TopologyPartition::A(TopologyA::new(TopologyHeader::new(1, 1, 1), 0))
            .to_bytes(&config)
            .expect("encode");
        let verification = verify_topology(&bytes, &config).expect("verify");
        assert_eq!(
            verification,
            Verification {
                stable: true,
                identical: true,
                input_len: 8,
                output_len: 8,
            }
        );
    }
}
