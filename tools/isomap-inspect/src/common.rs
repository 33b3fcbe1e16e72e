//! Shared helpers: config and registry loading, partition file names

use anyhow::{Context, Result};
use clap::ValueEnum;
use nether_isomap::{CodecConfig, ElementData, ElementRegistry};
use serde::Serialize;
use std::path::Path;

/// Which partition format a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKind {
    Gfx,
    Topo,
}

/// Load the codec config, or the defaults when no file is given
pub fn load_config(path: Option<&Path>) -> Result<CodecConfig> {
    let Some(path) = path else {
        return Ok(CodecConfig::default());
    };
    let config = CodecConfig::load(path)
        .with_context(|| format!("Failed to load config: {}", path.display()))?;
    tracing::debug!(?config, "loaded codec config");
    Ok(config)
}

/// Load element asset records from a JSON array, or start with an empty registry
pub fn load_registry(path: Option<&Path>) -> Result<ElementRegistry> {
    let Some(path) = path else {
        return Ok(ElementRegistry::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read element list: {}", path.display()))?;
    let entries: Vec<ElementData> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse element list: {}", path.display()))?;
    tracing::info!("Loaded {} element records", entries.len());
    Ok(ElementRegistry::from_entries(entries))
}

pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read partition: {}", path.display()))
}

/// Region coordinates encoded in a partition file name (`X_Y` or `X_Y.ext`)
pub fn partition_coords(path: &Path) -> Option<(i32, i32)> {
    let stem = path.file_stem()?.to_str()?;
    let (x, y) = stem.split_once('_')?;
    Some((x.parse().ok()?, y.parse().ok()?))
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_partition_coords() {
        assert_eq!(partition_coords(Path::new("3_4")), Some((3, 4)));
        assert_eq!(partition_coords(Path::new("dir/-12_0.bin")), Some((-12, 0)));
        assert_eq!(partition_coords(Path::new("3_-1.topo")), Some((3, -1)));
        assert_eq!(partition_coords(Path::new("readme.txt")), None);
        assert_eq!(partition_coords(Path::new("a_b")), None);
        assert_eq!(partition_coords(Path::new("1_2_3")), None);
        assert_eq!(partition_coords(&PathBuf::new()), None);
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("isomap.toml");
        std::fs::write(&path, "compress = true\n").expect("Failed to write config");

        let config = load_config(Some(&path)).expect("config");
        assert!(config.compress);
        assert_eq!(load_config(None).expect("defaults"), CodecConfig::default());
        assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_load_registry_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("elements.json");
        std::fs::write(&path, r#"[{"id": 5, "img_width": 10}, {"id": 6}]"#)
            .expect("Failed to write element list");

        let registry = load_registry(Some(&path)).expect("registry");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(5).map(|d| d.img_width), Some(10));
        assert!(load_registry(None).expect("empty").is_empty());
    }
}
