//! Configuration file for the exporter.
//!
//! ```yaml
//! engine:
//!   grass_executable: /usr/bin/grass
//!   module_dir: /usr/lib/grass/bin
//!   quiet: true
//! export:
//!   temp_dir: /var/tmp/png-proj
//!   render_flags: t
//!   compression: 9
//! ```
//!
//! Every key is optional. Command-line values take precedence.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use spatial_engine::ProcessEngineConfig;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    pub engine: ProcessEngineConfig,
    pub export: ExportDefaults,
}

/// Defaults applied to every export request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Where disposable workspaces are created; the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
    pub render_flags: String,
    pub compression: u8,
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            temp_dir: None,
            render_flags: String::new(),
            compression: 6,
        }
    }
}

impl ExporterConfig {
    /// Load from `path`, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        if config.export.compression > 9 {
            bail!(
                "export.compression must be between 0 and 9, got {}",
                config.export.compression
            );
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_path_gives_defaults() {
        let config = ExporterConfig::load(None).unwrap();
        assert_eq!(config.export.compression, 6);
        assert!(config.export.render_flags.is_empty());
        assert_eq!(config.engine.grass_executable, PathBuf::from("grass"));
        assert!(config.engine.quiet);
    }

    #[test]
    fn test_partial_file() {
        let config = ExporterConfig::parse("export:\n  compression: 9\n").unwrap();
        assert_eq!(config.export.compression, 9);
        assert!(config.export.temp_dir.is_none());
        assert_eq!(config.engine.grass_executable, PathBuf::from("grass"));
    }

    #[test]
    fn test_full_file() {
        let yaml = r#"
engine:
  grass_executable: /opt/grass/bin/grass
  module_dir: /opt/grass/bin
  quiet: false
export:
  temp_dir: /scratch
  render_flags: tw
  compression: 1
"#;
        let config = ExporterConfig::parse(yaml).unwrap();
        assert_eq!(config.engine.module_dir, Some(PathBuf::from("/opt/grass/bin")));
        assert!(!config.engine.quiet);
        assert_eq!(config.export.temp_dir, Some(PathBuf::from("/scratch")));
        assert_eq!(config.export.render_flags, "tw");
    }

    #[test]
    fn test_empty_file() {
        let config = ExporterConfig::parse("").unwrap();
        assert_eq!(config.export.compression, 6);
    }

    #[test]
    fn test_compression_out_of_range() {
        assert!(ExporterConfig::parse("export:\n  compression: 12\n").is_err());
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("png-proj.yaml");
        std::fs::write(&path, "engine: [not, a, map]\n").unwrap();

        let err = ExporterConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("png-proj.yaml"));

        let missing = dir.path().join("missing.yaml");
        assert!(ExporterConfig::load(Some(&missing)).is_err());
    }
}
