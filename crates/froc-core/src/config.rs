use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;
pub const DEFAULT_CONFIG_FILE: &str = "froc.yaml";

/// Contents of `froc.yaml`. Every section is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalConfig {
    pub version: u32,
    pub layout: LayoutConfig,
    pub evaluation: EvaluationConfig,
    pub output: OutputConfig,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            layout: LayoutConfig::default(),
            evaluation: EvaluationConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Directory names under the evaluation root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub reference_dir: String,
    pub raters_dir: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            reference_dir: "reference".to_string(),
            raters_dir: "raters".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Memoize per-case results.
    pub cache: bool,
    /// Evaluate cases on the rayon pool (requires the `parallel` feature).
    pub parallel: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            cache: true,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("froc_report.json"),
        }
    }
}

pub fn parse_config(raw: &str) -> Result<EvalConfig, ConfigError> {
    let cfg: EvalConfig = serde_yaml::from_str(raw)?;
    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion {
            found: cfg.version,
            supported: SUPPORTED_CONFIG_VERSION,
        });
    }
    if cfg.layout.reference_dir.is_empty() || cfg.layout.raters_dir.is_empty() {
        return Err(ConfigError::Invalid("layout directory names must not be empty".into()));
    }
    if cfg.layout.reference_dir == cfg.layout.raters_dir {
        return Err(ConfigError::Invalid(
            "reference_dir and raters_dir must differ".into(),
        ));
    }
    Ok(cfg)
}

pub fn load_config(path: &Path) -> Result<EvalConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = parse_config("{}").unwrap();
        assert_eq!(cfg, EvalConfig::default());
        assert!(cfg.evaluation.cache);
        assert_eq!(cfg.layout.raters_dir, "raters");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = parse_config(
            "version: 1\nlayout:\n  raters_dir: readers\nevaluation:\n  parallel: true\n",
        )
        .unwrap();
        assert_eq!(cfg.layout.reference_dir, "reference");
        assert_eq!(cfg.layout.raters_dir, "readers");
        assert!(cfg.evaluation.parallel);
        assert!(cfg.evaluation.cache);
    }

    #[test]
    fn rejects_unknown_fields_and_versions() {
        assert!(matches!(
            parse_config("version: 1\nbogus: true\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            parse_config("version: 2\n"),
            Err(ConfigError::UnsupportedVersion { found: 2, .. })
        ));
        assert!(matches!(
            parse_config("layout:\n  reference_dir: same\n  raters_dir: same\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
