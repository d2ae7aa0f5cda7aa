//! Configuration structures for the chroma_assay engine.
//!
//! This module defines the tunable parameters of the calculation engine,
//! organized into groups for the metric catalog, the analytical quality
//! parameters and concentration prediction.
//!
//! # Configuration Loading
//!
//! Configuration can be loaded from JSON files or constructed programmatically:
//!
//! ```no_run
//! use chroma_assay::EngineConfig;
//! use std::path::Path;
//!
//! // Load from file
//! let config = EngineConfig::from_json_file(Path::new("engine.json"))?;
//!
//! // Or use defaults
//! let config = EngineConfig::default();
//! # Ok::<(), chroma_assay::AnalysisError>(())
//! ```
//!
//! # Configuration Sections
//!
//! - [`CatalogConfig`]: where the metric catalog comes from
//! - [`QualityFactors`]: LOD and LOQ multipliers
//! - [`PredictionPolicy`]: negative results, quadratic roots and model ties

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::calibration::{PredictionPolicy, QualityFactors};
use crate::error::{AnalysisError, Result};
use crate::metrics::MetricCatalog;

/// Complete engine configuration.
///
/// Every section falls back to its default when omitted, so `{}` is a
/// valid configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Metric catalog source
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Detection limit multipliers
    #[serde(default)]
    pub quality: QualityFactors,

    /// Concentration prediction behaviour
    #[serde(default)]
    pub prediction: PredictionPolicy,
}

/// Metric catalog source.
///
/// Without a path the catalog compiled into the crate is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// External catalog JSON file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl EngineConfig {
    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::config(path.display().to_string(), e))?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AnalysisError::config("invalid JSON", e))
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::config("serialization failed", e))?;
        std::fs::write(path, json).map_err(|e| AnalysisError::config(path.display().to_string(), e))
    }

    /// Load and validate the configured metric catalog
    pub fn load_catalog(&self) -> Result<MetricCatalog> {
        let catalog = match &self.catalog.path {
            Some(path) => MetricCatalog::from_json_file(path)?,
            None => MetricCatalog::default_catalog()?,
        };
        debug!(
            metrics = catalog.len(),
            source = ?self.catalog.path,
            "metric catalog loaded"
        );
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{NegativePolicy, RootSelection, TieBreak};

    #[test]
    fn test_empty_object_is_default() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.quality.lod_factor, 3.3);
        assert_eq!(config.quality.loq_factor, 10.0);
        assert_eq!(config.prediction.negative_policy, NegativePolicy::Reject);
        assert_eq!(config.prediction.root_selection, RootSelection::SmallestMagnitude);
        assert_eq!(config.prediction.tie_break, TieBreak::First);
    }

    #[test]
    fn test_partial_sections() {
        let json = r#"{
            "quality": {"lod_factor": 3.0, "loq_factor": 9.0},
            "prediction": {"negative_policy": "allow"}
        }"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.quality.lod_factor, 3.0);
        assert_eq!(config.prediction.negative_policy, NegativePolicy::Allow);
        assert_eq!(config.prediction.tie_break, TieBreak::First);
        assert!(config.catalog.path.is_none());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = EngineConfig::from_json_str("{\"quality\": 3}").unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigError { .. }));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("chroma_assay_config_{}.json", std::process::id()));
        let mut config = EngineConfig::default();
        config.prediction.root_selection = RootSelection::SmallestPositive;
        config.to_json_file(&path).unwrap();

        let loaded = EngineConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = EngineConfig::from_json_file(Path::new("/nonexistent/engine.json")).unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigError { .. }));
    }

    #[test]
    fn test_default_catalog_loads() {
        let catalog = EngineConfig::default().load_catalog().unwrap();
        assert!(!catalog.is_empty());
    }
}
