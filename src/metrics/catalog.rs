//! Metric catalog
//!
//! The catalog is static data: an ordered list of color systems, each with
//! ordered categories of metric definitions. It is loaded once, validated
//! against the channel names each evaluation kind needs, and then shared
//! read-only by the evaluator and the predictor.
//!
//! ## File format
//!
//! ```json
//! { "systems": [
//!     { "name": "RGB", "categories": [
//!         { "name": "Intensity and Derived", "metrics": [
//!             { "id": "direct_r", "text": "R Component",
//!               "type": "direct", "system": "rgb", "channel": "avgR" } ] } ] } ] }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::color::ColorSystem;
use crate::error::{AnalysisError, Result};

/// Catalog shipped with the crate
const DEFAULT_CATALOG: &str = include_str!("../../catalog/metrics.json");

/// Pseudo-channel for the precomputed CIELAB chroma
pub const CHROMA_CHANNEL: &str = "c_star";

/// Pseudo-channel for R+G+B
pub const RGB_SUM_CHANNEL: &str = "sum";

/// Which trigonometric component of the CIELAB hue angle to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HueComponent {
    Cos,
    Sin,
}

/// How a metric value is computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricKind {
    /// `sample[system][channel]`
    Direct { system: ColorSystem, channel: String },
    /// `255 - sample.rgb[channel]`
    Inverse { channel: String },
    /// `reference - sample` on one channel
    Delta { system: ColorSystem, channel: String },
    /// Absorbance analog `-log10(sample / reference)`
    Beer { system: ColorSystem, channel: String },
    Ratio {
        system: ColorSystem,
        channels: [String; 2],
    },
    /// Normalized difference index `(a - b) / (a + b)`
    Ndi {
        system: ColorSystem,
        channels: [String; 2],
    },
    /// Share of one RGB channel in R+G+B
    SumRatioRgb { channel: String },
    /// Distance between sample and reference mean RGB
    EuclideanRgb,
    /// Distance over an arbitrary channel list of one system
    EuclideanGeneric {
        system: ColorSystem,
        channels: Vec<String>,
    },
    /// CIE xy chromaticity coordinate
    XyzChromaticity { channel: String },
    CielabChroma,
    CielabHue,
    CielabHueComponent {
        #[serde(rename = "subType")]
        sub_type: HueComponent,
    },
    CielabChromaLightnessRatio,
    DeltaE2000,
    /// `systems[0].channels[0] / systems[1].channels[1]`
    InterRatio {
        systems: [ColorSystem; 2],
        channels: [String; 2],
    },
    /// `C* / systems[1].channels[1]`
    InterRatioCstar {
        systems: [ColorSystem; 2],
        channels: [String; 2],
    },
    /// `(R+G+B) / systems[1].channels[1]`
    InterRatioSumRgb {
        systems: [ColorSystem; 2],
        channels: [String; 2],
    },
    /// `systems[0].channels[0] / C*`
    InterRatioRgbVsCstar {
        systems: [ColorSystem; 2],
        channels: [String; 2],
    },
}

impl MetricKind {
    /// Kinds that compare a sample against the reference region
    pub fn compares_to_reference(&self) -> bool {
        matches!(
            self,
            MetricKind::Delta { .. }
                | MetricKind::Beer { .. }
                | MetricKind::EuclideanRgb
                | MetricKind::EuclideanGeneric { .. }
                | MetricKind::DeltaE2000
        )
    }

    /// Check every channel reference against its color system
    fn validate(&self) -> std::result::Result<(), String> {
        let check = |system: ColorSystem, channel: &str| {
            if system.has_channel(channel) {
                Ok(())
            } else {
                Err(format!("system '{}' has no channel '{}'", system, channel))
            }
        };
        let expect = |channel: &str, wanted: &str| {
            if channel == wanted {
                Ok(())
            } else {
                Err(format!("expected pseudo-channel '{}', found '{}'", wanted, channel))
            }
        };

        match self {
            MetricKind::Direct { system, channel }
            | MetricKind::Delta { system, channel }
            | MetricKind::Beer { system, channel } => check(*system, channel),
            MetricKind::Inverse { channel } | MetricKind::SumRatioRgb { channel } => {
                check(ColorSystem::Rgb, channel)
            }
            MetricKind::XyzChromaticity { channel } => check(ColorSystem::Xyz, channel),
            MetricKind::Ratio { system, channels } | MetricKind::Ndi { system, channels } => {
                check(*system, &channels[0])?;
                check(*system, &channels[1])
            }
            MetricKind::EuclideanGeneric { system, channels } => {
                if channels.is_empty() {
                    return Err("channel list is empty".to_string());
                }
                channels.iter().try_for_each(|c| check(*system, c))
            }
            MetricKind::InterRatio { systems, channels } => {
                check(systems[0], &channels[0])?;
                check(systems[1], &channels[1])
            }
            MetricKind::InterRatioCstar { systems, channels } => {
                expect(&channels[0], CHROMA_CHANNEL)?;
                check(systems[1], &channels[1])
            }
            MetricKind::InterRatioSumRgb { systems, channels } => {
                expect(&channels[0], RGB_SUM_CHANNEL)?;
                check(systems[1], &channels[1])
            }
            MetricKind::InterRatioRgbVsCstar { systems, channels } => {
                check(systems[0], &channels[0])?;
                expect(&channels[1], CHROMA_CHANNEL)
            }
            MetricKind::EuclideanRgb
            | MetricKind::CielabChroma
            | MetricKind::CielabHue
            | MetricKind::CielabHueComponent { .. }
            | MetricKind::CielabChromaLightnessRatio
            | MetricKind::DeltaE2000 => Ok(()),
        }
    }
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDefinition {
    pub id: String,
    /// Short label, part of the display key
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, alias = "needsWhite")]
    pub needs_reference: bool,
    #[serde(flatten)]
    pub kind: MetricKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCategory {
    pub name: String,
    pub metrics: Vec<MetricDefinition>,
}

/// Metrics grouped under one color system heading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemGroup {
    /// Display name, e.g. "CIELAB"
    pub name: String,
    pub categories: Vec<MetricCategory>,
}

/// A catalog entry together with its display key and system heading
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry<'a> {
    pub system: &'a str,
    pub category: &'a str,
    pub metric: &'a MetricDefinition,
}

impl CatalogEntry<'_> {
    /// Key used for analytical responses and regression selection
    pub fn display_key(&self) -> String {
        display_key(self.system, &self.metric.text)
    }
}

/// Display key for a metric text under a system heading
pub fn display_key(system: &str, text: &str) -> String {
    format!("Signal ({} - {})", system, text)
}

/// Immutable, validated metric catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCatalog {
    systems: Vec<SystemGroup>,
}

impl MetricCatalog {
    /// Build a catalog from system groups, validating every entry
    pub fn new(systems: Vec<SystemGroup>) -> Result<Self> {
        let catalog = Self { systems };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a catalog from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: MetricCatalog = serde_json::from_str(json)
            .map_err(|e| AnalysisError::catalog_load("invalid catalog JSON", e))?;
        catalog.validate()?;
        debug!(metrics = catalog.len(), "metric catalog parsed");
        Ok(catalog)
    }

    /// Load and validate a catalog file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::catalog_load(format!("cannot read {}", path.display()), e)
        })?;
        let catalog = Self::from_json_str(&json)?;
        info!(path = %path.display(), metrics = catalog.len(), "loaded metric catalog");
        Ok(catalog)
    }

    /// Catalog embedded in the crate
    pub fn default_catalog() -> Result<Self> {
        Self::from_json_str(DEFAULT_CATALOG)
    }

    /// Reject duplicate ids, duplicate display keys and unknown channels
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        let mut keys = HashSet::new();
        for entry in self.entries() {
            let metric = entry.metric;
            if metric.id.trim().is_empty() {
                return Err(AnalysisError::catalog_schema(&metric.text, "empty metric id"));
            }
            if !ids.insert(metric.id.as_str()) {
                return Err(AnalysisError::catalog_schema(&metric.id, "duplicate metric id"));
            }
            if !keys.insert(entry.display_key()) {
                return Err(AnalysisError::catalog_schema(
                    &metric.id,
                    format!("duplicate display key '{}'", entry.display_key()),
                ));
            }
            if metric.kind.compares_to_reference() && !metric.needs_reference {
                return Err(AnalysisError::catalog_schema(
                    &metric.id,
                    "reference comparison must set needsReference",
                ));
            }
            metric
                .kind
                .validate()
                .map_err(|reason| AnalysisError::catalog_schema(&metric.id, reason))?;
        }
        Ok(())
    }

    pub fn systems(&self) -> &[SystemGroup] {
        &self.systems
    }

    /// All entries in catalog order
    pub fn entries(&self) -> impl Iterator<Item = CatalogEntry<'_>> {
        self.systems.iter().flat_map(|group| {
            group.categories.iter().flat_map(move |category| {
                category.metrics.iter().map(move |metric| CatalogEntry {
                    system: &group.name,
                    category: &category.name,
                    metric,
                })
            })
        })
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    pub fn find_by_id(&self, id: &str) -> Option<CatalogEntry<'_>> {
        self.entries().find(|e| e.metric.id == id)
    }

    /// Look up a metric by its display key
    pub fn find_by_key(&self, key: &str) -> Option<CatalogEntry<'_>> {
        self.entries().find(|e| e.display_key() == key)
    }

    /// System heading of the metric behind a display key
    pub fn system_for_key(&self, key: &str) -> Option<&str> {
        self.find_by_key(key).map(|e| e.system)
    }
}
