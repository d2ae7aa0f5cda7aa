//! Analytical signal metrics
//!
//! The catalog declares what each metric reads; the evaluator computes it.

pub mod catalog;
pub mod evaluator;

pub use catalog::{
    display_key, CatalogEntry, HueComponent, MetricCatalog, MetricCategory, MetricDefinition,
    MetricKind, SystemGroup,
};
pub use evaluator::{BatchSummary, MetricEvaluator};
