//! # Chroma Assay
//!
//! A Rust crate for colorimetric assays: estimating analyte concentrations
//! from the color of regions in a digital photograph.
//!
//! This library provides the computation core of an assay workflow by:
//! - Sampling rectangular or circular regions of an RGBA pixel buffer
//! - Converting the mean color to HSV, HSL, CIELAB, XYZ, YCbCr, CMYK and Hunter Lab
//! - Evaluating a catalog of analytical signals, including reference comparisons
//! - Fitting linear and quadratic calibration curves with LOD/LOQ
//! - Predicting unknown concentrations with range and validity classification
//!
//! All of it is also reachable through a JSON request/response contract
//! ([`engine::Engine`]).
//!
//! ## Example
//!
//! ```rust,no_run
//! use chroma_assay::{analyze_image, RegionSample, RegionShape};
//! use std::path::Path;
//!
//! let mut regions = vec![
//!     RegionSample::new(1, RegionShape::Circle { x: 10.0, y: 10.0, radius: 8.0 }),
//!     RegionSample::new(2, RegionShape::Circle { x: 40.0, y: 10.0, radius: 8.0 }),
//! ];
//! let summary = analyze_image(Path::new("plate.png"), &mut regions, Some(1))?;
//! println!("{} responses", summary.responses);
//! # Ok::<(), chroma_assay::AnalysisError>(())
//! ```

use image::RgbaImage;
use std::path::Path;
use tracing::info;

pub mod calibration;
pub mod color;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod image_loader;
pub mod metrics;
pub mod region;

pub use calibration::{
    best_prediction, ConcentrationPredictor, MetricRegression, PredictionPolicy, PredictionResult,
    PredictionStatus, RegressionEngine, RegressionModel,
};
pub use color::{ciede2000, ColorConverter, ColorSystem};
pub use config::EngineConfig;
pub use engine::{Engine, TaskQueue, TaskRequest, TaskResponse};
pub use error::{AnalysisError, Result};
pub use metrics::{BatchSummary, MetricCatalog, MetricEvaluator};
pub use region::{RegionSample, RegionSampler, RegionShape};

/// Sample every region of an image and compute its analytical responses
///
/// Uses the embedded metric catalog. `reference_id` names the region that
/// serves as the reference white, if any.
///
/// # Errors
///
/// Returns `AnalysisError` if the image cannot be loaded or the catalog is
/// invalid. Regions that cover no pixels are left without responses.
pub fn analyze_image(
    image_path: &Path,
    regions: &mut [RegionSample],
    reference_id: Option<u32>,
) -> Result<BatchSummary> {
    let image = image_loader::load_rgba(image_path)?;
    let catalog = MetricCatalog::default_catalog()?;
    info!(
        path = %image_path.display(),
        width = image.width(),
        height = image.height(),
        regions = regions.len(),
        "analyzing image"
    );
    Ok(analyze_regions(&image, regions, reference_id, &catalog))
}

/// Sample every region of an in-memory buffer and evaluate the catalog
pub fn analyze_regions(
    image: &RgbaImage,
    regions: &mut [RegionSample],
    reference_id: Option<u32>,
    catalog: &MetricCatalog,
) -> BatchSummary {
    let sampler = RegionSampler::new();
    for region in regions.iter_mut() {
        region.clear_responses();
        sampler.process_region(image, region);
    }
    MetricEvaluator::new(catalog).evaluate_batch(regions, reference_id)
}
