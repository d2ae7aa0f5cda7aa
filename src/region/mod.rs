//! Region samples and pixel sampling
//!
//! A region is a rectangle or circle drawn over the assay image. The sampler
//! reduces its pixels to mean and spread, and the converter derives every
//! color representation the metric catalog reads from.

pub mod sample;
pub mod sampler;

pub use sample::{
    AnalyticalResponse, BoundingBox, PixelStats, RegionColor, RegionSample, RegionShape, ShapeKind,
};
pub use sampler::RegionSampler;
