//! Color conversion and color difference module
//!
//! This module handles the color space conversions applied to a region's
//! mean RGB and the perceptual distance used by reference-based metrics.

pub mod conversion;
pub mod difference;
pub mod system;

pub use conversion::{
    CieLab, CieXyz, Cmyk, ColorConverter, ColorRepresentations, Hsl, Hsv, HunterLab, LabPolar,
    MeanRgb, RgbStdDev, YCbCr,
};
pub use difference::{ciede2000, delta_e76};
pub use system::ColorSystem;
