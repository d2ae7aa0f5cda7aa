//! Region sample records
//!
//! A region sample is a user-defined image area together with its pixel
//! statistics, derived color representations, analytical responses and
//! concentration predictions. Derived data is discarded whenever the
//! geometry or the reference assignment changes.

use serde::{Deserialize, Serialize};

use crate::calibration::PredictionResult;
use crate::color::{ColorConverter, ColorRepresentations, ColorSystem, MeanRgb, RgbStdDev};

/// Region geometry in buffer pixel coordinates
///
/// For circles, `x`/`y` is the top-left corner of the bounding square.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RegionShape {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Circle { x: f64, y: f64, radius: f64 },
}

/// Shape kind used by the pixel mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rect,
    Circle,
}

/// Integer bounding box of a region, not yet clipped to any buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl RegionShape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            RegionShape::Rect { .. } => ShapeKind::Rect,
            RegionShape::Circle { .. } => ShapeKind::Circle,
        }
    }

    /// Floored bounding box; `None` when either side is not positive
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let (x, y, width, height) = match *self {
            RegionShape::Rect {
                x,
                y,
                width,
                height,
            } => (x, y, width, height),
            RegionShape::Circle { x, y, radius } => (x, y, radius * 2.0, radius * 2.0),
        };
        if !(x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite()) {
            return None;
        }

        // float-to-int casts saturate at the i64 bounds
        let bbox = BoundingBox {
            x: x.floor() as i64,
            y: y.floor() as i64,
            width: width.floor() as i64,
            height: height.floor() as i64,
        };
        (bbox.width > 0 && bbox.height > 0).then_some(bbox)
    }
}

/// Pixel statistics of one region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelStats {
    pub pixel_count: usize,
    pub rgb: MeanRgb,
    pub rgb_std_dev: RgbStdDev,
}

/// Pixel statistics plus every derived color representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionColor {
    pub pixel_count: usize,
    pub rgb: MeanRgb,
    pub rgb_std_dev: RgbStdDev,
    /// Display color of the mean RGB
    pub hex: String,
    #[serde(flatten)]
    pub representations: ColorRepresentations,
}

impl RegionColor {
    pub fn from_stats(stats: PixelStats, converter: &ColorConverter) -> Self {
        Self {
            pixel_count: stats.pixel_count,
            rgb: stats.rgb,
            rgb_std_dev: stats.rgb_std_dev,
            hex: converter.rgb_to_hex(&stats.rgb),
            representations: converter.convert_all(&stats.rgb),
        }
    }

    /// Value of a named channel of a color system
    pub fn channel(&self, system: ColorSystem, channel: &str) -> Option<f64> {
        system.read(&self.rgb, &self.representations, channel)
    }
}

/// One analytical signal computed for a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticalResponse {
    /// Display key of the metric, e.g. "Signal (RGB - R component)"
    pub key: String,
    pub metric_id: String,
    pub value: f64,
}

/// A user-defined region and everything computed for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSample {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(flatten)]
    pub shape: RegionShape,
    #[serde(default)]
    pub color: Option<RegionColor>,
    #[serde(default)]
    pub is_reference_white: bool,
    #[serde(default)]
    pub is_sample: bool,
    #[serde(default)]
    pub use_in_calibration: bool,
    #[serde(default)]
    pub concentration: Option<f64>,
    #[serde(default)]
    pub calibration_order: Option<u32>,
    #[serde(default)]
    pub analytical_responses: Vec<AnalyticalResponse>,
    #[serde(default)]
    pub predicted_concentrations: Vec<PredictionResult>,
}

impl RegionSample {
    /// Create an empty region with a default name
    pub fn new(id: u32, shape: RegionShape) -> Self {
        Self {
            id,
            name: format!("ROI {}", id),
            custom_name: None,
            shape,
            color: None,
            is_reference_white: false,
            is_sample: false,
            use_in_calibration: false,
            concentration: None,
            calibration_order: None,
            analytical_responses: Vec::new(),
            predicted_concentrations: Vec::new(),
        }
    }

    /// Custom name when set, otherwise the generated one
    pub fn display_name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.name)
    }

    /// Drop pixel statistics, responses and predictions
    pub fn invalidate(&mut self) {
        self.color = None;
        self.clear_responses();
    }

    /// Drop responses and predictions, keeping pixel statistics
    pub fn clear_responses(&mut self) {
        self.analytical_responses.clear();
        self.predicted_concentrations.clear();
    }

    /// Move or resize the region
    pub fn set_geometry(&mut self, shape: RegionShape) {
        if self.shape != shape {
            self.shape = shape;
            self.invalidate();
        }
    }

    /// Designate or release this region as the reference white
    ///
    /// The reference is neither a sample nor a calibration standard.
    pub fn set_reference_white(&mut self, is_reference: bool) {
        if self.is_reference_white == is_reference {
            return;
        }
        self.is_reference_white = is_reference;
        if is_reference {
            self.is_sample = false;
            self.use_in_calibration = false;
        }
        self.clear_responses();
    }

    /// Flag this region as an unknown sample; a sample cannot be the reference
    pub fn set_sample(&mut self, is_sample: bool) {
        self.is_sample = is_sample;
        if is_sample && self.is_reference_white {
            self.is_reference_white = false;
            self.clear_responses();
        }
    }

    /// Usable as a calibration standard
    pub fn is_calibration_point(&self) -> bool {
        self.use_in_calibration && self.concentration.is_some()
    }

    /// Value of the analytical response with the given display key
    pub fn response(&self, key: &str) -> Option<f64> {
        self.analytical_responses
            .iter()
            .find(|r| r.key == key)
            .map(|r| r.value)
    }
}
