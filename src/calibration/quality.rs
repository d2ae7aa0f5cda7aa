//! Analytical quality parameters of a calibration curve
//!
//! Standard error of the regression (Syx), slope and intercept standard
//! errors, limits of detection and quantification, and the calibration
//! range. A parameter that is not defined for the available data is `None`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::regression::{DataPoint, LinearFit};
use crate::constants::statistics::{LINEAR_PARAMETERS, LOD_FACTOR, LOQ_FACTOR};

/// Multipliers applied to Syx/|m| for the detection limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityFactors {
    pub lod_factor: f64,
    pub loq_factor: f64,
}

impl Default for QualityFactors {
    fn default() -> Self {
        Self {
            lod_factor: LOD_FACTOR,
            loq_factor: LOQ_FACTOR,
        }
    }
}

/// Lowest and highest concentration among the calibration standards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRange {
    pub min: f64,
    pub max: f64,
}

impl CalibrationRange {
    /// Inclusive on both ends
    pub fn contains(&self, x: f64) -> bool {
        x >= self.min && x <= self.max
    }

    /// Range spanned by a set of concentrations; `None` when empty
    pub fn from_concentrations<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        values.into_iter().fold(None, |range, x| match range {
            None => Some(Self { min: x, max: x }),
            Some(r) => Some(Self {
                min: r.min.min(x),
                max: r.max.max(x),
            }),
        })
    }
}

/// Quality parameters attached to a fitted model
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityParameters {
    #[serde(rename = "Syx", default, skip_serializing_if = "Option::is_none")]
    pub syx: Option<f64>,
    /// Standard error of the slope
    #[serde(rename = "Sm", default, skip_serializing_if = "Option::is_none")]
    pub sm: Option<f64>,
    /// Standard error of the intercept
    #[serde(rename = "Sb", default, skip_serializing_if = "Option::is_none")]
    pub sb: Option<f64>,
    #[serde(default)]
    pub lod: Option<f64>,
    #[serde(default)]
    pub loq: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<CalibrationRange>,
}

/// Syx, Sm and Sb of a linear model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearStandardErrors {
    pub syx: f64,
    pub sm: f64,
    pub sb: f64,
}

/// `sqrt(Σ(y - ŷ)² / (n - p))`; `None` when `n <= p`
pub fn regression_standard_error<F>(points: &[DataPoint], predict: F, parameters: usize) -> Option<f64>
where
    F: Fn(f64) -> f64,
{
    let n = points.len();
    if n <= parameters {
        debug!(points = n, parameters, "not enough degrees of freedom for Syx");
        return None;
    }
    let ss_res: f64 = points.iter().map(|p| (p.y - predict(p.x)).powi(2)).sum();
    Some((ss_res / (n - parameters) as f64).sqrt())
}

/// Standard errors of a linear model
///
/// Sm and Sb are infinite when all concentrations are equal.
pub fn linear_standard_errors(points: &[DataPoint], fit: &LinearFit) -> Option<LinearStandardErrors> {
    let syx = regression_standard_error(points, |x| fit.predict(x), LINEAR_PARAMETERS)?;

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.x).sum::<f64>() / n;
    let sum_xx: f64 = points.iter().map(|p| p.x * p.x).sum();
    let ss_x: f64 = points.iter().map(|p| (p.x - mean_x).powi(2)).sum();

    let (sm, sb) = if ss_x > 0.0 {
        (syx / ss_x.sqrt(), syx * (sum_xx / (n * ss_x)).sqrt())
    } else {
        (f64::INFINITY, f64::INFINITY)
    };
    Some(LinearStandardErrors { syx, sm, sb })
}

/// LOD and LOQ from Syx and the slope
///
/// Both are `None` for a zero slope or a missing or zero Syx.
pub fn detection_limits(syx: Option<f64>, slope: f64, factors: &QualityFactors) -> (Option<f64>, Option<f64>) {
    match syx {
        Some(syx) if syx != 0.0 && slope != 0.0 => {
            let sensitivity = slope.abs();
            (
                Some(factors.lod_factor * syx / sensitivity),
                Some(factors.loq_factor * syx / sensitivity),
            )
        }
        _ => (None, None),
    }
}

/// Concentration range covered by the points
pub fn calibration_range(points: &[DataPoint]) -> Option<CalibrationRange> {
    CalibrationRange::from_concentrations(points.iter().map(|p| p.x))
}

/// Quality parameters with user-facing explanations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityParameter {
    R2,
    Sensitivity,
    Syx,
    Lod,
    Loq,
    Range,
}

impl QualityParameter {
    pub const ALL: [QualityParameter; 6] = [
        QualityParameter::R2,
        QualityParameter::Sensitivity,
        QualityParameter::Syx,
        QualityParameter::Lod,
        QualityParameter::Loq,
        QualityParameter::Range,
    ];

    pub fn title(self) -> &'static str {
        match self {
            QualityParameter::R2 => "R² (Coefficient of Determination)",
            QualityParameter::Sensitivity => "Analytical Sensitivity (Slope)",
            QualityParameter::Syx => "Sy/x (Standard Error of the Regression)",
            QualityParameter::Lod => "LOD (Limit of Detection)",
            QualityParameter::Loq => "LOQ (Limit of Quantification)",
            QualityParameter::Range => "Calibration Range",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            QualityParameter::R2 => {
                "How well the calibration points fit the model curve. A value of 0.99 means \
                 99% of the signal variation is explained by the concentration. Judge it \
                 together with the standard error of the regression."
            }
            QualityParameter::Sensitivity => {
                "For linear models, the slope m of the calibration line: how much the signal \
                 changes per unit of concentration. A larger |m| resolves smaller \
                 concentration differences."
            }
            QualityParameter::Syx => {
                "Spread of the calibration points around the fitted curve, in signal units. \
                 Smaller values mean more precise calibration data."
            }
            QualityParameter::Lod => {
                "Lowest concentration that can be distinguished from a blank with statistical \
                 confidence. Results below it should be reported as not detected."
            }
            QualityParameter::Loq => {
                "Lowest concentration that can be quantified with acceptable precision and \
                 accuracy. Always larger than the LOD."
            }
            QualityParameter::Range => {
                "Concentration interval, lowest to highest standard, used to build the model. \
                 Predictions outside it are extrapolations."
            }
        }
    }
}
