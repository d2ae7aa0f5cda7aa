//! Concentration prediction
//!
//! Inverts the best calibration curve of each metric at an unknown
//! sample's response and classifies the estimate against the calibration
//! range.
//!
//! ## Classification order
//!
//! 1. Zero slope (linear) or negative discriminant (quadratic): invalid, no value
//! 2. Negative concentration: `invalid_negative_result` (unless allowed by policy)
//! 3. Inside the inclusive calibration range: `valid`
//! 4. Otherwise `extrapolated_low` / `extrapolated_high`

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::quality::CalibrationRange;
use super::regression::{Coefficients, MetricRegression, ModelKind, RegressionModel};
use crate::metrics::MetricCatalog;
use crate::region::RegionSample;

/// System label used when a metric key is not in the catalog
pub const UNKNOWN_SYSTEM: &str = "Unknown";

/// Validity of a predicted concentration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    Valid,
    ExtrapolatedLow,
    ExtrapolatedHigh,
    InvalidNoSlope,
    InvalidNegativeResult,
    InvalidNoRealSolution,
    InvalidCalculationFailed,
}

impl PredictionStatus {
    pub fn is_valid(self) -> bool {
        self == PredictionStatus::Valid
    }

    pub fn is_extrapolated(self) -> bool {
        matches!(
            self,
            PredictionStatus::ExtrapolatedLow | PredictionStatus::ExtrapolatedHigh
        )
    }
}

/// Treatment of negative concentration estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativePolicy {
    /// Report as `invalid_negative_result` before range classification
    #[default]
    Reject,
    /// Classify against the range like any other value
    Allow,
}

/// Root choice when both or neither quadratic roots lie in range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootSelection {
    #[default]
    SmallestMagnitude,
    /// Smallest non-negative root, falling back to smallest magnitude
    SmallestPositive,
}

/// Winner among models with equal R²
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    #[default]
    First,
    Last,
}

/// Prediction behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PredictionPolicy {
    #[serde(default)]
    pub negative_policy: NegativePolicy,
    #[serde(default)]
    pub root_selection: RootSelection,
    #[serde(default)]
    pub tie_break: TieBreak,
}

/// One concentration estimate for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub concentration: Option<f64>,
    pub status: PredictionStatus,
    pub metric_key: String,
    pub model_used: ModelKind,
    pub r2: f64,
    pub equation: String,
    /// Catalog system heading of the metric
    pub system: String,
}

/// Estimate plus classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inversion {
    pub concentration: Option<f64>,
    pub status: PredictionStatus,
}

impl Inversion {
    fn invalid(status: PredictionStatus) -> Self {
        Self {
            concentration: None,
            status,
        }
    }
}

/// Inverts calibration models
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcentrationPredictor {
    policy: PredictionPolicy,
}

impl ConcentrationPredictor {
    pub fn new(policy: PredictionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PredictionPolicy {
        &self.policy
    }

    /// Model with the greatest R²; ties resolved by the tie-break policy
    pub fn select_best<'m>(&self, models: &'m [RegressionModel]) -> Option<&'m RegressionModel> {
        models.iter().fold(None, |best, model| match best {
            None => Some(model),
            Some(current) => {
                let better = match self.policy.tie_break {
                    TieBreak::First => model.r2 > current.r2,
                    TieBreak::Last => model.r2 >= current.r2,
                };
                Some(if better { model } else { current })
            }
        })
    }

    /// Classify an estimate that exists
    fn classify(&self, x: f64, range: CalibrationRange, in_range: bool) -> Inversion {
        let status = if self.policy.negative_policy == NegativePolicy::Reject && x < 0.0 {
            PredictionStatus::InvalidNegativeResult
        } else if in_range {
            PredictionStatus::Valid
        } else if x < range.min {
            PredictionStatus::ExtrapolatedLow
        } else {
            PredictionStatus::ExtrapolatedHigh
        };
        Inversion {
            concentration: Some(x),
            status,
        }
    }

    /// `x = (y - b) / m`
    pub fn invert_linear(&self, m: f64, b: f64, y: f64, range: Option<CalibrationRange>) -> Inversion {
        if m == 0.0 {
            return Inversion::invalid(PredictionStatus::InvalidNoSlope);
        }
        let x = (y - b) / m;
        if !x.is_finite() {
            return Inversion::invalid(PredictionStatus::InvalidCalculationFailed);
        }
        match range {
            Some(range) => self.classify(x, range, range.contains(x)),
            // the estimate exists but cannot be classified
            None => Inversion {
                concentration: Some(x),
                status: PredictionStatus::InvalidCalculationFailed,
            },
        }
    }

    /// Solve `a·x² + b·x + c = y`
    ///
    /// A quadratic without a calibration range cannot choose between roots
    /// and fails; `a = 0` falls back to the linear inversion.
    pub fn invert_quadratic(
        &self,
        a: f64,
        b: f64,
        c: f64,
        y: f64,
        range: Option<CalibrationRange>,
    ) -> Inversion {
        let Some(range) = range else {
            return Inversion::invalid(PredictionStatus::InvalidCalculationFailed);
        };
        if a == 0.0 {
            return self.invert_linear(b, c, y, Some(range));
        }

        let c = c - y;
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return Inversion::invalid(PredictionStatus::InvalidNoRealSolution);
        }

        let (root1, root2) = quadratic_roots(a, b, c, discriminant);
        let in1 = range.contains(root1);
        let in2 = range.contains(root2);

        match (in1, in2) {
            (true, false) => self.classify(root1, range, true),
            (false, true) => self.classify(root2, range, true),
            (both, _) => {
                let chosen = self.pick_root(root1, root2);
                self.classify(chosen, range, both)
            }
        }
    }

    fn pick_root(&self, root1: f64, root2: f64) -> f64 {
        let smallest_magnitude = if root1.abs() < root2.abs() { root1 } else { root2 };
        match self.policy.root_selection {
            RootSelection::SmallestMagnitude => smallest_magnitude,
            RootSelection::SmallestPositive => match (root1 >= 0.0, root2 >= 0.0) {
                (true, true) => root1.min(root2),
                (true, false) => root1,
                (false, true) => root2,
                (false, false) => smallest_magnitude,
            },
        }
    }

    /// Invert one model at response `y`
    pub fn invert(&self, model: &RegressionModel, y: f64, range: Option<CalibrationRange>) -> Inversion {
        match model.coefficients {
            Coefficients::Linear { m, b } => self.invert_linear(m, b, y, range),
            Coefficients::Quadratic { a, b, c } => self.invert_quadratic(a, b, c, y, range),
        }
    }

    /// Predictions for one sample region, one per regression it has a response for
    ///
    /// `range` comes from the calibration regions of the request; when there
    /// are none, each model is classified against the range it was fitted on.
    pub fn predict_region(
        &self,
        region: &RegionSample,
        regressions: &[MetricRegression],
        range: Option<CalibrationRange>,
        catalog: &MetricCatalog,
    ) -> Vec<PredictionResult> {
        regressions
            .iter()
            .filter_map(|regression| {
                let y = region.response(&regression.metric_key)?;
                let model = self.select_best(&regression.models)?;
                let inversion = self.invert(model, y, range.or(model.quality.range));
                debug!(
                    region_id = region.id,
                    metric = %regression.metric_key,
                    concentration = ?inversion.concentration,
                    status = ?inversion.status,
                    "concentration predicted"
                );
                Some(PredictionResult {
                    concentration: inversion.concentration,
                    status: inversion.status,
                    metric_key: regression.metric_key.clone(),
                    model_used: model.kind(),
                    r2: model.r2,
                    equation: model.equation(),
                    system: catalog
                        .system_for_key(&regression.metric_key)
                        .unwrap_or(UNKNOWN_SYSTEM)
                        .to_string(),
                })
            })
            .collect()
    }

    /// Fill `predicted_concentrations` of every sample region
    ///
    /// The calibration range spans the concentrations of the calibration
    /// regions in the same slice, falling back to the range attached to each
    /// model when the slice holds only samples.
    pub fn predict_samples(
        &self,
        regions: &mut [RegionSample],
        regressions: &[MetricRegression],
        catalog: &MetricCatalog,
    ) -> usize {
        let range = CalibrationRange::from_concentrations(
            regions
                .iter()
                .filter(|r| r.is_calibration_point())
                .filter_map(|r| r.concentration),
        );

        let mut total = 0;
        for region in regions.iter_mut().filter(|r| r.is_sample) {
            region.predicted_concentrations = self.predict_region(region, regressions, range, catalog);
            total += region.predicted_concentrations.len();
        }
        info!(predictions = total, ?range, "sample concentrations predicted");
        total
    }
}

/// Roots `((-b + √d) / 2a, (-b - √d) / 2a)` of `a·x² + b·x + c`, `a ≠ 0`
///
/// Computed through `q = -(b + sign(b)·√d) / 2` so that a nearly flat
/// parabola does not lose its small root to cancellation.
fn quadratic_roots(a: f64, b: f64, c: f64, discriminant: f64) -> (f64, f64) {
    let q = -0.5 * (b + b.signum() * discriminant.sqrt());
    if q == 0.0 {
        return (0.0, 0.0);
    }
    let (far, near) = (q / a, c / q);
    if b.is_sign_negative() {
        (far, near)
    } else {
        (near, far)
    }
}

/// Prediction to present for a sample: the first valid one, otherwise the
/// one with the highest R²
pub fn best_prediction(predictions: &[PredictionResult]) -> Option<&PredictionResult> {
    predictions
        .iter()
        .find(|p| p.status.is_valid())
        .or_else(|| {
            predictions
                .iter()
                .fold(None, |best: Option<&PredictionResult>, p| match best {
                    Some(b) if b.r2 >= p.r2 => Some(b),
                    _ => Some(p),
                })
        })
}
