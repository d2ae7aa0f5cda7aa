//! Calibration curve fitting
//!
//! Linear least squares from the five running sums, and a quadratic fit
//! from the 3x3 normal equations solved by Gauss-Jordan elimination with
//! partial pivoting. Degenerate input yields a degenerate model (zero
//! coefficients or R² = 0) instead of an error.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::quality::{
    calibration_range, detection_limits, linear_standard_errors, regression_standard_error,
    QualityFactors, QualityParameters,
};
use crate::constants::statistics::{
    MIN_LINEAR_POINTS, MIN_QUADRATIC_POINTS, QUADRATIC_PARAMETERS,
};
use crate::region::RegionSample;

/// One (concentration, response) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

impl DataPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// `y = m·x + b`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinearFit {
    pub m: f64,
    pub b: f64,
    pub r2: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.m * x + self.b
    }
}

/// `y = a·x² + b·x + c`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QuadraticFit {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub r2: f64,
}

impl QuadraticFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.a * x * x + self.b * x + self.c
    }
}

/// Ordinary least squares line
///
/// Fewer than two points, or no spread in x, gives a flat model with R² = 0.
pub fn linear_regression(points: &[DataPoint]) -> LinearFit {
    let n = points.len();
    if n < MIN_LINEAR_POINTS {
        warn!(points = n, "linear regression needs at least two points");
        return LinearFit::default();
    }

    let nf = n as f64;
    let (mut sx, mut sy, mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for p in points {
        sx += p.x;
        sy += p.y;
        sxy += p.x * p.y;
        sxx += p.x * p.x;
        syy += p.y * p.y;
    }

    let sxx_term = nf * sxx - sx * sx;
    let sxy_term = nf * sxy - sx * sy;
    let syy_term = nf * syy - sy * sy;

    if sxx_term == 0.0 {
        warn!("linear regression: all concentrations are equal");
        return LinearFit {
            m: 0.0,
            b: sy / nf,
            r2: 0.0,
        };
    }

    let m = sxy_term / sxx_term;
    let b = (sy - m * sx) / nf;
    let denominator = sxx_term * syy_term;
    let r2 = if denominator == 0.0 {
        warn!("linear regression: no variation in responses, R² set to 0");
        0.0
    } else {
        sxy_term * sxy_term / denominator
    };

    debug!(m, b, r2, "linear fit");
    LinearFit { m, b, r2 }
}

/// Least squares parabola
///
/// Fewer than three points or a singular normal matrix gives the zero model.
pub fn quadratic_regression(points: &[DataPoint]) -> QuadraticFit {
    let n = points.len();
    if n < MIN_QUADRATIC_POINTS {
        warn!(points = n, "quadratic regression needs at least three points");
        return QuadraticFit::default();
    }

    let (mut sx, mut sy, mut sx2, mut sx3, mut sx4, mut sxy, mut sx2y) =
        (0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    for p in points {
        let x2 = p.x * p.x;
        sx += p.x;
        sy += p.y;
        sx2 += x2;
        sx3 += x2 * p.x;
        sx4 += x2 * x2;
        sxy += p.x * p.y;
        sx2y += x2 * p.y;
    }

    let matrix = [[sx4, sx3, sx2], [sx3, sx2, sx], [sx2, sx, n as f64]];
    let Some([a, b, c]) = solve_3x3(matrix, [sx2y, sxy, sy]) else {
        warn!("quadratic regression: singular normal matrix");
        return QuadraticFit::default();
    };

    let fit = QuadraticFit { a, b, c, r2: 0.0 };
    let mean_y = sy / n as f64;
    let (ss_tot, ss_res) = points.iter().fold((0.0, 0.0), |(tot, res), p| {
        (tot + (p.y - mean_y).powi(2), res + (p.y - fit.predict(p.x)).powi(2))
    });
    let r2 = if ss_tot == 0.0 { 0.0 } else { 1.0 - ss_res / ss_tot };

    debug!(a, b, c, r2, "quadratic fit");
    QuadraticFit { r2, ..fit }
}

/// Gauss-Jordan elimination with partial pivoting; `None` on a zero pivot
fn solve_3x3(mut m: [[f64; 3]; 3], mut rhs: [f64; 3]) -> Option<[f64; 3]> {
    for col in 0..3 {
        let pivot = (col..3)
            .max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))
            .unwrap_or(col);
        m.swap(col, pivot);
        rhs.swap(col, pivot);

        let div = m[col][col];
        if div == 0.0 {
            return None;
        }
        for k in col..3 {
            m[col][k] /= div;
        }
        rhs[col] /= div;

        for row in 0..3 {
            if row == col {
                continue;
            }
            let factor = m[row][col];
            for k in col..3 {
                m[row][k] -= factor * m[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }
    Some(rhs)
}

/// Model family of a fitted curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Linear,
    #[serde(alias = "polynomial")]
    Quadratic,
}

/// Coefficients tagged by model family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coefficients", rename_all = "lowercase")]
pub enum Coefficients {
    Linear { m: f64, b: f64 },
    #[serde(alias = "polynomial")]
    Quadratic { a: f64, b: f64, c: f64 },
}

/// A fitted calibration curve with its quality parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionModel {
    #[serde(flatten)]
    pub coefficients: Coefficients,
    pub r2: f64,
    #[serde(default)]
    pub quality: QualityParameters,
}

impl RegressionModel {
    pub fn kind(&self) -> ModelKind {
        match self.coefficients {
            Coefficients::Linear { .. } => ModelKind::Linear,
            Coefficients::Quadratic { .. } => ModelKind::Quadratic,
        }
    }

    /// Response predicted at concentration `x`
    pub fn predict(&self, x: f64) -> f64 {
        match self.coefficients {
            Coefficients::Linear { m, b } => m * x + b,
            Coefficients::Quadratic { a, b, c } => a * x * x + b * x + c,
        }
    }

    /// Human-readable equation with four decimals
    pub fn equation(&self) -> String {
        match self.coefficients {
            Coefficients::Linear { m, b } => format!("y = {:.4}x + {:.4}", m, b),
            Coefficients::Quadratic { a, b, c } => {
                format!("y = {:.4}x² + {:.4}x + {:.4}", a, b, c)
            }
        }
    }
}

/// Both fitted models for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRegression {
    /// Display key of the metric the responses came from
    pub metric_key: String,
    /// Linear model first, then quadratic
    pub models: Vec<RegressionModel>,
}

/// Fits calibration curves and attaches quality parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct RegressionEngine {
    factors: QualityFactors,
}

impl RegressionEngine {
    pub fn new(factors: QualityFactors) -> Self {
        Self { factors }
    }

    /// Linear model with quality parameters
    ///
    /// The calibration range is always attached; standard errors and
    /// detection limits need more than two points.
    pub fn fit_linear(&self, points: &[DataPoint]) -> RegressionModel {
        let fit = linear_regression(points);
        let mut quality = QualityParameters {
            range: calibration_range(points),
            ..Default::default()
        };
        if let Some(errors) = linear_standard_errors(points, &fit) {
            let (lod, loq) = detection_limits(Some(errors.syx), fit.m, &self.factors);
            quality.syx = Some(errors.syx);
            quality.sm = Some(errors.sm);
            quality.sb = Some(errors.sb);
            quality.lod = lod;
            quality.loq = loq;
        }
        RegressionModel {
            coefficients: Coefficients::Linear { m: fit.m, b: fit.b },
            r2: fit.r2,
            quality,
        }
    }

    /// Quadratic model with quality parameters
    ///
    /// Syx needs more than three points; LOD and LOQ are never reported.
    pub fn fit_quadratic(&self, points: &[DataPoint]) -> RegressionModel {
        let fit = quadratic_regression(points);
        let quality = QualityParameters {
            syx: regression_standard_error(points, |x| fit.predict(x), QUADRATIC_PARAMETERS),
            range: calibration_range(points),
            ..Default::default()
        };
        RegressionModel {
            coefficients: Coefficients::Quadratic {
                a: fit.a,
                b: fit.b,
                c: fit.c,
            },
            r2: fit.r2,
            quality,
        }
    }

    /// Fit both models for every selected metric key
    ///
    /// Points come from calibration regions that carry a response under the
    /// key; keys with fewer than two points are skipped.
    pub fn generate(
        &self,
        calibration_regions: &[RegionSample],
        metric_keys: &[String],
    ) -> Vec<MetricRegression> {
        let regressions: Vec<MetricRegression> = metric_keys
            .iter()
            .filter_map(|key| {
                let points = collect_points(calibration_regions, key);
                if points.len() < MIN_LINEAR_POINTS {
                    debug!(metric = %key, points = points.len(), "not enough calibration points");
                    return None;
                }
                Some(MetricRegression {
                    metric_key: key.clone(),
                    models: vec![self.fit_linear(&points), self.fit_quadratic(&points)],
                })
            })
            .collect();

        info!(
            requested = metric_keys.len(),
            generated = regressions.len(),
            "regressions generated"
        );
        regressions
    }
}

/// (concentration, response) pairs for one metric key
///
/// Regions not flagged for calibration contribute nothing.
pub fn collect_points(regions: &[RegionSample], key: &str) -> Vec<DataPoint> {
    regions
        .iter()
        .filter(|r| r.use_in_calibration)
        .filter_map(|r| Some(DataPoint::new(r.concentration?, r.response(key)?)))
        .collect()
}
