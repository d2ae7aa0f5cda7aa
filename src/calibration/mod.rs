//! Calibration curves and concentration prediction
//!
//! Regression models are fitted to (concentration, response) pairs taken
//! from calibration regions, annotated with analytical quality parameters,
//! and inverted to estimate the concentration of unknown samples.

pub mod prediction;
pub mod quality;
pub mod regression;

pub use prediction::{
    best_prediction, ConcentrationPredictor, Inversion, NegativePolicy, PredictionPolicy,
    PredictionResult, PredictionStatus, RootSelection, TieBreak,
};
pub use quality::{CalibrationRange, QualityFactors, QualityParameter, QualityParameters};
pub use regression::{
    linear_regression, quadratic_regression, Coefficients, DataPoint, LinearFit, MetricRegression,
    ModelKind, QuadraticFit, RegressionEngine, RegressionModel,
};
