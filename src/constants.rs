//! Colorimetric constants and analytical thresholds
//!
//! This module contains compile-time constants for color conversion
//! and calibration statistics, based on the relevant standards.

/// D65 Standard Illuminant Reference
///
/// CIE Standard Illuminant D65 represents average daylight with a correlated
/// color temperature of 6504K. This is the standard reference for sRGB.
pub mod d65 {
    /// D65 white point in CIE XYZ color space (Y normalized to 1)
    /// Source: CIE 15:2004 Colorimetry, 3rd edition
    pub const WHITE_POINT_XYZ: [f64; 3] = [0.95047, 1.00000, 1.08883];
}

/// Re-export D65 white point at top level for convenience
pub const D65_WHITE_POINT_XYZ: [f64; 3] = d65::WHITE_POINT_XYZ;

/// sRGB transfer function and primaries
pub mod srgb {
    /// Encoded value below which the transfer curve is linear
    pub const LINEAR_THRESHOLD: f64 = 0.04045;

    /// Slope of the linear segment
    pub const LINEAR_SLOPE: f64 = 12.92;

    /// Exponent of the power segment
    pub const GAMMA: f64 = 2.4;

    /// Linear sRGB to XYZ, four decimals (used by the Lab path)
    pub const TO_XYZ_LAB: [[f64; 3]; 3] = [
        [0.4124, 0.3576, 0.1805],
        [0.2126, 0.7152, 0.0722],
        [0.0193, 0.1192, 0.9505],
    ];

    /// Linear sRGB to XYZ, seven decimals (used by the standalone XYZ path)
    pub const TO_XYZ: [[f64; 3]; 3] = [
        [0.4124564, 0.3575761, 0.1804375],
        [0.2126729, 0.7151522, 0.0721750],
        [0.0193339, 0.1191920, 0.9503041],
    ];
}

/// CIE L*a*b* companding
pub mod cielab {
    /// Ratio below which the cube root is replaced by a line
    pub const EPSILON: f64 = 0.008856;

    /// Slope of the linear segment
    pub const KAPPA_SLOPE: f64 = 7.787;

    /// Offset of the linear segment
    pub const OFFSET: f64 = 16.0 / 116.0;
}

/// ITU-R BT.601 full-range YCbCr coefficients
pub mod bt601 {
    pub const KR: f64 = 0.299;
    pub const KG: f64 = 0.587;
    pub const KB: f64 = 0.114;
    pub const CHROMA_OFFSET: f64 = 128.0;
}

/// Hunter Lab coefficients for D65 (X, Z scaled against Y)
pub mod hunter {
    pub const KA: f64 = 17.5;
    pub const KB: f64 = 7.0;
    pub const X_SCALE: f64 = 1.02;
    pub const Z_SCALE: f64 = 0.847;
}

/// Calibration statistics
pub mod statistics {
    /// LOD multiplier applied to Syx / |slope|
    pub const LOD_FACTOR: f64 = 3.3;

    /// LOQ multiplier applied to Syx / |slope|
    pub const LOQ_FACTOR: f64 = 10.0;

    /// Parameters of a linear model
    pub const LINEAR_PARAMETERS: usize = 2;

    /// Parameters of a quadratic model
    pub const QUADRATIC_PARAMETERS: usize = 3;

    /// Minimum points for a linear fit
    pub const MIN_LINEAR_POINTS: usize = 2;

    /// Minimum points for a quadratic fit
    pub const MIN_QUADRATIC_POINTS: usize = 3;
}
