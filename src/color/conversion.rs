//! Color space conversion utilities
//!
//! Maps an average sRGB triple (channels in [0, 255]) to every color
//! representation the analytical metrics read from:
//! - HSV / HSL (hue in degrees, other channels in percent)
//! - CIE L*a*b* (D65) and its polar derivatives (C*, h_ab, cos h, sin h)
//! - CIE XYZ scaled to 0-100
//! - YCbCr (ITU-R BT.601 full range)
//! - CMYK (percent)
//! - Hunter Lab
//!
//! Every conversion is total over [0, 255]^3 and deterministic.

use palette::{FromColor, Lab, Lch, Srgb};
use serde::{Deserialize, Serialize};

use crate::constants::{bt601, cielab, hunter, srgb, D65_WHITE_POINT_XYZ};

/// Mean sRGB of a region, channels in [0, 255]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeanRgb {
    pub avg_r: f64,
    pub avg_g: f64,
    pub avg_b: f64,
    /// Mean of the three channel means
    #[serde(rename = "avgRGB")]
    pub avg_rgb: f64,
}

impl MeanRgb {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self {
            avg_r: r,
            avg_g: g,
            avg_b: b,
            avg_rgb: (r + g + b) / 3.0,
        }
    }

    /// Sum of the three channel means
    pub fn sum(&self) -> f64 {
        self.avg_r + self.avg_g + self.avg_b
    }
}

/// Per-channel population standard deviation of a region
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RgbStdDev {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

/// CIE L*a*b* under D65
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CieLab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// CIE XYZ scaled so that white has Y = 100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CieXyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YCbCr {
    pub y: f64,
    pub cb: f64,
    pub cr: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cmyk {
    pub c: f64,
    pub m: f64,
    pub y: f64,
    pub k: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HunterLab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// Polar form of the a*b* plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabPolar {
    /// Chroma C*
    pub c_star: f64,
    /// Hue angle in degrees, [0, 360)
    pub h_ab: f64,
    pub h_cos: f64,
    pub h_sin: f64,
}

/// All representations derived from one mean RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorRepresentations {
    pub hsv: Hsv,
    pub hsl: Hsl,
    pub lab: CieLab,
    pub xyz: CieXyz,
    pub ycbcr: YCbCr,
    pub cmyk: Cmyk,
    pub hunter_lab: HunterLab,
    pub derived: LabPolar,
}

/// Stateless converter from mean sRGB to analytical color spaces
#[derive(Debug, Clone, Copy)]
pub struct ColorConverter {
    /// Reference white used by the Lab path
    white_point: [f64; 3],
}

impl Default for ColorConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorConverter {
    /// Create a new color converter with D65 as reference white
    pub fn new() -> Self {
        Self {
            white_point: D65_WHITE_POINT_XYZ,
        }
    }

    /// Compute every representation at once
    pub fn convert_all(&self, rgb: &MeanRgb) -> ColorRepresentations {
        let lab = self.rgb_to_lab(rgb);
        ColorRepresentations {
            hsv: self.rgb_to_hsv(rgb),
            hsl: self.rgb_to_hsl(rgb),
            lab,
            xyz: self.rgb_to_xyz(rgb),
            ycbcr: self.rgb_to_ycbcr(rgb),
            cmyk: self.rgb_to_cmyk(rgb),
            hunter_lab: self.rgb_to_hunter_lab(rgb),
            derived: self.lab_polar(&lab),
        }
    }

    /// Convert RGB to HSV (hue in degrees, S and V in percent)
    pub fn rgb_to_hsv(&self, rgb: &MeanRgb) -> Hsv {
        let (r, g, b) = unit_channels(rgb);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let d = max - min;

        let s = if max == 0.0 { 0.0 } else { d / max };
        let h = hexcone_hue(r, g, b, max, d);

        Hsv {
            h,
            s: s * 100.0,
            v: max * 100.0,
        }
    }

    /// Convert RGB to HSL (hue in degrees, S and L in percent)
    pub fn rgb_to_hsl(&self, rgb: &MeanRgb) -> Hsl {
        let (r, g, b) = unit_channels(rgb);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let d = max - min;
        let l = (max + min) / 2.0;

        let s = if d == 0.0 {
            0.0
        } else if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };

        Hsl {
            h: hexcone_hue(r, g, b, max, d),
            s: s * 100.0,
            l: l * 100.0,
        }
    }

    /// Convert RGB to CIE L*a*b* (D65)
    pub fn rgb_to_lab(&self, rgb: &MeanRgb) -> CieLab {
        let [x, y, z] = linear_to_xyz(linearize(rgb), &srgb::TO_XYZ_LAB);

        let fx = lab_compand(x / self.white_point[0]);
        let fy = lab_compand(y / self.white_point[1]);
        let fz = lab_compand(z / self.white_point[2]);

        CieLab {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }

    /// Convert RGB to CIE XYZ scaled to 0-100
    pub fn rgb_to_xyz(&self, rgb: &MeanRgb) -> CieXyz {
        let [x, y, z] = linear_to_xyz(linearize(rgb), &srgb::TO_XYZ);
        CieXyz {
            x: x * 100.0,
            y: y * 100.0,
            z: z * 100.0,
        }
    }

    /// Convert RGB to full-range BT.601 YCbCr
    pub fn rgb_to_ycbcr(&self, rgb: &MeanRgb) -> YCbCr {
        let (r, g, b) = (rgb.avg_r, rgb.avg_g, rgb.avg_b);
        YCbCr {
            y: bt601::KR * r + bt601::KG * g + bt601::KB * b,
            cb: bt601::CHROMA_OFFSET - 0.168736 * r - 0.331264 * g + 0.5 * b,
            cr: bt601::CHROMA_OFFSET + 0.5 * r - 0.418688 * g - 0.081312 * b,
        }
    }

    /// Convert RGB to CMYK in percent
    pub fn rgb_to_cmyk(&self, rgb: &MeanRgb) -> Cmyk {
        let (r, g, b) = unit_channels(rgb);
        let k = 1.0 - r.max(g).max(b);
        if k == 1.0 {
            return Cmyk {
                c: 0.0,
                m: 0.0,
                y: 0.0,
                k: 100.0,
            };
        }

        let scale = 1.0 - k;
        Cmyk {
            c: (1.0 - r - k) / scale * 100.0,
            m: (1.0 - g - k) / scale * 100.0,
            y: (1.0 - b - k) / scale * 100.0,
            k: k * 100.0,
        }
    }

    /// Convert RGB to Hunter Lab via the 0-100 XYZ
    pub fn rgb_to_hunter_lab(&self, rgb: &MeanRgb) -> HunterLab {
        let CieXyz { x, y, z } = self.rgb_to_xyz(rgb);
        if y == 0.0 {
            return HunterLab {
                l: 0.0,
                a: 0.0,
                b: 0.0,
            };
        }

        let sqrt_y = y.sqrt();
        HunterLab {
            l: 10.0 * sqrt_y,
            a: hunter::KA * ((hunter::X_SCALE * x - y) / sqrt_y),
            b: hunter::KB * ((y - hunter::Z_SCALE * z) / sqrt_y),
        }
    }

    /// Derive chroma and hue from a*b*
    pub fn lab_polar(&self, lab: &CieLab) -> LabPolar {
        let lch: Lch<palette::white_point::D65, f64> =
            Lch::from_color(Lab::<palette::white_point::D65, f64>::new(lab.l, lab.a, lab.b));

        let hue_rad = lch.hue.into_radians();
        let mut h_ab = lch.hue.into_positive_degrees();
        // guard against rounding -0.0 up to a full turn
        if h_ab >= 360.0 {
            h_ab -= 360.0;
        }

        LabPolar {
            c_star: lch.chroma,
            h_ab,
            h_cos: hue_rad.cos(),
            h_sin: hue_rad.sin(),
        }
    }

    /// Convert the mean color to a hexadecimal string (e.g. "#FF0000")
    pub fn rgb_to_hex(&self, rgb: &MeanRgb) -> String {
        let srgb = Srgb::new(rgb.avg_r / 255.0, rgb.avg_g / 255.0, rgb.avg_b / 255.0);
        let srgb: Srgb<u8> = srgb.into_format();
        format!("#{:02X}{:02X}{:02X}", srgb.red, srgb.green, srgb.blue)
    }
}

fn unit_channels(rgb: &MeanRgb) -> (f64, f64, f64) {
    (rgb.avg_r / 255.0, rgb.avg_g / 255.0, rgb.avg_b / 255.0)
}

/// Hexcone hue in degrees, 0 for achromatic input
fn hexcone_hue(r: f64, g: f64, b: f64, max: f64, d: f64) -> f64 {
    if d == 0.0 {
        return 0.0;
    }
    let sector = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    let hue = sector * 60.0;
    if hue >= 360.0 {
        hue - 360.0
    } else {
        hue
    }
}

fn srgb_decode(c: f64) -> f64 {
    if c > srgb::LINEAR_THRESHOLD {
        ((c + 0.055) / 1.055).powf(srgb::GAMMA)
    } else {
        c / srgb::LINEAR_SLOPE
    }
}

fn linearize(rgb: &MeanRgb) -> [f64; 3] {
    let (r, g, b) = unit_channels(rgb);
    [srgb_decode(r), srgb_decode(g), srgb_decode(b)]
}

fn linear_to_xyz(linear: [f64; 3], matrix: &[[f64; 3]; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (row, value) in matrix.iter().zip(out.iter_mut()) {
        *value = row[0] * linear[0] + row[1] * linear[1] + row[2] * linear[2];
    }
    out
}

fn lab_compand(t: f64) -> f64 {
    if t > cielab::EPSILON {
        t.cbrt()
    } else {
        cielab::KAPPA_SLOPE * t + cielab::OFFSET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn rgb(r: f64, g: f64, b: f64) -> MeanRgb {
        MeanRgb::new(r, g, b)
    }

    #[test]
    fn test_rgb_to_hsv_red_and_grey() {
        let converter = ColorConverter::new();
        let red = converter.rgb_to_hsv(&rgb(255.0, 0.0, 0.0));
        assert_abs_diff_eq!(red.h, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(red.s, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(red.v, 100.0, epsilon = 1e-9);

        let grey = converter.rgb_to_hsv(&rgb(128.0, 128.0, 128.0));
        assert_abs_diff_eq!(grey.h, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(grey.s, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(grey.v, 50.2, epsilon = 0.01);
    }

    #[test]
    fn test_rgb_to_hsl_red_and_grey() {
        let converter = ColorConverter::new();
        let red = converter.rgb_to_hsl(&rgb(255.0, 0.0, 0.0));
        assert_abs_diff_eq!(red.h, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(red.s, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(red.l, 50.0, epsilon = 1e-9);

        let grey = converter.rgb_to_hsl(&rgb(128.0, 128.0, 128.0));
        assert_abs_diff_eq!(grey.s, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(grey.l, 50.2, epsilon = 0.01);
    }

    #[test]
    fn test_hue_sectors() {
        let converter = ColorConverter::new();
        assert_abs_diff_eq!(converter.rgb_to_hsv(&rgb(0.0, 255.0, 0.0)).h, 120.0, epsilon = 1e-9);
        assert_abs_diff_eq!(converter.rgb_to_hsv(&rgb(0.0, 0.0, 255.0)).h, 240.0, epsilon = 1e-9);
        assert_abs_diff_eq!(converter.rgb_to_hsv(&rgb(255.0, 0.0, 255.0)).h, 300.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rgb_to_lab_reference_values() {
        let converter = ColorConverter::new();
        let red = converter.rgb_to_lab(&rgb(255.0, 0.0, 0.0));
        assert_abs_diff_eq!(red.l, 53.24, epsilon = 0.05);
        assert_abs_diff_eq!(red.a, 80.09, epsilon = 0.05);
        assert_abs_diff_eq!(red.b, 67.20, epsilon = 0.05);

        let blue = converter.rgb_to_lab(&rgb(45.0, 85.0, 210.0));
        assert_abs_diff_eq!(blue.l, 40.75, epsilon = 0.01);
        assert_abs_diff_eq!(blue.a, 31.26, epsilon = 0.01);
        assert_abs_diff_eq!(blue.b, -68.28, epsilon = 0.01);
    }

    #[test]
    fn test_rgb_to_lab_agrees_with_palette() {
        let converter = ColorConverter::new();
        let ours = converter.rgb_to_lab(&rgb(45.0, 85.0, 210.0));
        let theirs: Lab<palette::white_point::D65, f64> =
            Lab::from_color(Srgb::new(45.0 / 255.0, 85.0 / 255.0, 210.0 / 255.0));
        assert_abs_diff_eq!(ours.l, theirs.l, epsilon = 0.05);
        assert_abs_diff_eq!(ours.a, theirs.a, epsilon = 0.1);
        assert_abs_diff_eq!(ours.b, theirs.b, epsilon = 0.1);
    }

    #[test]
    fn test_rgb_to_xyz_white() {
        let converter = ColorConverter::new();
        let white = converter.rgb_to_xyz(&rgb(255.0, 255.0, 255.0));
        assert_abs_diff_eq!(white.x, 95.047, epsilon = 0.01);
        assert_abs_diff_eq!(white.y, 100.0, epsilon = 0.01);
        assert_abs_diff_eq!(white.z, 108.883, epsilon = 0.01);
    }

    #[test]
    fn test_rgb_to_ycbcr_red() {
        let converter = ColorConverter::new();
        let red = converter.rgb_to_ycbcr(&rgb(255.0, 0.0, 0.0));
        assert_abs_diff_eq!(red.y, 76.245, epsilon = 0.01);
        assert_abs_diff_eq!(red.cb, 84.97, epsilon = 0.01);
        assert_abs_diff_eq!(red.cr, 255.5, epsilon = 0.01);
    }

    #[test]
    fn test_rgb_to_cmyk() {
        let converter = ColorConverter::new();
        let black = converter.rgb_to_cmyk(&rgb(0.0, 0.0, 0.0));
        assert_eq!((black.c, black.m, black.y, black.k), (0.0, 0.0, 0.0, 100.0));

        let red = converter.rgb_to_cmyk(&rgb(255.0, 0.0, 0.0));
        assert_abs_diff_eq!(red.c, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(red.m, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(red.y, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(red.k, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_hunter_lab_black_and_white() {
        let converter = ColorConverter::new();
        let black = converter.rgb_to_hunter_lab(&rgb(0.0, 0.0, 0.0));
        assert_eq!((black.l, black.a, black.b), (0.0, 0.0, 0.0));

        let white = converter.rgb_to_hunter_lab(&rgb(255.0, 255.0, 255.0));
        assert_abs_diff_eq!(white.l, 100.0, epsilon = 0.01);
        assert_abs_diff_eq!(white.a, -5.34, epsilon = 0.01);
        assert_abs_diff_eq!(white.b, 5.44, epsilon = 0.01);
    }

    #[test]
    fn test_lab_polar_quadrants() {
        let converter = ColorConverter::new();
        let polar = converter.lab_polar(&CieLab { l: 50.0, a: 0.0, b: -10.0 });
        assert_abs_diff_eq!(polar.c_star, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(polar.h_ab, 270.0, epsilon = 1e-9);
        assert_abs_diff_eq!(polar.h_cos, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(polar.h_sin, -1.0, epsilon = 1e-9);

        let polar = converter.lab_polar(&CieLab { l: 50.0, a: 3.0, b: 4.0 });
        assert_abs_diff_eq!(polar.c_star, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(polar.h_cos, 0.6, epsilon = 1e-9);
        assert_abs_diff_eq!(polar.h_sin, 0.8, epsilon = 1e-9);
    }

    #[test]
    fn test_rgb_to_hex() {
        let converter = ColorConverter::new();
        assert_eq!(converter.rgb_to_hex(&rgb(255.0, 0.0, 0.0)), "#FF0000");
        assert_eq!(converter.rgb_to_hex(&rgb(0.0, 128.0, 255.0)), "#0080FF");
    }

    proptest! {
        #[test]
        fn prop_cmyk_full_black_only_for_black(r in 0u8..=255, g in 0u8..=255, b in 0u8..=255) {
            let converter = ColorConverter::new();
            let cmyk = converter.rgb_to_cmyk(&rgb(r as f64, g as f64, b as f64));
            let is_black = r == 0 && g == 0 && b == 0;
            prop_assert_eq!(cmyk.k == 100.0, is_black);
            if is_black {
                prop_assert_eq!((cmyk.c, cmyk.m, cmyk.y), (0.0, 0.0, 0.0));
            }
        }

        #[test]
        fn prop_ranges_hold(r in 0.0f64..=255.0, g in 0.0f64..=255.0, b in 0.0f64..=255.0) {
            let converter = ColorConverter::new();
            let all = converter.convert_all(&rgb(r, g, b));
            prop_assert!(all.hsv.h >= 0.0 && all.hsv.h < 360.0);
            prop_assert!(all.hsl.h >= 0.0 && all.hsl.h < 360.0);
            prop_assert!(all.derived.h_ab >= 0.0 && all.derived.h_ab < 360.0);
            prop_assert!(all.hsv.s >= 0.0 && all.hsv.s <= 100.0 + 1e-9);
            prop_assert!(all.hsl.l >= 0.0 && all.hsl.l <= 100.0 + 1e-9);
            prop_assert!(all.derived.c_star >= 0.0);
        }
    }
}
