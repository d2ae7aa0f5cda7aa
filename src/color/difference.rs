//! Perceptual color difference in CIE L*a*b*
//!
//! `ciede2000` implements the CIE 2000 color-difference formula with unit
//! parametric factors (kL = kC = kH = 1), following Sharma, Wu & Dalal (2005).
//! `delta_e76` is the plain Euclidean distance, kept for quick comparisons.

use std::f64::consts::PI;

use super::conversion::CieLab;

/// 25^7, the chroma pivot of the G and R_T terms
const POW25_7: f64 = 6_103_515_625.0;

/// Hue angle of (a, b) in degrees, normalized to [0, 360)
fn hue_degrees(a: f64, b: f64) -> f64 {
    if a == 0.0 && b == 0.0 {
        return 0.0;
    }
    let h = b.atan2(a).to_degrees();
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

/// CIEDE2000 color difference between a reference and a sample color
pub fn ciede2000(reference: &CieLab, sample: &CieLab) -> f64 {
    let (l1, a1, b1) = (reference.l, reference.a, reference.b);
    let (l2, a2, b2) = (sample.l, sample.a, sample.b);

    let c1 = a1.hypot(b1);
    let c2 = a2.hypot(b2);
    let c_bar7 = ((c1 + c2) / 2.0).powi(7);
    let g = 0.5 * (1.0 - (c_bar7 / (c_bar7 + POW25_7)).sqrt());

    let a1_prime = (1.0 + g) * a1;
    let a2_prime = (1.0 + g) * a2;
    let c1_prime = a1_prime.hypot(b1);
    let c2_prime = a2_prime.hypot(b2);
    let h1_prime = hue_degrees(a1_prime, b1);
    let h2_prime = hue_degrees(a2_prime, b2);

    let chroma_product = c1_prime * c2_prime;

    let delta_l_prime = l2 - l1;
    let delta_c_prime = c2_prime - c1_prime;
    let delta_h_prime = if chroma_product == 0.0 {
        0.0
    } else {
        let dh = h2_prime - h1_prime;
        if dh > 180.0 {
            dh - 360.0
        } else if dh < -180.0 {
            dh + 360.0
        } else {
            dh
        }
    };
    let delta_big_h_prime = 2.0 * chroma_product.sqrt() * (delta_h_prime.to_radians() / 2.0).sin();

    let l_bar_prime = (l1 + l2) / 2.0;
    let c_bar_prime = (c1_prime + c2_prime) / 2.0;
    let h_sum = h1_prime + h2_prime;
    let h_bar_prime = if chroma_product == 0.0 {
        h_sum
    } else if (h1_prime - h2_prime).abs() <= 180.0 {
        h_sum / 2.0
    } else if h_sum < 360.0 {
        (h_sum + 360.0) / 2.0
    } else {
        (h_sum - 360.0) / 2.0
    };

    let t = 1.0 - 0.17 * (h_bar_prime - 30.0).to_radians().cos()
        + 0.24 * (2.0 * h_bar_prime).to_radians().cos()
        + 0.32 * (3.0 * h_bar_prime + 6.0).to_radians().cos()
        - 0.20 * (4.0 * h_bar_prime - 63.0).to_radians().cos();

    let l_offset_sq = (l_bar_prime - 50.0).powi(2);
    let s_l = 1.0 + 0.015 * l_offset_sq / (20.0 + l_offset_sq).sqrt();
    let s_c = 1.0 + 0.045 * c_bar_prime;
    let s_h = 1.0 + 0.015 * c_bar_prime * t;

    let c_bar_prime7 = c_bar_prime.powi(7);
    let delta_theta = 30.0 * (-((h_bar_prime - 275.0) / 25.0).powi(2)).exp();
    let r_c = 2.0 * (c_bar_prime7 / (c_bar_prime7 + POW25_7)).sqrt();
    let r_t = -r_c * (2.0 * delta_theta * PI / 180.0).sin();

    let dl = delta_l_prime / s_l;
    let dc = delta_c_prime / s_c;
    let dh = delta_big_h_prime / s_h;

    (dl * dl + dc * dc + dh * dh + r_t * dc * dh).sqrt()
}

/// Euclidean (CIE76) color difference
pub fn delta_e76(reference: &CieLab, sample: &CieLab) -> f64 {
    let dl = reference.l - sample.l;
    let da = reference.a - sample.a;
    let db = reference.b - sample.b;
    (dl * dl + da * da + db * db).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn lab(l: f64, a: f64, b: f64) -> CieLab {
        CieLab { l, a, b }
    }

    #[test]
    fn test_ciede2000_reference_pair() {
        let d = ciede2000(&lab(50.0, 2.6772, -79.7751), &lab(50.0, 0.0, -82.7485));
        assert_abs_diff_eq!(d, 2.0425, epsilon = 1e-4);
    }

    #[test]
    fn test_ciede2000_hue_wraparound_pair() {
        // Sharma et al. pair 17 straddles the 0/360 hue boundary
        let d = ciede2000(&lab(50.0, 2.5, 0.0), &lab(73.0, 25.0, -18.0));
        assert_abs_diff_eq!(d, 27.1492, epsilon = 1e-4);
    }

    #[test]
    fn test_ciede2000_achromatic_pair() {
        // Sharma et al. pair 7: one color on the neutral axis
        let d = ciede2000(&lab(50.0, 0.0, 0.0), &lab(50.0, -1.0, 2.0));
        assert_abs_diff_eq!(d, 2.3669, epsilon = 1e-4);
    }

    #[test]
    fn test_ciede2000_identity_and_symmetry() {
        let a = lab(62.3, -5.3, -29.9);
        let b = lab(98.03, -0.01, -0.05);
        assert_abs_diff_eq!(ciede2000(&a, &a), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ciede2000(&a, &b), ciede2000(&b, &a), epsilon = 1e-9);
    }

    #[test]
    fn test_delta_e76() {
        let d = delta_e76(&lab(50.0, 0.0, 0.0), &lab(53.0, 4.0, 0.0));
        assert_abs_diff_eq!(d, 5.0, epsilon = 1e-12);
    }
}
