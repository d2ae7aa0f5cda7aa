//! Named color systems and channel lookup
//!
//! Metric definitions address values as `(system, channel)` pairs using the
//! same channel names that appear in the serialized region data
//! (`rgb.avgR`, `lab.l`, `hunterLab.b`, ...).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::conversion::{ColorRepresentations, MeanRgb};

/// Color system a metric reads its operands from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorSystem {
    #[serde(rename = "rgb")]
    Rgb,
    #[serde(rename = "hsv")]
    Hsv,
    #[serde(rename = "hsl")]
    Hsl,
    #[serde(rename = "lab")]
    Lab,
    #[serde(rename = "xyz")]
    Xyz,
    #[serde(rename = "ycbcr")]
    YCbCr,
    #[serde(rename = "cmyk")]
    Cmyk,
    #[serde(rename = "hunterLab")]
    HunterLab,
}

impl ColorSystem {
    /// Channel names addressable in this system
    pub fn channel_names(self) -> &'static [&'static str] {
        match self {
            ColorSystem::Rgb => &["avgR", "avgG", "avgB", "avgRGB"],
            ColorSystem::Hsv => &["h", "s", "v"],
            ColorSystem::Hsl => &["h", "s", "l"],
            ColorSystem::Lab => &["l", "a", "b"],
            ColorSystem::Xyz => &["x", "y", "z"],
            ColorSystem::YCbCr => &["y", "cb", "cr"],
            ColorSystem::Cmyk => &["c", "m", "y", "k"],
            ColorSystem::HunterLab => &["l", "a", "b"],
        }
    }

    pub fn has_channel(self, channel: &str) -> bool {
        self.channel_names().contains(&channel)
    }

    /// Read one channel value; `None` for an unknown channel name
    pub fn read(self, rgb: &MeanRgb, reps: &ColorRepresentations, channel: &str) -> Option<f64> {
        let value = match (self, channel) {
            (ColorSystem::Rgb, "avgR") => rgb.avg_r,
            (ColorSystem::Rgb, "avgG") => rgb.avg_g,
            (ColorSystem::Rgb, "avgB") => rgb.avg_b,
            (ColorSystem::Rgb, "avgRGB") => rgb.avg_rgb,
            (ColorSystem::Hsv, "h") => reps.hsv.h,
            (ColorSystem::Hsv, "s") => reps.hsv.s,
            (ColorSystem::Hsv, "v") => reps.hsv.v,
            (ColorSystem::Hsl, "h") => reps.hsl.h,
            (ColorSystem::Hsl, "s") => reps.hsl.s,
            (ColorSystem::Hsl, "l") => reps.hsl.l,
            (ColorSystem::Lab, "l") => reps.lab.l,
            (ColorSystem::Lab, "a") => reps.lab.a,
            (ColorSystem::Lab, "b") => reps.lab.b,
            (ColorSystem::Xyz, "x") => reps.xyz.x,
            (ColorSystem::Xyz, "y") => reps.xyz.y,
            (ColorSystem::Xyz, "z") => reps.xyz.z,
            (ColorSystem::YCbCr, "y") => reps.ycbcr.y,
            (ColorSystem::YCbCr, "cb") => reps.ycbcr.cb,
            (ColorSystem::YCbCr, "cr") => reps.ycbcr.cr,
            (ColorSystem::Cmyk, "c") => reps.cmyk.c,
            (ColorSystem::Cmyk, "m") => reps.cmyk.m,
            (ColorSystem::Cmyk, "y") => reps.cmyk.y,
            (ColorSystem::Cmyk, "k") => reps.cmyk.k,
            (ColorSystem::HunterLab, "l") => reps.hunter_lab.l,
            (ColorSystem::HunterLab, "a") => reps.hunter_lab.a,
            (ColorSystem::HunterLab, "b") => reps.hunter_lab.b,
            _ => return None,
        };
        Some(value)
    }
}

impl fmt::Display for ColorSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorSystem::Rgb => "rgb",
            ColorSystem::Hsv => "hsv",
            ColorSystem::Hsl => "hsl",
            ColorSystem::Lab => "lab",
            ColorSystem::Xyz => "xyz",
            ColorSystem::YCbCr => "ycbcr",
            ColorSystem::Cmyk => "cmyk",
            ColorSystem::HunterLab => "hunterLab",
        };
        f.write_str(name)
    }
}
