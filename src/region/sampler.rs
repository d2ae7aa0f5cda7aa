//! Pixel region sampling
//!
//! Reduces the pixels under a region to a count, per-channel mean and
//! per-channel population standard deviation.
//!
//! ## Algorithm
//!
//! 1. Floor the region geometry to an integer bounding box
//! 2. Clip the box to the buffer and take a `crop_imm` view
//! 3. For circles, keep a pixel only when its distance from the box center is
//!    at most half the box width
//! 4. Accumulate integer sums and sums of squares per channel

use image::{imageops, GenericImageView, RgbaImage};
use tracing::{debug, warn};

use super::sample::{BoundingBox, PixelStats, RegionColor, RegionSample, RegionShape, ShapeKind};
use crate::color::{ColorConverter, MeanRgb, RgbStdDev};

/// Running per-channel sums for one region
#[derive(Debug, Default, Clone, Copy)]
struct ChannelAccumulator {
    count: u64,
    sum: [u64; 3],
    sum_sq: [u64; 3],
}

impl ChannelAccumulator {
    fn push(&mut self, rgb: [u8; 3]) {
        self.count += 1;
        for (i, &v) in rgb.iter().enumerate() {
            let v = u64::from(v);
            self.sum[i] += v;
            self.sum_sq[i] += v * v;
        }
    }

    fn finish(&self) -> Option<PixelStats> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        let mean = self.sum.map(|s| s as f64 / n);
        let std_dev: Vec<f64> = (0..3)
            .map(|i| (self.sum_sq[i] as f64 / n - mean[i] * mean[i]).max(0.0).sqrt())
            .collect();

        Some(PixelStats {
            pixel_count: self.count as usize,
            rgb: MeanRgb::new(mean[0], mean[1], mean[2]),
            rgb_std_dev: RgbStdDev {
                r: std_dev[0],
                g: std_dev[1],
                b: std_dev[2],
            },
        })
    }
}

/// Samples region pixels from an RGBA buffer
#[derive(Debug, Clone, Default)]
pub struct RegionSampler {
    converter: ColorConverter,
}

impl RegionSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_converter(converter: ColorConverter) -> Self {
        Self { converter }
    }

    pub fn converter(&self) -> &ColorConverter {
        &self.converter
    }

    /// Pixel statistics of a shape; `None` when no pixel falls inside it
    pub fn sample_shape(&self, image: &RgbaImage, shape: &RegionShape) -> Option<PixelStats> {
        let bbox = shape.bounding_box()?;
        reduce_pixels(image, bbox, shape.kind())
    }

    /// Statistics plus all derived color representations
    pub fn sample_color(&self, image: &RgbaImage, shape: &RegionShape) -> Option<RegionColor> {
        self.sample_shape(image, shape)
            .map(|stats| RegionColor::from_stats(stats, &self.converter))
    }

    /// Sample a region in place
    ///
    /// Returns `false` (and leaves the region without color data) when the
    /// region covers no pixels of the buffer.
    pub fn process_region(&self, image: &RgbaImage, region: &mut RegionSample) -> bool {
        match self.sample_color(image, &region.shape) {
            Some(color) => {
                debug!(
                    region_id = region.id,
                    pixel_count = color.pixel_count,
                    hex = %color.hex,
                    "sampled region"
                );
                region.color = Some(color);
                true
            }
            None => {
                warn!(region_id = region.id, shape = ?region.shape, "region covers no pixels");
                region.color = None;
                false
            }
        }
    }
}

/// Reduce the pixels of a bounding box, clipped to the buffer
fn reduce_pixels(image: &RgbaImage, bbox: BoundingBox, kind: ShapeKind) -> Option<PixelStats> {
    let (img_w, img_h) = (i64::from(image.width()), i64::from(image.height()));
    let x0 = bbox.x.clamp(0, img_w);
    let y0 = bbox.y.clamp(0, img_h);
    let x1 = bbox.x.saturating_add(bbox.width).clamp(0, img_w);
    let y1 = bbox.y.saturating_add(bbox.height).clamp(0, img_h);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    // Clipped bounds lie inside a u32-sized image
    let view = imageops::crop_imm(
        image,
        x0 as u32,
        y0 as u32,
        (x1 - x0) as u32,
        (y1 - y0) as u32,
    );
    let off_x = x0.saturating_sub(bbox.x) as f64;
    let off_y = y0.saturating_sub(bbox.y) as f64;
    let half = bbox.width as f64 / 2.0;

    let mut acc = ChannelAccumulator::default();
    for (vx, vy, pixel) in view.pixels() {
        if kind == ShapeKind::Circle {
            let px = off_x + f64::from(vx);
            let py = off_y + f64::from(vy);
            if (px - half).hypot(py - half) > half {
                continue;
            }
        }
        acc.push([pixel[0], pixel[1], pixel[2]]);
    }
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use image::Rgba;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    #[test]
    fn test_std_dev_divides_by_pixel_count() {
        let reds = [2u8, 4, 4, 4, 5, 5, 7, 9];
        let image = RgbaImage::from_fn(8, 1, |x, _| Rgba([reds[x as usize], 7, 0, 255]));
        let shape = RegionShape::Rect { x: 0.0, y: 0.0, width: 8.0, height: 1.0 };
        let stats = RegionSampler::new().sample_shape(&image, &shape).unwrap();

        assert_eq!(stats.pixel_count, 8);
        assert_abs_diff_eq!(stats.rgb.avg_r, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.rgb_std_dev.r, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.rgb_std_dev.g, 0.0);

        let single = RegionShape::Rect { x: 7.0, y: 0.0, width: 1.0, height: 1.0 };
        let stats = RegionSampler::new().sample_shape(&image, &single).unwrap();
        assert_eq!(stats.pixel_count, 1);
        assert_abs_diff_eq!(stats.rgb_std_dev.r, 0.0);
    }

    #[test]
    fn test_huge_coordinates_have_no_data() {
        let image = solid(10, 10, [10, 20, 30]);
        let sampler = RegionSampler::new();

        let far = RegionShape::Rect { x: 1e300, y: 0.0, width: 5.0, height: 5.0 };
        assert!(sampler.sample_shape(&image, &far).is_none());

        let far_circle = RegionShape::Circle { x: 0.0, y: 1e300, radius: 4.0 };
        assert!(sampler.sample_shape(&image, &far_circle).is_none());

        let before = RegionShape::Rect { x: -1e300, y: 0.0, width: 1e300, height: 5.0 };
        assert!(sampler.sample_shape(&image, &before).is_none());

        // a huge extent starting inside the buffer still clips to it
        let wide = RegionShape::Rect { x: 2.0, y: 0.0, width: 1e300, height: 1e300 };
        assert_eq!(sampler.sample_shape(&image, &wide).unwrap().pixel_count, 80);
    }

    #[test]
    fn test_rect_on_solid_image() {
        let image = solid(20, 20, [200, 100, 50]);
        let shape = RegionShape::Rect { x: 2.0, y: 3.0, width: 5.0, height: 4.0 };
        let stats = RegionSampler::new().sample_shape(&image, &shape).unwrap();

        assert_eq!(stats.pixel_count, 20);
        assert_abs_diff_eq!(stats.rgb.avg_r, 200.0);
        assert_abs_diff_eq!(stats.rgb.avg_g, 100.0);
        assert_abs_diff_eq!(stats.rgb.avg_b, 50.0);
        assert_abs_diff_eq!(stats.rgb.avg_rgb, 350.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.rgb_std_dev.r, 0.0);
    }

    #[test]
    fn test_std_dev_matches_population_formula() {
        // Left column 0, right column 100 on the red channel
        let mut image = solid(2, 2, [0, 0, 0]);
        image.put_pixel(1, 0, Rgba([100, 0, 0, 255]));
        image.put_pixel(1, 1, Rgba([100, 0, 0, 255]));
        let shape = RegionShape::Rect { x: 0.0, y: 0.0, width: 2.0, height: 2.0 };
        let stats = RegionSampler::new().sample_shape(&image, &shape).unwrap();

        assert_abs_diff_eq!(stats.rgb.avg_r, 50.0);
        assert_abs_diff_eq!(stats.rgb_std_dev.r, 50.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.rgb_std_dev.g, 0.0);
    }

    #[test]
    fn test_circle_mask_excludes_corners() {
        // Corners are red, everything inside the inscribed circle is blue
        let mut image = solid(10, 10, [0, 0, 255]);
        for (x, y) in [(0, 0), (9, 0), (0, 9), (9, 9)] {
            image.put_pixel(x, y, Rgba([255, 0, 0, 255]));
        }
        let shape = RegionShape::Circle { x: 0.0, y: 0.0, radius: 5.0 };
        let stats = RegionSampler::new().sample_shape(&image, &shape).unwrap();

        assert!(stats.pixel_count < 100);
        assert!(stats.pixel_count > 60);
        assert_abs_diff_eq!(stats.rgb.avg_r, 0.0);
        assert_abs_diff_eq!(stats.rgb.avg_b, 255.0);
    }

    #[test]
    fn test_region_clipped_to_buffer() {
        let image = solid(10, 10, [10, 20, 30]);
        let shape = RegionShape::Rect { x: 8.0, y: -3.0, width: 5.0, height: 5.0 };
        let stats = RegionSampler::new().sample_shape(&image, &shape).unwrap();
        assert_eq!(stats.pixel_count, 4);
    }

    #[test]
    fn test_zero_size_region_has_no_data() {
        let image = solid(10, 10, [10, 20, 30]);
        let sampler = RegionSampler::new();

        let empty = RegionShape::Rect { x: 1.0, y: 1.0, width: 0.0, height: 5.0 };
        assert!(sampler.sample_shape(&image, &empty).is_none());

        let outside = RegionShape::Rect { x: 50.0, y: 50.0, width: 5.0, height: 5.0 };
        assert!(sampler.sample_shape(&image, &outside).is_none());
    }

    #[test]
    fn test_process_region_populates_color() {
        let image = solid(8, 8, [255, 0, 0]);
        let mut region = RegionSample::new(
            1,
            RegionShape::Rect { x: 0.0, y: 0.0, width: 4.0, height: 4.0 },
        );
        assert!(RegionSampler::new().process_region(&image, &mut region));

        let color = region.color.as_ref().unwrap();
        assert_eq!(color.hex, "#FF0000");
        assert_abs_diff_eq!(color.representations.hsv.s, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(color.representations.lab.l, 53.24, epsilon = 0.05);
    }
}
