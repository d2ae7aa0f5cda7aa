//! Metric evaluation
//!
//! Turns a sampled region (and optionally the reference region) into one
//! scalar per catalog metric. Degenerate denominators produce no value;
//! structural problems (missing color data, missing reference) produce a
//! per-metric error that the batch logs and skips.

use tracing::{debug, info, trace, warn};

use super::catalog::{HueComponent, MetricCatalog, MetricDefinition, MetricKind};
use crate::color::{ciede2000, ColorSystem};
use crate::error::{AnalysisError, Result};
use crate::region::{AnalyticalResponse, RegionColor, RegionSample};

/// Summary of one batch evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// A reference metric was skipped because no reference region is set
    pub reference_required_but_missing: bool,
    /// Number of responses stored across all regions
    pub responses: usize,
    /// Number of metric evaluations that failed and were skipped
    pub failures: usize,
}

/// Evaluates catalog metrics against region samples
#[derive(Debug, Clone, Copy)]
pub struct MetricEvaluator<'c> {
    catalog: &'c MetricCatalog,
}

impl<'c> MetricEvaluator<'c> {
    pub fn new(catalog: &'c MetricCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'c MetricCatalog {
        self.catalog
    }

    /// Evaluate one metric for one region
    ///
    /// `Ok(None)` means the metric is undefined for this input (zero
    /// denominator, non-positive absorbance operand, non-finite result).
    pub fn evaluate(
        &self,
        metric: &MetricDefinition,
        sample: &RegionSample,
        reference: Option<&RegionSample>,
    ) -> Result<Option<f64>> {
        let fail = |reason: &str| AnalysisError::MetricEvaluationError {
            metric_id: metric.id.clone(),
            region_id: sample.id,
            reason: reason.to_string(),
        };

        let s = sample
            .color
            .as_ref()
            .ok_or_else(|| fail("region has no color data"))?;
        let reference_color = || {
            reference
                .and_then(|r| r.color.as_ref())
                .ok_or_else(|| fail("reference region is not available"))
        };
        let read = |color: &RegionColor, system: ColorSystem, channel: &str| {
            color
                .channel(system, channel)
                .ok_or_else(|| fail(&format!("unknown channel {}.{}", system, channel)))
        };
        let polar = &s.representations.derived;

        let value = match &metric.kind {
            MetricKind::Direct { system, channel } => Some(read(s, *system, channel)?),
            MetricKind::Inverse { channel } => Some(255.0 - read(s, ColorSystem::Rgb, channel)?),
            MetricKind::Delta { system, channel } => {
                let r = reference_color()?;
                Some(read(r, *system, channel)? - read(s, *system, channel)?)
            }
            MetricKind::Beer { system, channel } => {
                let r = reference_color()?;
                let sample_value = read(s, *system, channel)?;
                let reference_value = read(r, *system, channel)?;
                (sample_value > 0.0 && reference_value > 0.0)
                    .then(|| -(sample_value / reference_value).log10())
            }
            MetricKind::Ratio { system, channels } => {
                let num = read(s, *system, &channels[0])?;
                let den = read(s, *system, &channels[1])?;
                (den != 0.0).then(|| num / den)
            }
            MetricKind::Ndi { system, channels } => {
                let a = read(s, *system, &channels[0])?;
                let b = read(s, *system, &channels[1])?;
                let sum = a + b;
                (sum != 0.0).then(|| (a - b) / sum)
            }
            MetricKind::SumRatioRgb { channel } => {
                let total = s.rgb.sum();
                let value = read(s, ColorSystem::Rgb, channel)?;
                (total > 0.0).then(|| value / total)
            }
            MetricKind::EuclideanRgb => {
                let r = reference_color()?;
                let dr = r.rgb.avg_r - s.rgb.avg_r;
                let dg = r.rgb.avg_g - s.rgb.avg_g;
                let db = r.rgb.avg_b - s.rgb.avg_b;
                Some((dr * dr + dg * dg + db * db).sqrt())
            }
            MetricKind::EuclideanGeneric { system, channels } => {
                let r = reference_color()?;
                // channels missing on either side are left out of the sum
                let sum_sq: f64 = channels
                    .iter()
                    .filter_map(|c| Some((r.channel(*system, c)?, s.channel(*system, c)?)))
                    .map(|(rv, sv)| (rv - sv).powi(2))
                    .sum();
                Some(sum_sq.sqrt())
            }
            MetricKind::XyzChromaticity { channel } => {
                let xyz = &s.representations.xyz;
                let sum = xyz.x + xyz.y + xyz.z;
                let value = read(s, ColorSystem::Xyz, channel)?;
                (sum > 0.0).then(|| value / sum)
            }
            MetricKind::CielabChroma => Some(polar.c_star),
            MetricKind::CielabHue => Some(polar.h_ab),
            MetricKind::CielabHueComponent { sub_type } => Some(match sub_type {
                HueComponent::Cos => polar.h_cos,
                HueComponent::Sin => polar.h_sin,
            }),
            MetricKind::CielabChromaLightnessRatio => {
                let l = s.representations.lab.l;
                (l != 0.0).then(|| polar.c_star / l)
            }
            MetricKind::DeltaE2000 => {
                let r = reference_color()?;
                Some(ciede2000(&r.representations.lab, &s.representations.lab))
            }
            MetricKind::InterRatio { systems, channels } => {
                let num = read(s, systems[0], &channels[0])?;
                let den = read(s, systems[1], &channels[1])?;
                (den != 0.0).then(|| num / den)
            }
            MetricKind::InterRatioCstar { systems, channels } => {
                let den = read(s, systems[1], &channels[1])?;
                (den != 0.0).then(|| polar.c_star / den)
            }
            MetricKind::InterRatioSumRgb { systems, channels } => {
                let den = read(s, systems[1], &channels[1])?;
                (den != 0.0).then(|| s.rgb.sum() / den)
            }
            MetricKind::InterRatioRgbVsCstar { systems, channels } => {
                let num = read(s, systems[0], &channels[0])?;
                (polar.c_star != 0.0).then(|| num / polar.c_star)
            }
        };

        Ok(value.filter(|v| v.is_finite()))
    }

    /// Every catalog metric for one region, in catalog order
    ///
    /// Returns the responses, whether a reference metric was skipped for
    /// lack of a reference, and the number of failed evaluations.
    pub fn evaluate_region(
        &self,
        sample: &RegionSample,
        reference: Option<&RegionSample>,
    ) -> (Vec<AnalyticalResponse>, bool, usize) {
        let mut responses = Vec::new();
        let mut reference_missing = false;
        let mut failures = 0;

        for entry in self.catalog.entries() {
            let metric = entry.metric;
            if metric.needs_reference {
                match reference {
                    None => {
                        reference_missing = true;
                        continue;
                    }
                    // a region never serves as its own reference
                    Some(r) if r.id == sample.id => continue,
                    Some(_) => {}
                }
            }

            match self.evaluate(metric, sample, reference) {
                Ok(Some(value)) => {
                    trace!(region_id = sample.id, metric = %metric.id, value, "metric value");
                    responses.push(AnalyticalResponse {
                        key: entry.display_key(),
                        metric_id: metric.id.clone(),
                        value,
                    });
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, "metric skipped");
                    failures += 1;
                }
            }
        }

        (responses, reference_missing, failures)
    }

    /// Recompute analytical responses for every region
    ///
    /// The reference region is looked up by id among `regions`. A reference
    /// region without color data counts as missing.
    pub fn evaluate_batch(
        &self,
        regions: &mut [RegionSample],
        reference_id: Option<u32>,
    ) -> BatchSummary {
        let reference = reference_id
            .and_then(|id| regions.iter().find(|r| r.id == id))
            .filter(|r| r.color.is_some())
            .cloned();
        if reference_id.is_some() && reference.is_none() {
            debug!(?reference_id, "reference region not found or not sampled");
        }

        let mut summary = BatchSummary::default();
        for region in regions.iter_mut() {
            region.clear_responses();
            if region.color.is_none() {
                debug!(region_id = region.id, "no color data, no responses");
                continue;
            }
            let (responses, missing, failures) = self.evaluate_region(region, reference.as_ref());
            summary.reference_required_but_missing |= missing;
            summary.responses += responses.len();
            summary.failures += failures;
            region.analytical_responses = responses;
        }

        info!(
            regions = regions.len(),
            responses = summary.responses,
            failures = summary.failures,
            reference_missing = summary.reference_required_but_missing,
            "analytical responses computed"
        );
        summary
    }
}
