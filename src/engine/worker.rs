//! Stateless task dispatcher
//!
//! Every request carries its inputs by value and runs to completion; the
//! engine keeps only the immutable catalog and configuration between
//! requests.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::message::{
    CalculateMetricsPayload, CalculateMetricsResult, GenerateRegressionsPayload, PixelBufferData,
    PredictConcentrationsPayload, ProcessRegionPayload, Task, TaskRequest, TaskResponse,
};
use crate::calibration::{ConcentrationPredictor, MetricRegression, RegressionEngine};
use crate::config::EngineConfig;
use crate::error::{AnalysisError, Result};
use crate::metrics::{MetricCatalog, MetricEvaluator};
use crate::region::{RegionSample, RegionSampler};

/// Task type reported when a request cannot even be parsed
const UNPARSED_TASK: &str = "unknown";

/// Calculation engine answering request envelopes
#[derive(Debug, Clone)]
pub struct Engine {
    catalog: MetricCatalog,
    config: EngineConfig,
    sampler: RegionSampler,
}

impl Engine {
    /// Create an engine, loading the catalog named by the configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        let catalog = config.load_catalog()?;
        Ok(Self::with_catalog(catalog, config))
    }

    /// Create an engine around an already validated catalog
    pub fn with_catalog(catalog: MetricCatalog, config: EngineConfig) -> Self {
        Self {
            catalog,
            config,
            sampler: RegionSampler::new(),
        }
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Answer one request; failures become error responses
    pub fn handle(&self, request: TaskRequest) -> TaskResponse {
        let task_type = request.task_type.clone();
        match Task::from_request(request).and_then(|task| self.run(task)) {
            Ok(payload) => {
                debug!(task = %task_type, "task completed");
                TaskResponse::success(task_type, payload)
            }
            Err(err) => {
                warn!(task = %task_type, error = %err, "task failed");
                TaskResponse::error(task_type, &err)
            }
        }
    }

    /// Answer a request given as JSON text with a JSON response
    pub fn handle_json(&self, request: &str) -> String {
        let response = match serde_json::from_str::<TaskRequest>(request) {
            Ok(request) => self.handle(request),
            Err(e) => {
                let task_type = serde_json::from_str::<Value>(request)
                    .ok()
                    .and_then(|v| v.get("taskType").and_then(Value::as_str).map(str::to_owned))
                    .unwrap_or_else(|| UNPARSED_TASK.to_string());
                let err = AnalysisError::malformed(task_type.as_str(), e.to_string());
                warn!(task = %task_type, error = %err, "request rejected");
                TaskResponse::error(task_type, &err)
            }
        };
        serde_json::to_string(&response).unwrap_or_else(|e| {
            format!(
                r#"{{"status":"error","taskType":{:?},"payload":{{"message":{:?}}}}}"#,
                response.task_type,
                e.to_string()
            )
        })
    }

    /// Run a decoded task, returning its result payload
    pub fn run(&self, task: Task) -> Result<Value> {
        let task_type = task.task_type();
        match task {
            Task::CalculateMetrics(payload) => to_payload(task_type, &self.calculate_metrics(payload)?),
            Task::GenerateRegressions(payload) => {
                to_payload(task_type, &self.generate_regressions(payload))
            }
            Task::PredictConcentrations(payload) => {
                to_payload(task_type, &self.predict_concentrations(payload))
            }
            Task::ProcessRegionData(payload) => {
                to_payload(task_type, &self.process_region_data(payload)?)
            }
        }
    }

    /// Sample regions that lack color data, then evaluate every metric
    pub fn calculate_metrics(&self, payload: CalculateMetricsPayload) -> Result<CalculateMetricsResult> {
        let CalculateMetricsPayload {
            region_samples: mut regions,
            reference_sample,
            pixel_buffer,
        } = payload;

        if regions.is_empty() {
            return Ok(CalculateMetricsResult {
                region_samples: regions,
                reference_required_but_missing: false,
            });
        }

        let image = pixel_buffer.map(PixelBufferData::into_image).transpose()?;
        for region in regions.iter_mut().filter(|r| r.color.is_none()) {
            match &image {
                Some(image) => {
                    debug!(region_id = region.id, "region arrived without color data, sampling");
                    self.sampler.process_region(image, region);
                }
                None => debug!(region_id = region.id, "no pixel buffer to sample region from"),
            }
        }

        let evaluator = MetricEvaluator::new(&self.catalog);
        let summary = evaluator.evaluate_batch(&mut regions, reference_sample.map(|r| r.id));
        Ok(CalculateMetricsResult {
            region_samples: regions,
            reference_required_but_missing: summary.reference_required_but_missing,
        })
    }

    /// Fit linear and quadratic models for the selected metric keys
    pub fn generate_regressions(&self, payload: GenerateRegressionsPayload) -> Vec<MetricRegression> {
        RegressionEngine::new(self.config.quality)
            .generate(&payload.calibration_points, &payload.selected_metric_keys)
    }

    /// Attach concentration predictions to every sample region
    pub fn predict_concentrations(&self, payload: PredictConcentrationsPayload) -> Vec<RegionSample> {
        let PredictConcentrationsPayload {
            region_samples: mut regions,
            regression_models,
        } = payload;
        ConcentrationPredictor::new(self.config.prediction).predict_samples(
            &mut regions,
            &regression_models,
            &self.catalog,
        );
        regions
    }

    /// Sample one region; `None` when it covers no pixels
    pub fn process_region_data(&self, payload: ProcessRegionPayload) -> Result<Option<RegionSample>> {
        let ProcessRegionPayload {
            mut region,
            pixel_buffer,
        } = payload;
        let image = pixel_buffer.into_image()?;
        region.clear_responses();
        if self.sampler.process_region(&image, &mut region) {
            info!(region_id = region.id, "region processed");
            Ok(Some(region))
        } else {
            Ok(None)
        }
    }
}

fn to_payload<T: Serialize>(task_type: &str, result: &T) -> Result<Value> {
    serde_json::to_value(result).map_err(|e| AnalysisError::malformed(task_type, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::message::{task_type, ResponseStatus};
    use crate::region::RegionShape;
    use image::{Rgba, RgbaImage};
    use serde_json::json;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).unwrap()
    }

    /// 8x4 buffer: left half pure white, right half mid red
    fn buffer() -> PixelBufferData {
        let image = RgbaImage::from_fn(8, 4, |x, _| {
            if x < 4 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([200, 40, 40, 255])
            }
        });
        PixelBufferData::from_image(&image)
    }

    fn rect(id: u32, x: f64) -> RegionSample {
        RegionSample::new(id, RegionShape::Rect { x, y: 0.0, width: 4.0, height: 4.0 })
    }

    #[test]
    fn test_calculate_metrics_samples_and_evaluates() {
        let engine = engine();
        let white = rect(1, 0.0);
        let payload = CalculateMetricsPayload {
            region_samples: vec![white.clone(), rect(2, 4.0)],
            reference_sample: Some(white),
            pixel_buffer: Some(buffer()),
        };
        let result = engine.calculate_metrics(payload).unwrap();
        assert!(!result.reference_required_but_missing);

        let sample = &result.region_samples[1];
        let color = sample.color.as_ref().unwrap();
        assert_eq!(color.pixel_count, 16);
        assert_eq!(color.hex, "#C82828");
        assert_eq!(sample.response("Signal (RGB - R Component)"), Some(200.0));
        assert_eq!(sample.response("Signal (RGB - Difference in R (ΔR))"), Some(55.0));

        // the reference region gets no reference comparisons against itself
        let reference = &result.region_samples[0];
        assert!(reference.response("Signal (RGB - Difference in R (ΔR))").is_none());
        assert!(reference.response("Signal (RGB - R Component)").is_some());
    }

    #[test]
    fn test_calculate_metrics_flags_missing_reference() {
        let payload = CalculateMetricsPayload {
            region_samples: vec![rect(2, 4.0)],
            reference_sample: None,
            pixel_buffer: Some(buffer()),
        };
        let result = engine().calculate_metrics(payload).unwrap();
        assert!(result.reference_required_but_missing);
        assert!(!result.region_samples[0].analytical_responses.is_empty());
    }

    #[test]
    fn test_empty_batch() {
        let payload = CalculateMetricsPayload {
            region_samples: Vec::new(),
            reference_sample: None,
            pixel_buffer: None,
        };
        let result = engine().calculate_metrics(payload).unwrap();
        assert!(result.region_samples.is_empty());
        assert!(!result.reference_required_but_missing);
    }

    #[test]
    fn test_process_region_data() {
        let engine = engine();
        let region = engine
            .process_region_data(ProcessRegionPayload { region: rect(3, 4.0), pixel_buffer: buffer() })
            .unwrap()
            .unwrap();
        assert_eq!(region.color.unwrap().rgb.avg_r, 200.0);

        let outside = engine
            .process_region_data(ProcessRegionPayload { region: rect(4, 40.0), pixel_buffer: buffer() })
            .unwrap();
        assert!(outside.is_none());
    }

    #[test]
    fn test_handle_unknown_task() {
        let response = engine().handle(TaskRequest::new("detectCircles", json!({})));
        assert_eq!(response.status, ResponseStatus::Error);
        assert_eq!(response.task_type, "detectCircles");
        assert!(response.error_payload().unwrap().message.contains("detectCircles"));
    }

    #[test]
    fn test_handle_pixel_buffer_mismatch() {
        let request = TaskRequest::new(
            task_type::PROCESS_REGION_DATA,
            json!({
                "region": {"id": 1, "type": "rect", "x": 0, "y": 0, "width": 1, "height": 1},
                "pixelBuffer": {"width": 2, "height": 2, "data": [0, 0, 0, 255]}
            }),
        );
        let response = engine().handle(request);
        assert!(!response.is_success());
    }

    #[test]
    fn test_handle_json_round_trip() {
        let engine = engine();
        let out = engine.handle_json(
            r#"{"taskType": "generateRegressions",
                "payload": {"calibrationPoints": [], "selectedMetricKeys": ["k"]}}"#,
        );
        let response: TaskResponse = serde_json::from_str(&out).unwrap();
        assert!(response.is_success());
        assert_eq!(response.payload, json!([]));

        let out = engine.handle_json(r#"{"taskType": "calculateMetrics", "payload": "#);
        let response: TaskResponse = serde_json::from_str(&out).unwrap();
        assert_eq!(response.status, ResponseStatus::Error);
        assert_eq!(response.task_type, "unknown");
    }
}
