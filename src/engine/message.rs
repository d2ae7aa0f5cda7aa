//! Request/response message contract
//!
//! Requests arrive as `{"taskType": ..., "payload": ...}`. The envelope is
//! parsed first so that an unknown task type or a payload that does not
//! match its task still produces an error response naming the task.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::calibration::MetricRegression;
use crate::error::{AnalysisError, Result};
use crate::region::RegionSample;

/// Task type names on the wire
pub mod task_type {
    pub const CALCULATE_METRICS: &str = "calculateMetrics";
    pub const GENERATE_REGRESSIONS: &str = "generateRegressions";
    pub const PREDICT_CONCENTRATIONS: &str = "predictConcentrations";
    pub const PROCESS_REGION_DATA: &str = "processRegionData";
}

/// Incoming request envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub task_type: String,
    #[serde(default)]
    pub payload: Value,
}

impl TaskRequest {
    pub fn new(task_type: impl Into<String>, payload: Value) -> Self {
        Self {
            task_type: task_type.into(),
            payload,
        }
    }

    /// Build a request from a typed task
    pub fn from_task(task: &Task) -> Result<Self> {
        let payload = match task {
            Task::CalculateMetrics(p) => serde_json::to_value(p),
            Task::GenerateRegressions(p) => serde_json::to_value(p),
            Task::PredictConcentrations(p) => serde_json::to_value(p),
            Task::ProcessRegionData(p) => serde_json::to_value(p),
        }
        .map_err(|e| AnalysisError::malformed(task.task_type(), e.to_string()))?;
        Ok(Self::new(task.task_type(), payload))
    }
}

/// RGBA8 pixel buffer as carried over the message boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBufferData {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA bytes
    pub data: Vec<u8>,
}

impl PixelBufferData {
    pub fn from_image(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.as_raw().clone(),
        }
    }

    /// Check the byte length against the dimensions and wrap as an image
    pub fn into_image(self) -> Result<RgbaImage> {
        let expected = self.width as usize * self.height as usize * 4;
        let actual = self.data.len();
        let (width, height) = (self.width, self.height);
        let mismatch = AnalysisError::PixelBufferMismatch {
            width,
            height,
            expected,
            actual,
        };
        if actual != expected {
            return Err(mismatch);
        }
        RgbaImage::from_raw(width, height, self.data).ok_or(mismatch)
    }
}

/// Payload of `calculateMetrics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateMetricsPayload {
    pub region_samples: Vec<RegionSample>,
    /// Matched by id against `region_samples`
    #[serde(default)]
    pub reference_sample: Option<RegionSample>,
    /// Needed only for regions that arrive without color data
    #[serde(default)]
    pub pixel_buffer: Option<PixelBufferData>,
}

/// Result of `calculateMetrics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateMetricsResult {
    pub region_samples: Vec<RegionSample>,
    pub reference_required_but_missing: bool,
}

/// Payload of `generateRegressions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRegressionsPayload {
    pub calibration_points: Vec<RegionSample>,
    pub selected_metric_keys: Vec<String>,
}

/// Payload of `predictConcentrations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictConcentrationsPayload {
    pub region_samples: Vec<RegionSample>,
    pub regression_models: Vec<MetricRegression>,
}

/// Payload of `processRegionData`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRegionPayload {
    pub region: RegionSample,
    pub pixel_buffer: PixelBufferData,
}

/// A request with its payload decoded
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    CalculateMetrics(CalculateMetricsPayload),
    GenerateRegressions(GenerateRegressionsPayload),
    PredictConcentrations(PredictConcentrationsPayload),
    ProcessRegionData(ProcessRegionPayload),
}

impl Task {
    pub fn task_type(&self) -> &'static str {
        match self {
            Task::CalculateMetrics(_) => task_type::CALCULATE_METRICS,
            Task::GenerateRegressions(_) => task_type::GENERATE_REGRESSIONS,
            Task::PredictConcentrations(_) => task_type::PREDICT_CONCENTRATIONS,
            Task::ProcessRegionData(_) => task_type::PROCESS_REGION_DATA,
        }
    }

    /// Decode the payload of a request according to its task type
    pub fn from_request(request: TaskRequest) -> Result<Self> {
        let TaskRequest { task_type, payload } = request;
        let task = match task_type.as_str() {
            task_type::CALCULATE_METRICS => decode(&task_type, payload).map(Task::CalculateMetrics),
            task_type::GENERATE_REGRESSIONS => {
                decode(&task_type, payload).map(Task::GenerateRegressions)
            }
            task_type::PREDICT_CONCENTRATIONS => {
                decode(&task_type, payload).map(Task::PredictConcentrations)
            }
            task_type::PROCESS_REGION_DATA => decode(&task_type, payload).map(Task::ProcessRegionData),
            _ => Err(AnalysisError::UnknownTask {
                task_type: task_type.clone(),
            }),
        }?;
        Ok(task)
    }
}

fn decode<T: serde::de::DeserializeOwned>(task_type: &str, payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|e| AnalysisError::malformed(task_type, e.to_string()))
}

/// Outcome of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Error details carried in an error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    /// Chain of underlying causes, outermost first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl ErrorPayload {
    pub fn from_error(err: &AnalysisError) -> Self {
        let mut causes = Vec::new();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = std::error::Error::source(cause);
        }
        Self {
            message: err.to_string(),
            trace: (!causes.is_empty()).then(|| causes.join(": ")),
        }
    }
}

/// Outgoing response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub status: ResponseStatus,
    pub task_type: String,
    pub payload: Value,
}

impl TaskResponse {
    pub fn success(task_type: impl Into<String>, payload: Value) -> Self {
        Self {
            status: ResponseStatus::Success,
            task_type: task_type.into(),
            payload,
        }
    }

    pub fn error(task_type: impl Into<String>, err: &AnalysisError) -> Self {
        let details = ErrorPayload::from_error(err);
        let mut payload = serde_json::json!({ "message": details.message });
        if let Some(trace) = details.trace {
            payload["trace"] = Value::String(trace);
        }
        Self {
            status: ResponseStatus::Error,
            task_type: task_type.into(),
            payload,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// Error details of an error response
    pub fn error_payload(&self) -> Option<ErrorPayload> {
        match self.status {
            ResponseStatus::Error => serde_json::from_value(self.payload.clone()).ok(),
            ResponseStatus::Success => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pixel_buffer_length_checked() {
        let ok = PixelBufferData { width: 2, height: 1, data: vec![0; 8] };
        let image = ok.into_image().unwrap();
        assert_eq!(image.dimensions(), (2, 1));

        let short = PixelBufferData { width: 2, height: 2, data: vec![0; 8] };
        match short.into_image() {
            Err(AnalysisError::PixelBufferMismatch { expected, actual, .. }) => {
                assert_eq!((expected, actual), (16, 8));
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_pixel_buffer_from_image() {
        let image = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
        let buffer = PixelBufferData::from_image(&image);
        assert_eq!(buffer.data.len(), 24);
        assert_eq!(buffer.into_image().unwrap(), image);
    }

    #[test]
    fn test_unknown_task_type() {
        let request = TaskRequest::new("detectCircles", json!({}));
        match Task::from_request(request) {
            Err(AnalysisError::UnknownTask { task_type }) => assert_eq!(task_type, "detectCircles"),
            other => panic!("expected unknown task, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_payload_names_task() {
        let request = TaskRequest::new(task_type::GENERATE_REGRESSIONS, json!({"calibrationPoints": 3}));
        match Task::from_request(request) {
            Err(AnalysisError::MalformedPayload { task_type, .. }) => {
                assert_eq!(task_type, "generateRegressions")
            }
            other => panic!("expected malformed payload, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_calculate_metrics() {
        let raw = r#"{
            "taskType": "calculateMetrics",
            "payload": {
                "regionSamples": [{"id": 1, "type": "rect", "x": 0, "y": 0, "width": 2, "height": 2}],
                "referenceSample": null,
                "pixelBuffer": {"width": 1, "height": 1, "data": [255, 0, 0, 255]}
            }
        }"#;
        let request: TaskRequest = serde_json::from_str(raw).unwrap();
        let Task::CalculateMetrics(payload) = Task::from_request(request).unwrap() else {
            panic!("wrong task");
        };
        assert_eq!(payload.region_samples.len(), 1);
        assert!(payload.reference_sample.is_none());
        assert_eq!(payload.pixel_buffer.unwrap().data, vec![255, 0, 0, 255]);
    }

    #[test]
    fn test_request_round_trips_through_task() {
        let task = Task::GenerateRegressions(GenerateRegressionsPayload {
            calibration_points: Vec::new(),
            selected_metric_keys: vec!["Signal (RGB - R Component)".into()],
        });
        let request = TaskRequest::from_task(&task).unwrap();
        assert_eq!(request.task_type, "generateRegressions");
        assert_eq!(Task::from_request(request).unwrap(), task);
    }

    #[test]
    fn test_error_envelope() {
        let err = AnalysisError::UnknownTask { task_type: "x".into() };
        let response = TaskResponse::error("x", &err);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["taskType"], "x");
        assert_eq!(json["payload"]["message"], "Unknown task type: x");
        assert!(json["payload"].get("trace").is_none());
        assert!(response.error_payload().unwrap().trace.is_none());
    }

    #[test]
    fn test_error_trace_lists_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = AnalysisError::catalog_load("catalog.json", io);
        let payload = ErrorPayload::from_error(&err);
        assert_eq!(payload.trace.as_deref(), Some("no such file"));
    }
}
