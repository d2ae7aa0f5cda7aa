//! Error types for the chroma_assay library

use thiserror::Error;

/// Result type alias for chroma_assay operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Comprehensive error types for assay computations
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Image file could not be loaded or decoded
    #[error("Failed to load image: {message}")]
    ImageLoadError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Metric catalog could not be read or parsed
    #[error("Failed to load metric catalog: {message}")]
    CatalogLoadError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A catalog entry is missing a field its evaluation kind requires
    #[error("Invalid metric definition '{metric_id}': {reason}")]
    CatalogSchemaError { metric_id: String, reason: String },

    /// Engine configuration could not be read or parsed
    #[error("Failed to load configuration: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Request carried a task type the engine does not know
    #[error("Unknown task type: {task_type}")]
    UnknownTask { task_type: String },

    /// Request payload does not match the task's contract
    #[error("Malformed payload for task '{task_type}': {message}")]
    MalformedPayload { task_type: String, message: String },

    /// Pixel buffer dimensions do not agree with its byte length
    #[error("Pixel buffer is {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    PixelBufferMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// One metric failed to evaluate for one region
    #[error("Metric '{metric_id}' failed for region {region_id}: {reason}")]
    MetricEvaluationError {
        metric_id: String,
        region_id: u32,
        reason: String,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },
}

impl AnalysisError {
    /// Create an image load error with context
    pub fn image_load<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageLoadError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a catalog load error with context
    pub fn catalog_load<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::CatalogLoadError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a catalog schema error for one metric
    pub fn catalog_schema(metric_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CatalogSchemaError {
            metric_id: metric_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration load error with context
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a malformed payload error
    pub fn malformed(task_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            task_type: task_type.into(),
            message: message.into(),
        }
    }

    /// Check if this error is absorbed into a partial batch result
    /// rather than surfaced to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AnalysisError::MetricEvaluationError { .. })
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::ImageLoadError { .. } => {
                "Unable to load the image file. Please check the file format and try again.".to_string()
            }
            AnalysisError::CatalogLoadError { .. } | AnalysisError::CatalogSchemaError { .. } => {
                "The metric catalog could not be loaded. No computation is possible.".to_string()
            }
            AnalysisError::ConfigError { .. } => {
                "The engine configuration could not be loaded. Please check the file.".to_string()
            }
            AnalysisError::UnknownTask { task_type } => {
                format!("The calculation engine does not support the task '{}'.", task_type)
            }
            AnalysisError::MalformedPayload { .. } | AnalysisError::PixelBufferMismatch { .. } => {
                "The calculation request was malformed.".to_string()
            }
            _ => "The calculation failed. Please check the input data.".to_string(),
        }
    }
}
