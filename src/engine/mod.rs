//! Calculation engine boundary
//!
//! Request/response messages, the stateless dispatcher that answers them,
//! and a caller-side queue that coalesces bursts of recomputation requests.

pub mod message;
pub mod queue;
pub mod worker;

pub use message::{
    task_type, CalculateMetricsPayload, CalculateMetricsResult, ErrorPayload,
    GenerateRegressionsPayload, PixelBufferData, PredictConcentrationsPayload,
    ProcessRegionPayload, ResponseStatus, Task, TaskRequest, TaskResponse,
};
pub use queue::TaskQueue;
pub use worker::Engine;
