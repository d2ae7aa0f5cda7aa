//! Command queue with keep-latest coalescing
//!
//! Callers that trigger recomputation faster than the engine answers
//! submit requests here. A newer request replaces a pending one of the
//! same task type at the pending one's position, so dependent tasks
//! (metrics, then regressions, then predictions) still run in the order
//! they were first asked for, each with its most recent inputs.

use std::collections::VecDeque;

use tracing::{debug, info};

use super::message::{TaskRequest, TaskResponse};
use super::worker::Engine;

/// Pending requests, at most one per task type
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    pending: VecDeque<TaskRequest>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a request
    ///
    /// Returns `true` when it replaced a pending request of the same type.
    pub fn submit(&mut self, request: TaskRequest) -> bool {
        match self
            .pending
            .iter_mut()
            .find(|pending| pending.task_type == request.task_type)
        {
            Some(pending) => {
                debug!(task = %request.task_type, "coalesced with pending request");
                *pending = request;
                true
            }
            None => {
                self.pending.push_back(request);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Task types in the order they will run
    pub fn pending_types(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(|r| r.task_type.as_str())
    }

    /// Take the next request to run
    pub fn pop(&mut self) -> Option<TaskRequest> {
        self.pending.pop_front()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Run every pending request in order
    pub fn drain(&mut self, engine: &Engine) -> Vec<TaskResponse> {
        let mut responses = Vec::with_capacity(self.pending.len());
        while let Some(request) = self.pop() {
            responses.push(engine.handle(request));
        }
        info!(tasks = responses.len(), "task queue drained");
        responses
    }
}
