//! Per-request state tracking for the orchestrators.
//!
//! Pending → ProviderResolved → Prompted → Invoked → Normalized → (Merged) → Completed,
//! with Failed reachable from any stage. Transitions only move forward.

use std::fmt;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::prompts::Operation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Pending,
    ProviderResolved,
    Prompted,
    Invoked,
    Normalized,
    Merged,
    Completed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug)]
pub struct RequestLifecycle {
    operation: Operation,
    request_id: Uuid,
    stage: Stage,
}

impl RequestLifecycle {
    pub fn begin(operation: Operation) -> Self {
        let request_id = Uuid::new_v4();
        info!(%request_id, %operation, "request received");
        Self {
            operation,
            request_id,
            stage: Stage::Pending,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Moves to `next`. Backward moves are ignored and logged.
    pub fn advance(&mut self, next: Stage) {
        if next <= self.stage {
            warn!(
                request_id = %self.request_id,
                "ignoring lifecycle transition {} -> {}",
                self.stage,
                next
            );
            return;
        }
        debug!(
            request_id = %self.request_id,
            operation = %self.operation,
            "{} -> {}",
            self.stage,
            next
        );
        self.stage = next;
    }

    /// Terminal failure: logs the stage the request died in and returns the error.
    pub fn fail(self, err: impl Into<AppError>) -> AppError {
        let err = err.into();
        error!(
            request_id = %self.request_id,
            operation = %self.operation,
            stage = %self.stage(),
            "request failed: {err}"
        );
        err
    }

    pub fn complete(mut self) {
        self.advance(Stage::Completed);
        info!(request_id = %self.request_id, operation = %self.operation, "request completed");
    }
}
