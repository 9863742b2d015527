use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::warn;

use super::contract::{PredictionResult, GENERIC_FAILURE_MESSAGE};
use crate::form::PropertyFormRecord;

/// Stage of the most recent submission attempt.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestLifecycleState {
    #[default]
    Idle,
    Pending,
    Succeeded {
        result: PredictionResult,
    },
    Failed {
        message: String,
    },
}

impl RequestLifecycleState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match self {
            Self::Succeeded { result } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Proof that a submission moved the lifecycle into `pending`.
///
/// Not `Clone`: settling consumes it, so each dispatched request leaves
/// `pending` exactly once. A ticket dropped unsettled (the call panicked or
/// its task was torn down) fails the lifecycle with the generic message.
#[derive(Debug)]
pub struct PendingTicket {
    attempt: u64,
    record: PropertyFormRecord,
    lifecycle: Arc<Mutex<RequestLifecycleState>>,
    settled: bool,
}

impl PendingTicket {
    pub(crate) fn new(
        attempt: u64,
        record: PropertyFormRecord,
        lifecycle: Arc<Mutex<RequestLifecycleState>>,
    ) -> Self {
        Self {
            attempt,
            record,
            lifecycle,
            settled: false,
        }
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn record(&self) -> &PropertyFormRecord {
        &self.record
    }

    pub(crate) fn finish(mut self, next: RequestLifecycleState) {
        *self.lifecycle.lock().expect("lifecycle mutex poisoned") = next;
        self.settled = true;
    }
}

impl Drop for PendingTicket {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!(attempt = self.attempt, "prediction abandoned before settling");
        if let Ok(mut state) = self.lifecycle.lock() {
            if state.is_pending() {
                *state = RequestLifecycleState::Failed {
                    message: GENERIC_FAILURE_MESSAGE.to_string(),
                };
            }
        }
    }
}
