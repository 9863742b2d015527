//! Outbound prediction contract, transport, and the request lifecycle it drives.

mod client;
mod contract;
mod lifecycle;
mod orchestrator;

pub use client::{HttpPredictionClient, PredictionClient, PredictionClientError};
pub use contract::{
    interpret_response, PredictionResult, AREA_VALIDATION_MESSAGE, GENERIC_FAILURE_MESSAGE,
    PREDICT_PATH,
};
pub use lifecycle::{PendingTicket, RequestLifecycleState};
pub use orchestrator::{PredictionOrchestrator, SubmitOutcome, SubmitRejection};
