use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use super::client::{PredictionClient, PredictionClientError};
use super::contract::{PredictionResult, AREA_VALIDATION_MESSAGE};
use super::lifecycle::{PendingTicket, RequestLifecycleState};
use crate::form::PropertyFormRecord;

/// What a call to [`PredictionOrchestrator::submit`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// A request was dispatched and has settled into this state.
    Settled(RequestLifecycleState),
    /// Local validation failed; the lifecycle now holds this message.
    Blocked(String),
    /// Another request was in flight; nothing changed.
    Suppressed,
}

impl SubmitOutcome {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Settled(_) => "settled",
            Self::Blocked(_) => "blocked",
            Self::Suppressed => "suppressed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejection {
    #[error("a prediction request is already in flight")]
    InFlight,
    #[error("{0}")]
    Invalid(String),
}

/// Owns the request lifecycle and drives one prediction call at a time.
pub struct PredictionOrchestrator<C> {
    client: Arc<C>,
    state: Arc<Mutex<RequestLifecycleState>>,
    attempts: AtomicU64,
}

impl<C> PredictionOrchestrator<C>
where
    C: PredictionClient + 'static,
{
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(RequestLifecycleState::Idle)),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> RequestLifecycleState {
        self.state.lock().expect("lifecycle mutex poisoned").clone()
    }

    pub fn is_pending(&self) -> bool {
        self.state
            .lock()
            .expect("lifecycle mutex poisoned")
            .is_pending()
    }

    /// Synchronous half of a submission: guard, validate, enter `pending`.
    pub fn begin(&self, record: &PropertyFormRecord) -> Result<PendingTicket, SubmitRejection> {
        let mut state = self.state.lock().expect("lifecycle mutex poisoned");

        if state.is_pending() {
            debug!("prediction already in flight; submission suppressed");
            return Err(SubmitRejection::InFlight);
        }

        if !record.has_positive_areas() {
            info!(
                luas_tanah = record.land_area,
                luas_bangunan = record.building_area,
                "submission blocked by area validation"
            );
            *state = RequestLifecycleState::Failed {
                message: AREA_VALIDATION_MESSAGE.to_string(),
            };
            return Err(SubmitRejection::Invalid(AREA_VALIDATION_MESSAGE.to_string()));
        }

        *state = RequestLifecycleState::Pending;
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            attempt,
            pulau = %record.island,
            provinsi = %record.province,
            kota = %record.city,
            "prediction request dispatched"
        );
        Ok(PendingTicket::new(attempt, record.clone(), self.state.clone()))
    }

    /// Leave `pending` with the call's outcome. Consumes the ticket.
    pub fn settle(
        &self,
        ticket: PendingTicket,
        outcome: Result<PredictionResult, PredictionClientError>,
    ) -> RequestLifecycleState {
        settle_ticket(ticket, outcome)
    }

    /// Validate, dispatch, and settle one prediction request.
    ///
    /// The call and its settlement run on their own task: dropping the
    /// returned future (client disconnect, caller timeout) still lets the
    /// response land in the lifecycle.
    pub async fn submit(&self, record: &PropertyFormRecord) -> SubmitOutcome {
        let ticket = match self.begin(record) {
            Ok(ticket) => ticket,
            Err(SubmitRejection::InFlight) => return SubmitOutcome::Suppressed,
            Err(SubmitRejection::Invalid(message)) => return SubmitOutcome::Blocked(message),
        };

        let client = self.client.clone();
        let call = tokio::spawn(async move {
            let outcome = client.predict(ticket.record()).await;
            settle_ticket(ticket, outcome)
        });

        match call.await {
            Ok(state) => SubmitOutcome::Settled(state),
            Err(err) => {
                warn!(error = %err, "prediction task ended without settling");
                SubmitOutcome::Settled(self.state())
            }
        }
    }
}

fn settle_ticket(
    ticket: PendingTicket,
    outcome: Result<PredictionResult, PredictionClientError>,
) -> RequestLifecycleState {
    let next = match outcome {
        Ok(result) => {
            info!(
                attempt = ticket.attempt(),
                predicted_price = result.predicted_price,
                "prediction succeeded"
            );
            RequestLifecycleState::Succeeded { result }
        }
        Err(err) => {
            warn!(attempt = ticket.attempt(), error = %err, "prediction failed");
            RequestLifecycleState::Failed {
                message: err.to_string(),
            }
        }
    };

    ticket.finish(next.clone());
    next
}
