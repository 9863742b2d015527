//! One page session: form, acknowledgement gate, and orchestrator wired together.

pub mod registry;
pub mod router;

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::debug;

use crate::form::{
    CascadingSelector, FieldValue, FormError, FormField, FormState, LocationOptions,
    PropertyFormRecord,
};
use crate::gate::{AcknowledgementGate, AcknowledgementState, GateError};
use crate::location::{LocationHierarchy, LocationLevel};
use crate::prediction::{
    PredictionClient, PredictionOrchestrator, RequestLifecycleState, SubmitOutcome,
};
use crate::presenter::ResultView;

pub use registry::{SessionId, SessionLimits, SessionRegistry};
pub use router::session_router;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error("a prediction request is already in flight")]
    RequestInFlight,
    #[error("{} must be selected", .0.label())]
    MissingLocation(LocationLevel),
    #[error("unknown location '{island} / {province} / {city}'")]
    UnknownLocation {
        island: String,
        province: String,
        city: String,
    },
}

/// Snapshot of everything a page needs to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub form: PropertyFormRecord,
    pub options: LocationOptions,
    pub gate: AcknowledgementState,
    pub lifecycle: &'static str,
    pub result: ResultView,
    pub submit_enabled: bool,
}

pub struct EstimateSession<C> {
    hierarchy: Arc<LocationHierarchy>,
    form: Mutex<FormState>,
    gate: Mutex<AcknowledgementGate>,
    orchestrator: PredictionOrchestrator<C>,
}

impl<C> EstimateSession<C>
where
    C: PredictionClient + 'static,
{
    pub fn new(hierarchy: Arc<LocationHierarchy>, client: Arc<C>) -> Self {
        Self {
            hierarchy,
            form: Mutex::new(FormState::default()),
            gate: Mutex::new(AcknowledgementGate::new()),
            orchestrator: PredictionOrchestrator::new(client),
        }
    }

    pub fn record(&self) -> PropertyFormRecord {
        self.form.lock().expect("form mutex poisoned").record().clone()
    }

    pub fn lifecycle(&self) -> RequestLifecycleState {
        self.orchestrator.state()
    }

    pub fn gate_state(&self) -> AcknowledgementState {
        self.gate.lock().expect("gate mutex poisoned").state()
    }

    pub fn select(&self, level: LocationLevel, label: &str) -> PropertyFormRecord {
        let selector = CascadingSelector::new(&self.hierarchy);
        let mut form = self.form.lock().expect("form mutex poisoned");
        let next = selector.apply_selection(level, label, form.record());
        *form = FormState::new(next.clone());
        next
    }

    pub fn set_field(&self, field: FormField, value: FieldValue) -> Result<(), SessionError> {
        let mut form = self.form.lock().expect("form mutex poisoned");
        form.set(field, value)?;
        Ok(())
    }

    pub fn step_field(&self, field: FormField, delta: i64) -> Result<u32, SessionError> {
        let mut form = self.form.lock().expect("form mutex poisoned");
        Ok(form.step(field, delta)?)
    }

    /// The submit button: opens the gate unless a request is still running.
    pub fn request_submit(&self) -> Result<AcknowledgementState, SessionError> {
        if self.orchestrator.is_pending() {
            return Err(SessionError::RequestInFlight);
        }
        Ok(self.gate.lock().expect("gate mutex poisoned").open())
    }

    pub fn set_consent(&self, consented: bool) -> Result<AcknowledgementState, SessionError> {
        let mut gate = self.gate.lock().expect("gate mutex poisoned");
        Ok(gate.set_consent(consented)?)
    }

    pub fn cancel(&self) -> Result<(), SessionError> {
        self.gate.lock().expect("gate mutex poisoned").cancel()?;
        Ok(())
    }

    /// Pass the gate, check the required location fields, then submit.
    pub async fn proceed(&self) -> Result<SubmitOutcome, SessionError> {
        self.gate.lock().expect("gate mutex poisoned").proceed()?;

        let record = self.record();
        self.check_location(&record)?;

        Ok(self.orchestrator.submit(&record).await)
    }

    pub fn view(&self) -> SessionView {
        let record = self.record();
        let options = CascadingSelector::new(&self.hierarchy).options(&record);
        let lifecycle = self.orchestrator.state();
        SessionView {
            form: record,
            options,
            gate: self.gate_state(),
            lifecycle: lifecycle.label(),
            submit_enabled: !lifecycle.is_pending(),
            result: ResultView::from_state(&lifecycle),
        }
    }

    fn check_location(&self, record: &PropertyFormRecord) -> Result<(), SessionError> {
        if let Some(level) = record.missing_location() {
            debug!(field = level.field_name(), "submission missing location");
            return Err(SessionError::MissingLocation(level));
        }
        if !CascadingSelector::new(&self.hierarchy).is_resolved(record) {
            return Err(SessionError::UnknownLocation {
                island: record.island.clone(),
                province: record.province.clone(),
                city: record.city.clone(),
            });
        }
        Ok(())
    }
}
