//! HarPro: estimate a house price from its location and size.
//!
//! The crate models one estimate page: a cascading island → province → city
//! selector over [`location::LocationHierarchy`], a controlled
//! [`form::FormState`], an [`gate::AcknowledgementGate`] that must be passed
//! before anything is sent, and a [`prediction::PredictionOrchestrator`] that
//! calls the remote `/predict` endpoint one request at a time. The outcome is
//! rendered by [`presenter::ResultView`].

pub mod config;
pub mod error;
pub mod form;
pub mod gate;
pub mod location;
pub mod prediction;
pub mod presenter;
pub mod session;
pub mod telemetry;
