//! Mandatory acknowledgement step between a submit click and the real request.

use serde::Serialize;

/// Disclaimer points shown while the gate is open.
pub const DISCLAIMER_TITLE: &str = "Peringatan Penting";
pub const DISCLAIMER_POINTS: [&str; 2] = [
    "Model prediksi hanya tersedia untuk wilayah Yogyakarta. Untuk daerah lain, data belum tersedia.",
    "Output yang dihasilkan adalah estimasi harga, bukan harga pasar final.",
];
pub const CONSENT_LABEL: &str = "Saya memahami dan menyetujui ketentuan di atas.";

/// Transient view state: `{ visible, consented }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AcknowledgementState {
    pub visible: bool,
    pub consented: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GatePhase {
    Closed,
    Open { consented: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("acknowledgement dialog is not open")]
    Closed,
    #[error("acknowledgement must be accepted before submitting")]
    ConsentRequired,
}

/// Closed → Open-Unconsented ⇄ Open-Consented → Closed.
///
/// Only [`AcknowledgementGate::proceed`] lets a submission through, and every
/// way of closing the gate discards consent.
#[derive(Debug, Clone)]
pub struct AcknowledgementGate {
    phase: GatePhase,
}

impl Default for AcknowledgementGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AcknowledgementGate {
    pub fn new() -> Self {
        Self {
            phase: GatePhase::Closed,
        }
    }

    pub fn state(&self) -> AcknowledgementState {
        match self.phase {
            GatePhase::Closed => AcknowledgementState::default(),
            GatePhase::Open { consented } => AcknowledgementState {
                visible: true,
                consented,
            },
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.phase, GatePhase::Open { .. })
    }

    /// Intercept a submit. Opening an already open gate keeps its consent.
    pub fn open(&mut self) -> AcknowledgementState {
        if self.phase == GatePhase::Closed {
            self.phase = GatePhase::Open { consented: false };
        }
        self.state()
    }

    pub fn set_consent(&mut self, consented: bool) -> Result<AcknowledgementState, GateError> {
        match self.phase {
            GatePhase::Closed => Err(GateError::Closed),
            GatePhase::Open { .. } => {
                self.phase = GatePhase::Open { consented };
                Ok(self.state())
            }
        }
    }

    /// Abort: close without submitting.
    pub fn cancel(&mut self) -> Result<(), GateError> {
        match self.phase {
            GatePhase::Closed => Err(GateError::Closed),
            GatePhase::Open { .. } => {
                self.phase = GatePhase::Closed;
                Ok(())
            }
        }
    }

    /// Close and allow the submission. Refused without consent; the gate stays open.
    pub fn proceed(&mut self) -> Result<(), GateError> {
        match self.phase {
            GatePhase::Closed => Err(GateError::Closed),
            GatePhase::Open { consented: false } => Err(GateError::ConsentRequired),
            GatePhase::Open { consented: true } => {
                self.phase = GatePhase::Closed;
                Ok(())
            }
        }
    }
}
