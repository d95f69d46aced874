use serde::{Deserialize, Serialize};

use crate::{
    db_types::{PaymentIntent, Reference, SignalSource},
    reconciler::Transition,
};

/// A single statement about the state of a payment, as seen from one of the entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorObservation {
    pub reference: Reference,
    /// The raw status string reported by the processor (or claimed by the client, for `ReturnUrlClaimed`).
    pub status: String,
    pub external_payment_id: Option<String>,
    pub source: SignalSource,
}

impl ProcessorObservation {
    pub fn new<S: Into<String>>(reference: Reference, status: S, source: SignalSource) -> Self {
        Self { reference, status: status.into(), external_payment_id: None, source }
    }

    pub fn with_payment_id<S: Into<String>>(mut self, payment_id: S) -> Self {
        self.external_payment_id = Some(payment_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileResult {
    /// The intent as it stands after the observation was applied.
    pub intent: PaymentIntent,
    pub transition: Transition,
}

impl ReconcileResult {
    pub fn new(intent: PaymentIntent, transition: Transition) -> Self {
        Self { intent, transition }
    }
}
