use serde::{Deserialize, Serialize};

use crate::db_types::{PaymentIntent, SignalSource};

/// Published once per intent, after the transaction that moved it from `Pending` to `Completed` has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCompletedEvent {
    pub intent: PaymentIntent,
    pub source: SignalSource,
}

impl PaymentCompletedEvent {
    pub fn new(intent: PaymentIntent, source: SignalSource) -> Self {
        Self { intent, source }
    }
}

/// Published once per intent, after the transaction that moved it from `Pending` to `Rejected` has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRejectedEvent {
    pub intent: PaymentIntent,
    pub source: SignalSource,
}

impl PaymentRejectedEvent {
    pub fn new(intent: PaymentIntent, source: SignalSource) -> Self {
        Self { intent, source }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    PaymentCompleted(PaymentCompletedEvent),
    PaymentRejected(PaymentRejectedEvent),
}
