use thiserror::Error;

use crate::{
    db_types::{NewPaymentIntent, PaymentIntent, Reference},
    traits::{IntentManagement, PlanDirectory, ProcessorObservation, ReconcileResult},
};

#[derive(Debug, Clone, Error)]
pub enum IntentStoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The payment reference {0} is already in use")]
    ReferenceAlreadyExists(Reference),
    #[error("No payment intent exists for reference {0}")]
    IntentNotFound(Reference),
}

impl From<sqlx::Error> for IntentStoreError {
    fn from(e: sqlx::Error) -> Self {
        IntentStoreError::DatabaseError(e.to_string())
    }
}

/// This trait defines the write side of the payment intent store.
///
/// Backends guarantee that
/// * a reference is never stored twice;
/// * `reconcile_intent` is serialized per reference. Two concurrent calls for the same reference can never both see
///   the intent as `Pending` and both move it to a terminal state;
/// * the side effects of a terminal transition are applied in the same atomic unit as the transition itself. If
///   either fails, neither happens.
#[allow(async_fn_in_trait)]
pub trait PaymentIntentDatabase: Clone + IntentManagement + PlanDirectory {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new `Pending` intent and records its creation in the audit trail.
    ///
    /// Fails with [`IntentStoreError::ReferenceAlreadyExists`] if the reference has been used before.
    async fn insert_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, IntentStoreError>;

    /// Stores a new intent that is `Completed` from the outset (a free plan) and applies the completion side effects,
    /// all in one transaction.
    async fn activate_free_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, IntentStoreError>;

    /// Applies a processor observation to the intent it refers to, in a single transaction:
    /// 1. Locks the intent. Fails with [`IntentStoreError::IntentNotFound`] if there is none.
    /// 2. Records the reported status and payment id (authoritative sources only).
    /// 3. Decides the transition (see [`crate::reconciler::decide_transition`]).
    /// 4. On a terminal transition, updates the status and applies the matching side effects.
    /// 5. Appends the observation and its outcome to the audit trail.
    async fn reconcile_intent(&self, observation: ProcessorObservation) -> Result<ReconcileResult, IntentStoreError>;
}
