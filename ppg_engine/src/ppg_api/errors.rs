use thiserror::Error;

use crate::{
    db_types::Reference,
    traits::{IntentStoreError, ProcessorError},
};

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Could not open a checkout session with the payment processor. {0}")]
    ProcessorUnavailable(String),
    #[error("Plan '{0}' does not exist")]
    PlanNotFound(String),
    #[error("Plan '{0}' is not available for purchase")]
    PlanUnavailable(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<IntentStoreError> for CheckoutError {
    fn from(e: IntentStoreError) -> Self {
        CheckoutError::DatabaseError(e.to_string())
    }
}

impl From<ProcessorError> for CheckoutError {
    fn from(e: ProcessorError) -> Self {
        CheckoutError::ProcessorUnavailable(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("No payment intent exists with reference {0}")]
    UnknownReference(Reference),
    #[error("Could not confirm the payment with the processor. {0}")]
    ProcessorUnavailable(String),
    #[error("Payment belongs to reference {found}, not {expected}")]
    ReferenceMismatch { expected: Reference, found: Reference },
    #[error("Payment {0} does not carry a reference")]
    MissingReference(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<IntentStoreError> for ReconciliationError {
    fn from(e: IntentStoreError) -> Self {
        match e {
            IntentStoreError::IntentNotFound(r) => ReconciliationError::UnknownReference(r),
            e => ReconciliationError::DatabaseError(e.to_string()),
        }
    }
}

impl From<ProcessorError> for ReconciliationError {
    fn from(e: ProcessorError) -> Self {
        ReconciliationError::ProcessorUnavailable(e.to_string())
    }
}
