use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Amount, Reference};

#[derive(Debug, Clone, Error)]
pub enum ProcessorError {
    #[error("The payment processor is unavailable. {0}")]
    Unavailable(String),
    #[error("The payment processor did not respond in time. {0}")]
    Timeout(String),
    #[error("The payment processor does not know about {0}")]
    NotFound(String),
    #[error("The payment processor sent a response we could not use. {0}")]
    InvalidResponse(String),
}

/// Where the processor sends the payer's browser once the hosted checkout is done.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

/// Everything the processor needs to open a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceRequest {
    /// Attached to the session as its external reference. The processor echoes it on every payment made against it.
    pub reference: Reference,
    pub subject_id: String,
    pub title: String,
    pub amount: Amount,
    pub currency: String,
    pub payer_id: String,
    pub return_urls: ReturnUrls,
    pub notification_url: Option<String>,
}

/// A freshly created hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub preference_id: String,
    pub checkout_url: String,
}

/// The processor's canonical view of a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorPayment {
    pub id: String,
    pub status: String,
    pub status_detail: Option<String>,
    /// The reference of the checkout session the payment was made against, if the processor reports one.
    pub external_reference: Option<Reference>,
    pub amount: Option<Amount>,
    pub currency: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl ProcessorPayment {
    pub fn new<S: Into<String>>(id: S, status: S) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            status_detail: None,
            external_reference: None,
            amount: None,
            currency: None,
            last_updated: None,
        }
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.external_reference = Some(reference);
        self
    }

    pub fn with_amount(mut self, amount: Amount, currency: &str) -> Self {
        self.amount = Some(amount);
        self.currency = Some(currency.to_string());
        self
    }

    pub fn with_last_updated(mut self, last_updated: DateTime<Utc>) -> Self {
        self.last_updated = Some(last_updated);
        self
    }
}

/// The external payment processor. Its answers are authoritative, but they are not always timely. Implementations must
/// bound every call with a timeout and report it as [`ProcessorError::Timeout`].
#[allow(async_fn_in_trait)]
pub trait PaymentProcessor {
    /// Opens a hosted checkout session carrying `request.reference` as its external reference.
    async fn create_preference(&self, request: PreferenceRequest) -> Result<CheckoutSession, ProcessorError>;

    /// Fetches a payment by its processor-assigned id.
    async fn fetch_payment(&self, payment_id: &str) -> Result<ProcessorPayment, ProcessorError>;

    /// All payments made against the checkout session with the given reference, newest first.
    async fn search_payments(&self, reference: &Reference) -> Result<Vec<ProcessorPayment>, ProcessorError>;
}
