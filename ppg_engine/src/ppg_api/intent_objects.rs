use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{IntentStatus, PaymentIntent, Reference},
    reconciler::Transition,
};

/// The result of a checkout. Paid plans carry a `checkoutUrl`; free plans are `activated` straight away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub reference: Reference,
    #[serde(rename = "checkoutUrl", skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    #[serde(default)]
    pub activated: bool,
}

impl CheckoutResult {
    pub fn redirect(reference: Reference, checkout_url: String) -> Self {
        Self { reference, checkout_url: Some(checkout_url), activated: false }
    }

    pub fn activated(reference: Reference) -> Self {
        Self { reference, checkout_url: None, activated: true }
    }
}

/// What a client is allowed to see of a payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentStatusView {
    pub reference: Reference,
    pub subject_id: String,
    pub local_status: IntentStatus,
    pub external_status: Option<String>,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    pub window_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl IntentStatusView {
    pub fn at(intent: &PaymentIntent, now: DateTime<Utc>) -> Self {
        Self {
            reference: intent.reference.clone(),
            subject_id: intent.subject_id.clone(),
            local_status: intent.local_status,
            external_status: intent.external_status.clone(),
            window_start: intent.window_start,
            window_end: intent.window_end,
            window_active: intent.window_active(now),
            updated_at: intent.updated_at,
        }
    }
}

impl From<&PaymentIntent> for IntentStatusView {
    fn from(intent: &PaymentIntent) -> Self {
        Self::at(intent, Utc::now())
    }
}

/// A browser redirect back from the processor's checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnConfirmation {
    pub reference: Reference,
    pub payment_id: Option<String>,
    pub claimed_status: Option<String>,
    /// Whether a status claimed by the client may be acted upon when no payment id accompanies it.
    pub trust_claimed: bool,
}

impl ReturnConfirmation {
    pub fn new(reference: Reference) -> Self {
        Self { reference, payment_id: None, claimed_status: None, trust_claimed: false }
    }

    pub fn with_payment_id<S: Into<String>>(mut self, payment_id: S) -> Self {
        self.payment_id = Some(payment_id.into());
        self
    }

    pub fn with_claimed_status<S: Into<String>>(mut self, status: S) -> Self {
        self.claimed_status = Some(status.into());
        self
    }

    pub fn trusting_claims(mut self, trust: bool) -> Self {
        self.trust_claimed = trust;
        self
    }
}

/// The authoritative state of an intent after a return-URL visit was handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnOutcome {
    pub intent: PaymentIntent,
    /// True if the state was confirmed with the processor during this visit.
    pub verified: bool,
    /// `None` if nothing was reconciled.
    pub transition: Option<Transition>,
}

impl ReturnOutcome {
    pub fn unchanged(intent: PaymentIntent) -> Self {
        Self { intent, verified: false, transition: None }
    }

    pub fn outcome_label(&self) -> &'static str {
        self.transition.as_ref().map(Transition::label).unwrap_or("unchanged")
    }
}
