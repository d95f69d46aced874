use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
pub use ppg_common::Amount;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------       Reference       ---------------------------------------------------------
/// The idempotency key shared with the processor. It is generated at checkout time, echoed back on every payment made
/// against the checkout session, and is the only thing used to correlate processor signals with a [`PaymentIntent`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Reference(pub String);

impl Reference {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Reference {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Reference {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------     IntentStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum IntentStatus {
    /// The checkout session exists, but the processor has not reported a final outcome yet.
    Pending,
    /// The processor approved the payment and the entitlement has been granted. Terminal.
    Completed,
    /// The processor rejected, cancelled or reversed the payment. Terminal.
    Rejected,
}

impl IntentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentStatus::Pending => write!(f, "Pending"),
            IntentStatus::Completed => write!(f, "Completed"),
            IntentStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

impl FromStr for IntentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Rejected" => Ok(Self::Rejected),
            s => Err(ConversionError(format!("Invalid intent status: {s}"))),
        }
    }
}

impl From<String> for IntentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid intent status: {value}. But this conversion cannot fail. Defaulting to Pending");
            IntentStatus::Pending
        })
    }
}

//--------------------------------------      SubjectType      ---------------------------------------------------------
/// What a payment intent pays for. Only plans are sold at the moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    #[default]
    Plan,
    Subscription,
    Order,
}

impl Display for SubjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubjectType::Plan => write!(f, "plan"),
            SubjectType::Subscription => write!(f, "subscription"),
            SubjectType::Order => write!(f, "order"),
        }
    }
}

//--------------------------------------     SignalSource      ---------------------------------------------------------
/// Where a status observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum SignalSource {
    Checkout,
    /// A processor notification, confirmed by fetching the payment from the processor.
    Webhook,
    /// A browser redirect carrying a payment id, confirmed by fetching the payment from the processor.
    ReturnUrl,
    /// A browser redirect without a payment id. The status was claimed by the client and never confirmed.
    ReturnUrlClaimed,
    /// An explicit status refresh requested by the payer.
    Poll,
}

impl SignalSource {
    /// Only observations confirmed with the processor may overwrite the processor fields of an intent.
    pub fn is_authoritative(&self) -> bool {
        !matches!(self, Self::ReturnUrlClaimed)
    }
}

impl Display for SignalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalSource::Checkout => write!(f, "Checkout"),
            SignalSource::Webhook => write!(f, "Webhook"),
            SignalSource::ReturnUrl => write!(f, "ReturnUrl"),
            SignalSource::ReturnUrlClaimed => write!(f, "ReturnUrlClaimed"),
            SignalSource::Poll => write!(f, "Poll"),
        }
    }
}

//--------------------------------------     PaymentIntent     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: i64,
    pub reference: Reference,
    pub subject_type: SubjectType,
    pub subject_id: String,
    pub payer_id: String,
    pub amount: Amount,
    pub currency: String,
    /// Validity period of the plan at the time of checkout, in days.
    pub period_days: i64,
    pub local_status: IntentStatus,
    pub external_preference_id: Option<String>,
    pub external_payment_id: Option<String>,
    /// The last raw status the processor reported for this intent.
    pub external_status: Option<String>,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentIntent {
    pub fn is_terminal(&self) -> bool {
        self.local_status.is_terminal()
    }

    /// True if the intent is completed and `now` lies inside the validity window it granted.
    pub fn window_active(&self, now: DateTime<Utc>) -> bool {
        match (self.local_status, self.window_start, self.window_end) {
            (IntentStatus::Completed, Some(start), Some(end)) => start <= now && now < end,
            _ => false,
        }
    }
}

//--------------------------------------   NewPaymentIntent    ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPaymentIntent {
    pub reference: Reference,
    pub subject_type: SubjectType,
    pub subject_id: String,
    pub payer_id: String,
    pub amount: Amount,
    pub currency: String,
    pub period_days: i64,
    pub external_preference_id: Option<String>,
}

impl NewPaymentIntent {
    /// A new intent for `plan`, paid for by `payer_id`. The price, currency and period are snapshotted from the plan.
    pub fn for_plan(reference: Reference, plan: &Plan, payer_id: &str) -> Self {
        Self {
            reference,
            subject_type: SubjectType::Plan,
            subject_id: plan.id.clone(),
            payer_id: payer_id.to_string(),
            amount: plan.price,
            currency: plan.currency.clone(),
            period_days: plan.period_days,
            external_preference_id: None,
        }
    }

    pub fn with_preference_id<S: Into<String>>(mut self, preference_id: S) -> Self {
        self.external_preference_id = Some(preference_id.into());
        self
    }
}

//--------------------------------------         Plan          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub price: Amount,
    pub currency: String,
    pub period_days: i64,
    pub active: bool,
}

impl Plan {
    pub fn new<S: Into<String>>(id: S, name: S, price: Amount, period_days: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            currency: ppg_common::DEFAULT_CURRENCY_CODE.to_string(),
            period_days,
            active: true,
        }
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn is_free(&self) -> bool {
        self.price.is_zero()
    }
}

//--------------------------------------      Subscriber       ---------------------------------------------------------
/// The payer's current entitlement.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Subscriber {
    pub payer_id: String,
    pub plan_id: String,
    pub plan_started_at: DateTime<Utc>,
    pub plan_expires_at: DateTime<Utc>,
    /// The reference of the payment that granted the current plan.
    pub last_reference: Reference,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   NotificationKind    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum NotificationKind {
    PaymentApproved,
    PaymentRejected,
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::PaymentApproved => write!(f, "PaymentApproved"),
            NotificationKind::PaymentRejected => write!(f, "PaymentRejected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: String,
    pub kind: NotificationKind,
    pub reference: Reference,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient_id: String,
    pub kind: NotificationKind,
    pub reference: Reference,
    pub title: String,
    pub message: String,
}

//--------------------------------------      IntentEvent      ---------------------------------------------------------
/// One row of the audit trail. Every signal observed for a reference is recorded, whether or not it changed anything.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct IntentEvent {
    pub id: i64,
    pub reference: Reference,
    pub source: SignalSource,
    pub reported_status: Option<String>,
    pub external_payment_id: Option<String>,
    pub outcome: String,
    pub created_at: DateTime<Utc>,
}
