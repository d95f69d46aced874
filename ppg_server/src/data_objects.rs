use std::{fmt::Display, str::FromStr};

use ppg_engine::{
    db_types::{IntentStatus, Reference},
    intent_objects::ReturnOutcome,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

//--------------------------------------        Checkout       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// The plan being bought
    #[serde(alias = "plan_id")]
    pub subject_id: String,
}

//--------------------------------------        Webhooks       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    Ok,
    Ignored,
    NoId,
    SignatureInvalid,
    Processed,
    UnknownReference,
    Error,
}

/// The processor only looks at the status code of a webhook response. The body is for humans reading its delivery log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: WebhookStatus,
    pub message: String,
}

impl WebhookAck {
    pub fn new<S: Display>(status: WebhookStatus, message: S) -> Self {
        Self { status, message: message.to_string() }
    }
}

/// The query string of a processor notification. The processor has used several notification formats over time, so
/// each piece of information can turn up under more than one name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookQuery {
    pub topic: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(rename = "data.id")]
    pub data_id: Option<String>,
    pub id: Option<String>,
}

/// Everything the webhook handler needs from a processor notification, gathered from the query string, the body and
/// the headers. Only the payment id is acted upon, and only after the signature has been checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookNotification {
    pub topic: Option<String>,
    pub payment_id: Option<String>,
    pub request_id: Option<String>,
    pub signature: Option<String>,
}

impl WebhookNotification {
    /// Query parameters take precedence over the body. A body that is not JSON is treated as empty.
    pub fn from_parts(query: &WebhookQuery, body: &[u8], request_id: Option<&str>, signature: Option<&str>) -> Self {
        let body = serde_json::from_slice::<Value>(body).unwrap_or(Value::Null);
        let topic = first_present([query.topic.clone(), query.kind.clone()])
            .or_else(|| first_present(["type", "topic", "action"].map(|k| string_field(&body, k))));
        let payment_id = first_present([query.data_id.clone(), query.id.clone()]).or_else(|| {
            first_present([body.get("data").and_then(|d| string_field(d, "id")), string_field(&body, "id")])
        });
        Self {
            topic,
            payment_id,
            request_id: request_id.map(str::trim).filter(|s| !s.is_empty()).map(String::from),
            signature: signature.map(String::from),
        }
    }

    /// `payment`, or any `payment.*` action such as `payment.updated`.
    pub fn is_payment_topic(&self) -> bool {
        self.topic.as_deref().map(|t| t.trim().to_ascii_lowercase()).is_some_and(|t| {
            t == "payment" || t.starts_with("payment.")
        })
    }
}

fn first_present<const N: usize>(values: [Option<String>; N]) -> Option<String> {
    values.into_iter().flatten().map(|s| s.trim().to_string()).find(|s| !s.is_empty() && s != "null")
}

/// Ids are numbers in some notification formats and strings in others.
fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

//--------------------------------------      Return pages     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnPage {
    Success,
    Failure,
    Pending,
}

impl FromStr for ReturnPage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "pending" => Ok(Self::Pending),
            other => Err(format!("'{other}' is not a return page")),
        }
    }
}

impl Display for ReturnPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failure => f.write_str("failure"),
            Self::Pending => f.write_str("pending"),
        }
    }
}

/// The query string the processor appends to a back URL. Nothing in it is trusted: the payment id is looked up with
/// the processor, and the status is only a claim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnQuery {
    pub reference: Option<String>,
    pub external_reference: Option<String>,
    pub payment_id: Option<String>,
    pub collection_id: Option<String>,
    pub status: Option<String>,
    pub collection_status: Option<String>,
}

impl ReturnQuery {
    pub fn reference(&self) -> Option<Reference> {
        first_present([self.reference.clone(), self.external_reference.clone()]).map(Reference::from)
    }

    pub fn payment_id(&self) -> Option<String> {
        first_present([self.payment_id.clone(), self.collection_id.clone()])
    }

    pub fn claimed_status(&self) -> Option<String> {
        first_present([self.status.clone(), self.collection_status.clone()])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnResponse {
    pub reference: Reference,
    pub local_status: IntentStatus,
    pub external_status: Option<String>,
    /// True if the processor confirmed the payment during this visit.
    pub verified: bool,
    pub outcome: String,
    pub page: ReturnPage,
}

impl ReturnResponse {
    pub fn new(outcome: ReturnOutcome, page: ReturnPage) -> Self {
        let label = outcome.outcome_label().to_string();
        Self {
            reference: outcome.intent.reference,
            local_status: outcome.intent.local_status,
            external_status: outcome.intent.external_status,
            verified: outcome.verified,
            outcome: label,
            page,
        }
    }
}
