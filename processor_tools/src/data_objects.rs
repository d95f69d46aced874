//! Typed request and response bodies for the processor's REST API.
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

//--------------------------------------     Preferences       -------------------------------------------------------

/// The body of a "create preference" call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPreference {
    pub items: Vec<PreferenceItem>,
    /// Our correlation id. The processor echoes it back on every payment made against the preference.
    pub external_reference: String,
    pub back_urls: BackUrls,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_return: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceItem {
    pub id: String,
    pub title: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub currency_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preference {
    pub id: String,
    #[serde(default)]
    pub init_point: Option<String>,
    #[serde(default)]
    pub sandbox_init_point: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
}

impl Preference {
    /// The URL the payer must be sent to. Falls back to the other variant if the preferred one is missing.
    pub fn checkout_url(&self, sandbox: bool) -> Option<&str> {
        let (first, second) = if sandbox {
            (&self.sandbox_init_point, &self.init_point)
        } else {
            (&self.init_point, &self.sandbox_init_point)
        };
        first.as_deref().or(second.as_deref()).filter(|s| !s.is_empty())
    }
}

//--------------------------------------       Payments        -------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub status_detail: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub transaction_amount: Option<f64>,
    #[serde(default)]
    pub currency_id: Option<String>,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_approved: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentSearchResult {
    #[serde(default)]
    pub results: Vec<Payment>,
}

impl PaymentSearchResult {
    /// The most recently updated payment in the result set, if any.
    pub fn latest(&self) -> Option<&Payment> {
        self.results.iter().max_by_key(|p| p.date_last_updated.or(p.date_created))
    }
}

/// Processor ids are numeric in responses but strings everywhere else (webhooks, redirects). Normalise to `String`.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where D: Deserializer<'de> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        v => Err(de::Error::custom(format!("expected a string or number id, got {v}"))),
    }
}
