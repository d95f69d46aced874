//! # Webhook signatures
//!
//! The processor signs every notification it sends. The signature travels in the `x-signature` header:
//!
//! ```text
//!    x-signature: ts=1728997391,v1=8a1f...e3
//! ```
//!
//! `v1` is the hex-encoded HMAC-SHA256, keyed with the webhook secret shared with the processor, of the manifest
//!
//! ```text
//!    id:{payment_id};request-id:{x-request-id};ts:{ts};
//! ```
//!
//! where `payment_id` is the id of the notified payment, exactly as it was notified, and `x-request-id` is the value of
//! the header of the same name. A part whose value was not supplied with the notification is left out of the manifest
//! entirely.
//!
//! The signature does not cover the notification body, so nothing in the body is trusted. The receiver only uses the
//! payment id to fetch the payment from the processor.
use hmac::{Hmac, Mac};
use log::*;
use ppg_common::Secret;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// The parsed `x-signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub ts: String,
    pub v1: String,
}

impl SignatureHeader {
    /// Parses `ts=..,v1=..`. Order does not matter, whitespace around the parts is ignored and unknown parts are
    /// skipped. Returns `None` if either `ts` or `v1` is missing or empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut ts = None;
        let mut v1 = None;
        for part in raw.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "ts" if !value.is_empty() => ts = Some(value.to_string()),
                "v1" if !value.is_empty() => v1 = Some(value.to_string()),
                _ => {},
            }
        }
        Some(Self { ts: ts?, v1: v1? })
    }
}

pub fn manifest(payment_id: &str, request_id: Option<&str>, ts: &str) -> String {
    let mut result = String::with_capacity(64);
    let payment_id = payment_id.trim();
    if !payment_id.is_empty() {
        result.push_str(&format!("id:{payment_id};"));
    }
    if let Some(request_id) = request_id.map(str::trim).filter(|s| !s.is_empty()) {
        result.push_str(&format!("request-id:{request_id};"));
    }
    result.push_str(&format!("ts:{ts};"));
    result
}

/// Checks webhook signatures against the shared secret.
///
/// The policy for a missing secret is fixed when the verifier is built:
/// * in production, every notification is rejected;
/// * otherwise every notification is accepted, and a warning is logged each time.
///
/// With a secret configured, notifications without a well-formed signature header are always rejected.
#[derive(Debug, Clone)]
pub struct WebhookSignatureVerifier {
    secret: Option<Secret<String>>,
    production: bool,
}

impl WebhookSignatureVerifier {
    pub fn new(secret: Secret<String>, production: bool) -> Self {
        let secret = if secret.is_empty() { None } else { Some(secret) };
        if secret.is_none() {
            if production {
                error!("🔐️ No webhook secret is configured. All processor notifications will be rejected.");
            } else {
                warn!(
                    "🔐️ No webhook secret is configured. Processor notifications will NOT be authenticated. This is \
                     only acceptable during local development."
                );
            }
        }
        Self { secret, production }
    }

    pub fn is_production(&self) -> bool {
        self.production
    }

    /// Returns true if the notification is authentic (or authentication is switched off for development). Never panics.
    pub fn verify(&self, header: Option<&str>, payment_id: &str, request_id: Option<&str>) -> bool {
        let Some(secret) = &self.secret else {
            if self.production {
                warn!("🔐️ Rejecting notification for payment {payment_id}. No webhook secret is configured.");
                return false;
            }
            warn!("🔐️ Accepting unauthenticated notification for payment {payment_id}. No webhook secret is configured.");
            return true;
        };
        let Some(header) = header.and_then(SignatureHeader::parse) else {
            warn!("🔐️ Notification for payment {payment_id} has a missing or malformed signature header.");
            return false;
        };
        let manifest = manifest(payment_id, request_id, &header.ts);
        let Some(expected) = sign_manifest(secret.reveal(), &manifest) else {
            error!("🔐️ Could not initialise the HMAC for webhook signature checks.");
            return false;
        };
        let provided = header.v1.to_ascii_lowercase();
        let valid: bool = expected.as_bytes().ct_eq(provided.as_bytes()).into();
        if valid {
            trace!("🔐️ Signature for payment {payment_id} ✅️");
        } else {
            warn!("🔐️ Invalid signature for payment {payment_id}.");
        }
        valid
    }

    /// Produces an `x-signature` header value for the given notification, or `None` if no secret is configured.
    pub fn sign(&self, payment_id: &str, request_id: Option<&str>, ts: i64) -> Option<String> {
        let secret = self.secret.as_ref()?;
        let ts = ts.to_string();
        let v1 = sign_manifest(secret.reveal(), &manifest(payment_id, request_id, &ts))?;
        Some(format!("ts={ts},v1={v1}"))
    }
}

fn sign_manifest(secret: &str, manifest: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(manifest.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}
