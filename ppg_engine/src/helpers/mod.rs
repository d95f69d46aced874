mod reference;
mod webhook_signature;

pub use reference::{new_reference, REFERENCE_PREFIX};
pub use webhook_signature::{manifest, SignatureHeader, WebhookSignatureVerifier};
