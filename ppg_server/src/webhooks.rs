//! Processor notification handling.
//!
//! The processor retries a notification until it receives a 2xx answer, and an endpoint that keeps failing eventually
//! gets switched off on its side. So every notification is acknowledged with a 200, whatever happened to it, and the
//! outcome is reported in the body as a [`WebhookStatus`] token:
//!
//! | status              | meaning                                                            |
//! |---------------------|--------------------------------------------------------------------|
//! | `ignored`           | Not a payment notification                                         |
//! | `no_id`             | No payment id in the query string or the body                      |
//! | `signature_invalid` | Missing or wrong `x-signature`. Nothing was done                   |
//! | `processed`         | The payment was fetched and reconciled (including no-op repeats)   |
//! | `unknown_reference` | The payment was not made through this gateway                      |
//! | `error`             | The processor or the database failed. A retry may succeed          |
use log::*;
use ppg_engine::{
    db_types::SignalSource,
    helpers::WebhookSignatureVerifier,
    PaymentIntentDatabase,
    PaymentProcessor,
    ReconciliationApi,
    ReconciliationError,
};

use crate::data_objects::{WebhookAck, WebhookNotification, WebhookStatus};

pub async fn process_notification<B, P>(
    notification: WebhookNotification,
    api: &ReconciliationApi<B, P>,
    verifier: &WebhookSignatureVerifier,
) -> WebhookAck
where
    B: PaymentIntentDatabase,
    P: PaymentProcessor,
{
    if !notification.is_payment_topic() {
        let topic = notification.topic.as_deref().unwrap_or("none");
        debug!("🪝️ Ignoring notification with topic '{topic}'");
        return WebhookAck::new(WebhookStatus::Ignored, format!("Topic '{topic}' is not handled"));
    }
    let Some(payment_id) = notification.payment_id else {
        warn!("🪝️ Received a payment notification without a payment id");
        return WebhookAck::new(WebhookStatus::NoId, "The notification does not identify a payment");
    };
    let request_id = notification.request_id.as_deref();
    if !verifier.verify(notification.signature.as_deref(), &payment_id, request_id) {
        return WebhookAck::new(WebhookStatus::SignatureInvalid, "The notification signature is not valid");
    }
    debug!("🪝️ Processing notification for payment {payment_id} (request {})", request_id.unwrap_or("n/a"));
    match api.reconcile_payment(&payment_id, SignalSource::Webhook).await {
        Ok(result) => {
            let message = format!("{}: {}", result.intent.reference, result.transition);
            info!("🪝️ Payment {payment_id} processed. {message}");
            WebhookAck::new(WebhookStatus::Processed, message)
        },
        Err(e @ (ReconciliationError::UnknownReference(_) | ReconciliationError::MissingReference(_))) => {
            warn!("🪝️ Payment {payment_id} does not belong to any payment intent. {e}");
            WebhookAck::new(WebhookStatus::UnknownReference, e)
        },
        Err(e) => {
            error!("🪝️ Could not process the notification for payment {payment_id}. {e}");
            WebhookAck::new(WebhookStatus::Error, e)
        },
    }
}
