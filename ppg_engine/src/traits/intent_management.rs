use crate::{
    db_types::{IntentEvent, Notification, PaymentIntent, Reference, Subscriber},
    traits::IntentStoreError,
};

/// Read-only queries against the payment intent store and the directories it writes to.
///
/// None of these take the reconcile lock. Status only ever moves towards a terminal value, so a stale read is merely
/// out of date, never wrong.
#[allow(async_fn_in_trait)]
pub trait IntentManagement {
    async fn fetch_intent(&self, reference: &Reference) -> Result<Option<PaymentIntent>, IntentStoreError>;

    /// All intents created by `payer_id`, newest first.
    async fn fetch_intents_for_payer(&self, payer_id: &str) -> Result<Vec<PaymentIntent>, IntentStoreError>;

    /// The audit trail for `reference`, oldest first.
    async fn fetch_intent_events(&self, reference: &Reference) -> Result<Vec<IntentEvent>, IntentStoreError>;

    async fn fetch_subscriber(&self, payer_id: &str) -> Result<Option<Subscriber>, IntentStoreError>;

    /// All notifications addressed to `recipient_id`, oldest first.
    async fn fetch_notifications(&self, recipient_id: &str) -> Result<Vec<Notification>, IntentStoreError>;
}
