use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{NewPaymentIntent, PaymentIntent, Plan, Reference, SignalSource},
    events::{EventProducers, PaymentCompletedEvent},
    helpers::new_reference,
    intent_objects::CheckoutResult,
    traits::{IntentStoreError, PaymentIntentDatabase, PaymentProcessor, PreferenceRequest, ReturnUrls},
    CheckoutError,
};

const DEFAULT_REFERENCE_ATTEMPTS: usize = 3;

/// Where the processor must send payers and notifications for checkouts opened by this engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOptions {
    /// The externally visible base URL of the server, without a trailing slash.
    pub public_base_url: String,
    pub notification_url: Option<String>,
    /// How many fresh references to try if a generated one is already taken.
    pub max_reference_attempts: usize,
}

impl CheckoutOptions {
    /// Return URLs and the notification URL are all derived from `public_base_url`.
    pub fn new<S: Into<String>>(public_base_url: S) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        let notification_url = Some(format!("{public_base_url}/payments/webhook"));
        Self { public_base_url, notification_url, max_reference_attempts: DEFAULT_REFERENCE_ATTEMPTS }
    }

    pub fn with_notification_url(mut self, url: Option<String>) -> Self {
        self.notification_url = url;
        self
    }

    pub fn return_urls(&self) -> ReturnUrls {
        let base = &self.public_base_url;
        ReturnUrls {
            success: format!("{base}/payments/return/success"),
            failure: format!("{base}/payments/return/failure"),
            pending: format!("{base}/payments/return/pending"),
        }
    }
}

/// `CheckoutApi` opens payment intents for plans.
pub struct CheckoutApi<B, P> {
    db: B,
    processor: P,
    options: CheckoutOptions,
    producers: EventProducers,
}

impl<B, P> Debug for CheckoutApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi ({})", self.options.public_base_url)
    }
}

impl<B, P> CheckoutApi<B, P> {
    pub fn new(db: B, processor: P, options: CheckoutOptions, producers: EventProducers) -> Self {
        Self { db, processor, options, producers }
    }

    pub fn options(&self) -> &CheckoutOptions {
        &self.options
    }
}

impl<B, P> CheckoutApi<B, P>
where
    B: PaymentIntentDatabase,
    P: PaymentProcessor,
{
    /// Starts the purchase of plan `subject_id` by `payer_id`.
    ///
    /// Free plans are activated immediately and the processor is never contacted. For paid plans a checkout session
    /// is opened with the processor first, and the intent is only stored once the processor has accepted it. If the
    /// processor call fails, nothing is stored.
    pub async fn checkout(&self, subject_id: &str, payer_id: &str) -> Result<CheckoutResult, CheckoutError> {
        let plan = self.db.fetch_plan(subject_id).await?.ok_or_else(|| {
            debug!("🛒️ Checkout requested for unknown plan '{subject_id}'");
            CheckoutError::PlanNotFound(subject_id.to_string())
        })?;
        if !plan.active {
            debug!("🛒️ Checkout requested for inactive plan '{subject_id}'");
            return Err(CheckoutError::PlanUnavailable(plan.id));
        }
        if plan.is_free() {
            let intent = self.activate_free_plan(&plan, payer_id).await?;
            return Ok(CheckoutResult::activated(intent.reference));
        }
        self.open_checkout(&plan, payer_id).await
    }

    async fn activate_free_plan(&self, plan: &Plan, payer_id: &str) -> Result<PaymentIntent, CheckoutError> {
        let mut attempts = 0;
        let intent = loop {
            attempts += 1;
            let reference = new_reference(&plan.id, Utc::now());
            let new_intent = NewPaymentIntent::for_plan(reference, plan, payer_id);
            match self.db.activate_free_intent(new_intent).await {
                Ok(intent) => break intent,
                Err(IntentStoreError::ReferenceAlreadyExists(r)) if attempts < self.options.max_reference_attempts => {
                    warn!("🛒️ Reference {r} is already taken. Trying another.");
                },
                Err(e) => return Err(e.into()),
            }
        };
        info!("🛒️ Free plan '{}' activated for {payer_id} with reference {}", plan.id, intent.reference);
        self.call_payment_completed_hook(&intent).await;
        Ok(intent)
    }

    async fn open_checkout(&self, plan: &Plan, payer_id: &str) -> Result<CheckoutResult, CheckoutError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let reference = self.unused_reference(&plan.id).await?;
            let request = self.preference_request(plan, payer_id, reference.clone());
            let session = self.processor.create_preference(request).await.map_err(|e| {
                warn!("🛒️ The processor refused a checkout session for {reference}. {e}");
                CheckoutError::from(e)
            })?;
            trace!("🛒️ Checkout session {} opened for {reference}", session.preference_id);
            let new_intent =
                NewPaymentIntent::for_plan(reference, plan, payer_id).with_preference_id(session.preference_id);
            match self.db.insert_intent(new_intent).await {
                Ok(intent) => {
                    info!(
                        "🛒️ Payment intent {} opened for {payer_id}: plan '{}' at {} {}",
                        intent.reference, intent.subject_id, intent.amount, intent.currency
                    );
                    return Ok(CheckoutResult::redirect(intent.reference, session.checkout_url));
                },
                // Another checkout claimed the reference in the meantime. The orphaned session is never paid for.
                Err(IntentStoreError::ReferenceAlreadyExists(r)) if attempts < self.options.max_reference_attempts => {
                    warn!("🛒️ Reference {r} was taken while opening its checkout session. Trying another.");
                },
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn unused_reference(&self, subject_id: &str) -> Result<Reference, CheckoutError> {
        for _ in 0..self.options.max_reference_attempts {
            let reference = new_reference(subject_id, Utc::now());
            if self.db.fetch_intent(&reference).await?.is_none() {
                return Ok(reference);
            }
            warn!("🛒️ Generated reference {reference} is already taken. Trying another.");
        }
        Err(CheckoutError::DatabaseError("Could not generate an unused payment reference".to_string()))
    }

    fn preference_request(&self, plan: &Plan, payer_id: &str, reference: Reference) -> PreferenceRequest {
        PreferenceRequest {
            reference,
            subject_id: plan.id.clone(),
            title: plan.name.clone(),
            amount: plan.price,
            currency: plan.currency.clone(),
            payer_id: payer_id.to_string(),
            return_urls: self.options.return_urls(),
            notification_url: self.options.notification_url.clone(),
        }
    }

    async fn call_payment_completed_hook(&self, intent: &PaymentIntent) {
        for emitter in &self.producers.payment_completed_producer {
            debug!("🛒️ Notifying payment completed hook subscribers");
            let event = PaymentCompletedEvent::new(intent.clone(), SignalSource::Checkout);
            emitter.publish_event(event).await;
        }
    }
}
