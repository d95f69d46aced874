use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{PaymentIntent, Reference, SignalSource},
    events::{EventProducers, PaymentCompletedEvent, PaymentRejectedEvent},
    intent_objects::{ReturnConfirmation, ReturnOutcome},
    reconciler::{ProcessorStatus, Transition},
    traits::{PaymentIntentDatabase, PaymentProcessor, ProcessorObservation, ProcessorPayment, ReconcileResult},
    ReconciliationError,
};

/// `ReconciliationApi` applies processor signals to payment intents.
///
/// Every entry point funnels into [`ReconciliationApi::reconcile`]. Processor calls are always made before the
/// backend's reconcile transaction is opened, so no lock is held while waiting on the network. A processor failure
/// never changes the state of an intent.
pub struct ReconciliationApi<B, P> {
    db: B,
    processor: P,
    producers: EventProducers,
}

impl<B, P> Debug for ReconciliationApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B, P> ReconciliationApi<B, P> {
    pub fn new(db: B, processor: P, producers: EventProducers) -> Self {
        Self { db, processor, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, P> ReconciliationApi<B, P>
where
    B: PaymentIntentDatabase,
    P: PaymentProcessor,
{
    /// Applies a single observation to the intent it refers to and publishes the resulting event, if any.
    ///
    /// Repeating an observation is harmless. Only the observation that moves the intent out of `Pending` applies side
    /// effects and publishes an event.
    pub async fn reconcile(&self, observation: ProcessorObservation) -> Result<ReconcileResult, ReconciliationError> {
        let source = observation.source;
        let result = self.db.reconcile_intent(observation).await?;
        let reference = &result.intent.reference;
        match result.transition {
            Transition::Completed => {
                info!("🔄️ Payment intent {reference} is Completed ({source})");
                self.call_payment_completed_hook(&result.intent, source).await;
            },
            Transition::Rejected => {
                info!("🔄️ Payment intent {reference} is Rejected ({source})");
                self.call_payment_rejected_hook(&result.intent, source).await;
            },
            Transition::StillPending => debug!("🔄️ Payment intent {reference} is still pending ({source})"),
            Transition::Inconclusive => debug!(
                "🔄️ The processor status '{}' for {reference} has no local meaning. Only the audit trail was updated.",
                result.intent.external_status.as_deref().unwrap_or_default()
            ),
            Transition::AlreadyTerminal(status) => {
                debug!("🔄️ Payment intent {reference} is already {status}. Ignoring the {source} signal.")
            },
        }
        Ok(result)
    }

    /// Fetches payment `payment_id` from the processor and reconciles the intent it was made against.
    ///
    /// This is what a webhook notification boils down to. Nothing but the payment id is taken from the notification.
    pub async fn reconcile_payment(
        &self,
        payment_id: &str,
        source: SignalSource,
    ) -> Result<ReconcileResult, ReconciliationError> {
        let payment = self.processor.fetch_payment(payment_id).await.map_err(|e| {
            warn!("🔄️ Could not fetch payment {payment_id} from the processor. {e}");
            ReconciliationError::from(e)
        })?;
        let reference = payment.external_reference.clone().ok_or_else(|| {
            warn!("🔄️ Payment {payment_id} does not carry a reference. It was not made through this gateway.");
            ReconciliationError::MissingReference(payment_id.to_string())
        })?;
        self.reconcile(observation_of(reference, &payment, source)).await
    }

    /// Handles the payer's browser coming back from the processor's checkout page.
    ///
    /// * With a payment id, the payment is fetched from the processor and reconciled, provided it belongs to the
    ///   reference in the redirect. A payment belonging to another reference is refused and the current state is
    ///   returned, as it is when the processor cannot be reached. If the redirect carries no id, the id already stored
    ///   on the intent is used.
    /// * With no payment id from either place, a claimed `approved` status is only acted upon if `trust_claimed` is
    ///   set. It is recorded as a [`SignalSource::ReturnUrlClaimed`] observation and cannot move a terminal intent.
    /// * Otherwise the intent is returned as it stands.
    pub async fn confirm_return(&self, confirmation: ReturnConfirmation) -> Result<ReturnOutcome, ReconciliationError> {
        let ReturnConfirmation { reference, payment_id, claimed_status, trust_claimed } = confirmation;
        let current = self.current_intent(&reference).await?;
        let payment_id = payment_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .or_else(|| current.external_payment_id.clone());
        if let Some(payment_id) = payment_id.as_deref() {
            let payment = match self.processor.fetch_payment(payment_id).await {
                Ok(p) => p,
                Err(e) => {
                    warn!("🔄️ Could not confirm payment {payment_id} for {reference} with the processor. {e}");
                    return Ok(ReturnOutcome::unchanged(current));
                },
            };
            if let Err(e) = check_reference(&payment, &reference) {
                warn!("🔄️ Refusing payment {payment_id} on the return visit for {reference}. {e}");
                return Ok(ReturnOutcome::unchanged(current));
            }
            let result = self.reconcile(observation_of(reference, &payment, SignalSource::ReturnUrl)).await?;
            return Ok(ReturnOutcome { intent: result.intent, verified: true, transition: Some(result.transition) });
        }
        let claimed = claimed_status.as_deref().map(ProcessorStatus::parse);
        match claimed {
            Some(ProcessorStatus::Approved) if trust_claimed => {
                warn!(
                    "🔄️ Acting on an unverified 'approved' claim for {reference}. No payment id is known for the \
                     return visit."
                );
                let observation = ProcessorObservation::new(reference, "approved", SignalSource::ReturnUrlClaimed);
                let result = self.reconcile(observation).await?;
                Ok(ReturnOutcome { intent: result.intent, verified: false, transition: Some(result.transition) })
            },
            Some(status) => {
                debug!("🔄️ Ignoring unverified status claim '{status}' for {reference}");
                Ok(ReturnOutcome::unchanged(current))
            },
            None => Ok(ReturnOutcome::unchanged(current)),
        }
    }

    /// Asks the processor for the latest state of a pending intent and reconciles it.
    ///
    /// Terminal intents are returned as they are, without contacting the processor. If the processor cannot be
    /// reached, or knows of no payment for the reference yet, the intent is returned unchanged.
    pub async fn refresh(&self, reference: &Reference) -> Result<PaymentIntent, ReconciliationError> {
        let intent = self.current_intent(reference).await?;
        if intent.is_terminal() {
            trace!("🔄️ {reference} is already {}. Nothing to refresh.", intent.local_status);
            return Ok(intent);
        }
        let payment = match &intent.external_payment_id {
            Some(payment_id) => self.processor.fetch_payment(payment_id).await.map(Some),
            None => self.processor.search_payments(reference).await.map(latest_payment),
        };
        let payment = match payment {
            Ok(Some(p)) => p,
            Ok(None) => {
                debug!("🔄️ The processor has no payments for {reference} yet");
                return Ok(intent);
            },
            Err(e) => {
                warn!("🔄️ Could not refresh {reference} from the processor. {e}");
                return Ok(intent);
            },
        };
        if let Err(e) = check_reference(&payment, reference) {
            warn!("🔄️ Ignoring payment {} while refreshing {reference}. {e}", payment.id);
            return Ok(intent);
        }
        let result = self.reconcile(observation_of(reference.clone(), &payment, SignalSource::Poll)).await?;
        Ok(result.intent)
    }

    async fn current_intent(&self, reference: &Reference) -> Result<PaymentIntent, ReconciliationError> {
        self.db
            .fetch_intent(reference)
            .await?
            .ok_or_else(|| ReconciliationError::UnknownReference(reference.clone()))
    }

    async fn call_payment_completed_hook(&self, intent: &PaymentIntent, source: SignalSource) {
        for emitter in &self.producers.payment_completed_producer {
            debug!("🔄️ Notifying payment completed hook subscribers");
            emitter.publish_event(PaymentCompletedEvent::new(intent.clone(), source)).await;
        }
    }

    async fn call_payment_rejected_hook(&self, intent: &PaymentIntent, source: SignalSource) {
        for emitter in &self.producers.payment_rejected_producer {
            debug!("🔄️ Notifying payment rejected hook subscribers");
            emitter.publish_event(PaymentRejectedEvent::new(intent.clone(), source)).await;
        }
    }
}

fn observation_of(reference: Reference, payment: &ProcessorPayment, source: SignalSource) -> ProcessorObservation {
    ProcessorObservation::new(reference, payment.status.as_str(), source).with_payment_id(payment.id.as_str())
}

fn check_reference(payment: &ProcessorPayment, expected: &Reference) -> Result<(), ReconciliationError> {
    match &payment.external_reference {
        Some(found) if found == expected => Ok(()),
        Some(found) => {
            Err(ReconciliationError::ReferenceMismatch { expected: expected.clone(), found: found.clone() })
        },
        None => Err(ReconciliationError::MissingReference(payment.id.clone())),
    }
}

/// The most recently updated payment. Payments without a timestamp lose to those with one, and ties go to the payment
/// listed first.
fn latest_payment(payments: Vec<ProcessorPayment>) -> Option<ProcessorPayment> {
    payments.into_iter().reduce(|best, p| if p.last_updated > best.last_updated { p } else { best })
}
