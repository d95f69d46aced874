//! An in-memory payment processor.
//!
//! Tests create payments on it directly, the way a payer would by completing the hosted checkout, and then deliver the
//! corresponding signals to the engine. Every call is counted so that tests can assert on processor traffic.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::Utc;

use crate::{
    db_types::Reference,
    traits::{CheckoutSession, PaymentProcessor, PreferenceRequest, ProcessorError, ProcessorPayment},
};

#[derive(Debug, Default)]
struct FakeProcessorState {
    payments: HashMap<String, ProcessorPayment>,
    preferences: Vec<PreferenceRequest>,
    fetch_calls: usize,
    search_calls: usize,
    failure: Option<ProcessorError>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeProcessor {
    state: Arc<Mutex<FakeProcessorState>>,
}

impl FakeProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeProcessorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Records a payment with status `status` against `reference`, or updates it if it already exists.
    pub fn set_payment(&self, payment_id: &str, reference: &Reference, status: &str) -> ProcessorPayment {
        let payment =
            ProcessorPayment::new(payment_id, status).with_reference(reference.clone()).with_last_updated(Utc::now());
        self.state().payments.insert(payment_id.to_string(), payment.clone());
        payment
    }

    pub fn insert_payment(&self, payment: ProcessorPayment) {
        self.state().payments.insert(payment.id.clone(), payment);
    }

    /// Every subsequent call fails with `error` until [`Self::recover`] is called.
    pub fn fail_with(&self, error: ProcessorError) {
        self.state().failure = Some(error);
    }

    pub fn recover(&self) {
        self.state().failure = None;
    }

    pub fn preferences(&self) -> Vec<PreferenceRequest> {
        self.state().preferences.clone()
    }

    pub fn preference_calls(&self) -> usize {
        self.state().preferences.len()
    }

    pub fn fetch_calls(&self) -> usize {
        self.state().fetch_calls
    }

    pub fn search_calls(&self) -> usize {
        self.state().search_calls
    }

    pub fn total_calls(&self) -> usize {
        let state = self.state();
        state.preferences.len() + state.fetch_calls + state.search_calls
    }
}

impl PaymentProcessor for FakeProcessor {
    async fn create_preference(&self, request: PreferenceRequest) -> Result<CheckoutSession, ProcessorError> {
        let mut state = self.state();
        state.preferences.push(request);
        if let Some(e) = &state.failure {
            return Err(e.clone());
        }
        let preference_id = format!("pref-{}", state.preferences.len());
        let checkout_url = format!("https://checkout.example.com/pay?pref_id={preference_id}");
        Ok(CheckoutSession { preference_id, checkout_url })
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<ProcessorPayment, ProcessorError> {
        let mut state = self.state();
        state.fetch_calls += 1;
        if let Some(e) = &state.failure {
            return Err(e.clone());
        }
        state.payments.get(payment_id).cloned().ok_or_else(|| ProcessorError::NotFound(payment_id.to_string()))
    }

    async fn search_payments(&self, reference: &Reference) -> Result<Vec<ProcessorPayment>, ProcessorError> {
        let mut state = self.state();
        state.search_calls += 1;
        if let Some(e) = &state.failure {
            return Err(e.clone());
        }
        let mut payments = state
            .payments
            .values()
            .filter(|p| p.external_reference.as_ref() == Some(reference))
            .cloned()
            .collect::<Vec<_>>();
        payments.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(payments)
    }
}
