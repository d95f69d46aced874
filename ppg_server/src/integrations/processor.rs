//! Connects the engine's [`PaymentProcessor`] interface to the processor's REST API.
//!
//! The REST client speaks in the processor's own terms (preferences, `init_point`s, `transaction_amount`s). The engine
//! only knows [`PreferenceRequest`]s and [`ProcessorPayment`]s. The conversions between the two live here.
use log::*;
use ppg_common::Amount;
use ppg_engine::{
    db_types::Reference,
    traits::{CheckoutSession, PaymentProcessor, PreferenceRequest, ProcessorError, ProcessorPayment},
};
use processor_tools::{
    BackUrls,
    NewPreference,
    Payment,
    ProcessorApi,
    ProcessorApiError,
    ProcessorConfig,
    PreferenceItem,
};
use serde_json::json;

/// The processor redirects the payer back to us by itself once a payment is approved.
const AUTO_RETURN: &str = "approved";

#[derive(Clone)]
pub struct ProcessorClient {
    api: ProcessorApi,
}

impl ProcessorClient {
    pub fn new(config: ProcessorConfig) -> Result<Self, ProcessorApiError> {
        let api = ProcessorApi::new(config)?;
        Ok(Self { api })
    }

    fn use_sandbox(&self) -> bool {
        self.api.config().use_sandbox
    }
}

impl PaymentProcessor for ProcessorClient {
    async fn create_preference(&self, request: PreferenceRequest) -> Result<CheckoutSession, ProcessorError> {
        let reference = request.reference.clone();
        let preference = new_preference(request);
        let result =
            self.api.create_preference(&preference).await.map_err(|e| processor_error(e, reference.as_str()))?;
        let checkout_url = result.checkout_url(self.use_sandbox()).map(String::from).ok_or_else(|| {
            ProcessorError::InvalidResponse(format!("Preference {} for {reference} has no checkout URL", result.id))
        })?;
        Ok(CheckoutSession { preference_id: result.id, checkout_url })
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<ProcessorPayment, ProcessorError> {
        let payment = self.api.get_payment(payment_id).await.map_err(|e| processor_error(e, payment_id))?;
        Ok(processor_payment(payment))
    }

    async fn search_payments(&self, reference: &Reference) -> Result<Vec<ProcessorPayment>, ProcessorError> {
        let result = self
            .api
            .search_payments_by_reference(reference.as_str())
            .await
            .map_err(|e| processor_error(e, reference.as_str()))?;
        let mut payments = result.results.into_iter().map(processor_payment).collect::<Vec<_>>();
        payments.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(payments)
    }
}

pub fn new_preference(request: PreferenceRequest) -> NewPreference {
    let PreferenceRequest {
        reference,
        subject_id,
        title,
        amount,
        currency,
        payer_id,
        return_urls,
        notification_url,
    } = request;
    let item = PreferenceItem {
        id: subject_id.clone(),
        title,
        quantity: 1,
        unit_price: amount.as_major(),
        currency_id: currency,
    };
    NewPreference {
        items: vec![item],
        external_reference: reference.to_string(),
        back_urls: BackUrls {
            success: return_urls.success,
            failure: return_urls.failure,
            pending: return_urls.pending,
        },
        auto_return: Some(AUTO_RETURN.to_string()),
        notification_url,
        metadata: Some(json!({ "payer_id": payer_id, "subject_id": subject_id })),
    }
}

pub fn processor_payment(payment: Payment) -> ProcessorPayment {
    let amount = payment.transaction_amount.and_then(|a| {
        Amount::try_from(a).map_err(|e| warn!("🔄️ Payment {} has an unusable amount. {e}", payment.id)).ok()
    });
    let external_reference =
        payment.external_reference.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()).map(Reference::from);
    ProcessorPayment {
        id: payment.id,
        status: payment.status,
        status_detail: payment.status_detail,
        external_reference,
        amount,
        currency: payment.currency_id,
        last_updated: payment.date_last_updated.or(payment.date_approved).or(payment.date_created),
    }
}

/// `subject` is whatever was asked for: a payment id or a reference.
pub fn processor_error(e: ProcessorApiError, subject: &str) -> ProcessorError {
    match e {
        e if e.is_not_found() => ProcessorError::NotFound(subject.to_string()),
        ProcessorApiError::InvalidPaymentId(id) => ProcessorError::NotFound(id),
        ProcessorApiError::Timeout(s) => ProcessorError::Timeout(s),
        ProcessorApiError::JsonError(s) | ProcessorApiError::RestResponseError(s) => ProcessorError::InvalidResponse(s),
        e => ProcessorError::Unavailable(e.to_string()),
    }
}
