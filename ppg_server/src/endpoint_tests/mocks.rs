use mockall::mock;
use ppg_engine::{
    db_types::{IntentEvent, Notification, PaymentIntent, Reference, Subscriber},
    traits::{
        CheckoutSession,
        IntentManagement,
        IntentStoreError,
        PaymentProcessor,
        PreferenceRequest,
        ProcessorError,
        ProcessorPayment,
    },
};

mock! {
    pub IntentStore {}
    impl IntentManagement for IntentStore {
        async fn fetch_intent(&self, reference: &Reference) -> Result<Option<PaymentIntent>, IntentStoreError>;
        async fn fetch_intents_for_payer(&self, payer_id: &str) -> Result<Vec<PaymentIntent>, IntentStoreError>;
        async fn fetch_intent_events(&self, reference: &Reference) -> Result<Vec<IntentEvent>, IntentStoreError>;
        async fn fetch_subscriber(&self, payer_id: &str) -> Result<Option<Subscriber>, IntentStoreError>;
        async fn fetch_notifications(&self, recipient_id: &str) -> Result<Vec<Notification>, IntentStoreError>;
    }
}

mock! {
    pub Processor {}
    impl PaymentProcessor for Processor {
        async fn create_preference(&self, request: PreferenceRequest) -> Result<CheckoutSession, ProcessorError>;
        async fn fetch_payment(&self, payment_id: &str) -> Result<ProcessorPayment, ProcessorError>;
        async fn search_payments(&self, reference: &Reference) -> Result<Vec<ProcessorPayment>, ProcessorError>;
    }
}
