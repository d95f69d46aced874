use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{IntentEvent, Notification, PaymentIntent, Plan, Reference, Subscriber},
    traits::{IntentManagement, IntentStoreError, PlanDirectory},
};

/// Read-only access to payment intents and the state they produced, plus plan maintenance.
pub struct IntentApi<B> {
    db: B,
}

impl<B> Debug for IntentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IntentApi")
    }
}

impl<B> IntentApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> IntentApi<B>
where B: IntentManagement
{
    pub async fn intent(&self, reference: &Reference) -> Result<Option<PaymentIntent>, IntentStoreError> {
        self.db.fetch_intent(reference).await
    }

    /// The intent with the given reference, but only if it belongs to `payer_id`. Other payers' intents are reported
    /// as `None`, exactly as if they did not exist.
    pub async fn intent_for_payer(
        &self,
        reference: &Reference,
        payer_id: &str,
    ) -> Result<Option<PaymentIntent>, IntentStoreError> {
        let intent = self.db.fetch_intent(reference).await?;
        Ok(intent.filter(|i| {
            let owned = i.payer_id == payer_id;
            if !owned {
                debug!("🗃️ {payer_id} asked for {reference}, which belongs to someone else");
            }
            owned
        }))
    }

    pub async fn intents_for_payer(&self, payer_id: &str) -> Result<Vec<PaymentIntent>, IntentStoreError> {
        self.db.fetch_intents_for_payer(payer_id).await
    }

    pub async fn history(&self, reference: &Reference) -> Result<Vec<IntentEvent>, IntentStoreError> {
        self.db.fetch_intent_events(reference).await
    }

    pub async fn subscriber(&self, payer_id: &str) -> Result<Option<Subscriber>, IntentStoreError> {
        self.db.fetch_subscriber(payer_id).await
    }

    pub async fn notifications(&self, recipient_id: &str) -> Result<Vec<Notification>, IntentStoreError> {
        self.db.fetch_notifications(recipient_id).await
    }
}

impl<B> IntentApi<B>
where B: PlanDirectory
{
    pub async fn plan(&self, plan_id: &str) -> Result<Option<Plan>, IntentStoreError> {
        self.db.fetch_plan(plan_id).await
    }

    pub async fn active_plans(&self) -> Result<Vec<Plan>, IntentStoreError> {
        self.db.fetch_active_plans().await
    }

    pub async fn upsert_plan(&self, plan: Plan) -> Result<Plan, IntentStoreError> {
        self.db.upsert_plan(plan).await
    }
}
