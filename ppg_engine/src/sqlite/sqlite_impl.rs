//! `SqliteDatabase` is a concrete implementation of a plan payment gateway backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
//!
//! SQLite has a single writer. Every reconcile transaction starts with a write to the intent row, so the transaction
//! holds the write lock before it reads the status it is going to act on. Concurrent reconcile calls therefore queue up
//! behind one another, and each of them sees the result of the one before.
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use sqlx::SqlitePool;

use super::db::{
    audit,
    db_url,
    intents,
    new_pool,
    notifications,
    plans,
    run_migrations,
    side_effects::apply_side_effects,
    subscribers,
};
use crate::{
    db_types::{
        IntentEvent,
        IntentStatus,
        NewPaymentIntent,
        Notification,
        PaymentIntent,
        Plan,
        Reference,
        SignalSource,
        Subscriber,
    },
    reconciler::{decide_transition, ProcessorStatus, Transition},
    side_effects::{completion_effects, rejection_effects},
    traits::{
        IntentManagement,
        IntentStoreError,
        PaymentIntentDatabase,
        PlanDirectory,
        ProcessorObservation,
        ReconcileResult,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl PaymentIntentDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, IntentStoreError> {
        let mut tx = self.pool.begin().await?;
        let intent = intents::insert_intent(intent, IntentStatus::Pending, None, &mut tx).await?;
        let observation = ProcessorObservation::new(intent.reference.clone(), "", SignalSource::Checkout);
        audit::record_observation(&observation, audit::CREATED, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment intent {} saved with id {}", intent.reference, intent.id);
        Ok(intent)
    }

    async fn activate_free_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, IntentStoreError> {
        let mut tx = self.pool.begin().await?;
        let pending = intents::insert_intent(intent, IntentStatus::Pending, None, &mut tx).await?;
        let effects = completion_effects(&pending, Utc::now());
        let completed =
            intents::transition_from_pending(&pending.reference, IntentStatus::Completed, Some(effects.window), &mut tx)
                .await?
                .ok_or_else(|| IntentStoreError::IntentNotFound(pending.reference.clone()))?;
        apply_side_effects(effects.effects, &mut tx).await?;
        let observation = ProcessorObservation::new(completed.reference.clone(), "", SignalSource::Checkout);
        audit::record_observation(&observation, Transition::Completed.label(), &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Free intent {} for {} activated", completed.reference, completed.payer_id);
        Ok(completed)
    }

    async fn reconcile_intent(&self, observation: ProcessorObservation) -> Result<ReconcileResult, IntentStoreError> {
        let reference = observation.reference.clone();
        let mut tx = self.pool.begin().await?;
        let Some(intent) = intents::lock_and_observe(&observation, &mut tx).await? else {
            // Dropping the transaction rolls it back
            return Err(IntentStoreError::IntentNotFound(reference));
        };
        let reported = ProcessorStatus::parse(&observation.status);
        let mut transition = decide_transition(intent.local_status, &reported);
        trace!(
            "🗃️ {reference} is {} and the {} signal reports '{reported}'. Transition: {transition}",
            intent.local_status,
            observation.source
        );
        let intent = match transition {
            Transition::Completed => {
                let effects = completion_effects(&intent, Utc::now());
                let target = IntentStatus::Completed;
                match intents::transition_from_pending(&reference, target, Some(effects.window), &mut tx).await? {
                    Some(updated) => {
                        apply_side_effects(effects.effects, &mut tx).await?;
                        updated
                    },
                    None => {
                        let current = intents::fetch_intent(&reference, &mut tx).await?.unwrap_or(intent);
                        transition = Transition::AlreadyTerminal(current.local_status);
                        current
                    },
                }
            },
            Transition::Rejected => {
                let target = IntentStatus::Rejected;
                match intents::transition_from_pending(&reference, target, None, &mut tx).await? {
                    Some(updated) => {
                        apply_side_effects(rejection_effects(&updated), &mut tx).await?;
                        updated
                    },
                    None => {
                        let current = intents::fetch_intent(&reference, &mut tx).await?.unwrap_or(intent);
                        transition = Transition::AlreadyTerminal(current.local_status);
                        current
                    },
                }
            },
            Transition::StillPending | Transition::Inconclusive | Transition::AlreadyTerminal(_) => intent,
        };
        audit::record_observation(&observation, transition.label(), &mut tx).await?;
        tx.commit().await?;
        Ok(ReconcileResult::new(intent, transition))
    }
}

impl IntentManagement for SqliteDatabase {
    async fn fetch_intent(&self, reference: &Reference) -> Result<Option<PaymentIntent>, IntentStoreError> {
        let mut conn = self.pool.acquire().await?;
        let intent = intents::fetch_intent(reference, &mut conn).await?;
        Ok(intent)
    }

    async fn fetch_intents_for_payer(&self, payer_id: &str) -> Result<Vec<PaymentIntent>, IntentStoreError> {
        let mut conn = self.pool.acquire().await?;
        let intents = intents::fetch_intents_for_payer(payer_id, &mut conn).await?;
        Ok(intents)
    }

    async fn fetch_intent_events(&self, reference: &Reference) -> Result<Vec<IntentEvent>, IntentStoreError> {
        let mut conn = self.pool.acquire().await?;
        let events = audit::fetch_events(reference, &mut conn).await?;
        Ok(events)
    }

    async fn fetch_subscriber(&self, payer_id: &str) -> Result<Option<Subscriber>, IntentStoreError> {
        let mut conn = self.pool.acquire().await?;
        let subscriber = subscribers::fetch_subscriber(payer_id, &mut conn).await?;
        Ok(subscriber)
    }

    async fn fetch_notifications(&self, recipient_id: &str) -> Result<Vec<Notification>, IntentStoreError> {
        let mut conn = self.pool.acquire().await?;
        let notifications = notifications::fetch_notifications(recipient_id, &mut conn).await?;
        Ok(notifications)
    }
}

impl PlanDirectory for SqliteDatabase {
    async fn fetch_plan(&self, plan_id: &str) -> Result<Option<Plan>, IntentStoreError> {
        let mut conn = self.pool.acquire().await?;
        let plan = plans::fetch_plan(plan_id, &mut conn).await?;
        Ok(plan)
    }

    async fn fetch_active_plans(&self) -> Result<Vec<Plan>, IntentStoreError> {
        let mut conn = self.pool.acquire().await?;
        let plans = plans::fetch_active_plans(&mut conn).await?;
        Ok(plans)
    }

    async fn upsert_plan(&self, plan: Plan) -> Result<Plan, IntentStoreError> {
        let mut conn = self.pool.acquire().await?;
        let plan = plans::upsert_plan(plan, &mut conn).await?;
        debug!("🗃️ Plan '{}' saved at {} {}", plan.id, plan.price, plan.currency);
        Ok(plan)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        run_migrations(&self.pool).await?;
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}
