use chrono::Utc;
use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{IntentStatus, NewPaymentIntent, PaymentIntent, Reference},
    side_effects::ValidityWindow,
    traits::{IntentStoreError, ProcessorObservation},
};

/// Inserts a new intent with the given initial status. This is not atomic. Embed the call in a transaction if it must
/// happen together with other writes.
///
/// A reused reference is reported as [`IntentStoreError::ReferenceAlreadyExists`].
pub async fn insert_intent(
    intent: NewPaymentIntent,
    status: IntentStatus,
    window: Option<ValidityWindow>,
    conn: &mut SqliteConnection,
) -> Result<PaymentIntent, IntentStoreError> {
    let reference = intent.reference.clone();
    let now = Utc::now();
    let result = sqlx::query_as(
        r#"
            INSERT INTO payment_intents (
                reference,
                subject_type,
                subject_id,
                payer_id,
                amount,
                currency,
                period_days,
                local_status,
                external_preference_id,
                window_start,
                window_end,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING *;
        "#,
    )
    .bind(intent.reference)
    .bind(intent.subject_type)
    .bind(intent.subject_id)
    .bind(intent.payer_id)
    .bind(intent.amount)
    .bind(intent.currency)
    .bind(intent.period_days)
    .bind(status)
    .bind(intent.external_preference_id)
    .bind(window.map(|w| w.start))
    .bind(window.map(|w| w.end))
    .bind(now)
    .fetch_one(conn)
    .await;
    match result {
        Ok(intent) => Ok(intent),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            warn!("🗃️ Payment reference {reference} has been used before");
            Err(IntentStoreError::ReferenceAlreadyExists(reference))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_intent(
    reference: &Reference,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentIntent>, sqlx::Error> {
    let intent = sqlx::query_as("SELECT * FROM payment_intents WHERE reference = $1")
        .bind(reference.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(intent)
}

pub async fn fetch_intents_for_payer(
    payer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentIntent>, sqlx::Error> {
    let intents = sqlx::query_as("SELECT * FROM payment_intents WHERE payer_id = $1 ORDER BY id DESC")
        .bind(payer_id)
        .fetch_all(conn)
        .await?;
    Ok(intents)
}

/// The first statement of every reconcile transaction. It writes to the intent row, which takes the database write
/// lock for the remainder of the transaction, and returns the locked row.
///
/// Authoritative observations record the reported status and payment id on the way. A known payment id is never
/// erased by an observation that does not carry one. Claimed observations leave the processor fields alone.
///
/// Returns `None` if there is no intent for the reference.
pub async fn lock_and_observe(
    observation: &ProcessorObservation,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentIntent>, sqlx::Error> {
    let intent = if observation.source.is_authoritative() {
        sqlx::query_as(
            r#"
            UPDATE payment_intents SET
                external_payment_id = COALESCE($1, external_payment_id),
                external_status = $2,
                updated_at = $3
            WHERE reference = $4
            RETURNING *;
            "#,
        )
        .bind(observation.external_payment_id.as_deref())
        .bind(observation.status.as_str())
        .bind(Utc::now())
        .bind(observation.reference.as_str())
        .fetch_optional(conn)
        .await?
    } else {
        sqlx::query_as("UPDATE payment_intents SET updated_at = updated_at WHERE reference = $1 RETURNING *")
            .bind(observation.reference.as_str())
            .fetch_optional(conn)
            .await?
    };
    Ok(intent)
}

/// Moves a `Pending` intent to `target`. This is a compare-and-set: if the intent is no longer `Pending`, nothing is
/// written and `None` is returned.
pub async fn transition_from_pending(
    reference: &Reference,
    target: IntentStatus,
    window: Option<ValidityWindow>,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentIntent>, sqlx::Error> {
    let intent: Option<PaymentIntent> = sqlx::query_as(
        r#"
        UPDATE payment_intents SET
            local_status = $1,
            window_start = COALESCE($2, window_start),
            window_end = COALESCE($3, window_end),
            updated_at = $4
        WHERE reference = $5 AND local_status = 'Pending'
        RETURNING *;
        "#,
    )
    .bind(target)
    .bind(window.map(|w| w.start))
    .bind(window.map(|w| w.end))
    .bind(Utc::now())
    .bind(reference.as_str())
    .fetch_optional(conn)
    .await?;
    match &intent {
        Some(_) => trace!("🗃️ Intent {reference} moved from Pending to {target}"),
        None => debug!("🗃️ Intent {reference} was no longer Pending. It was not moved to {target}"),
    }
    Ok(intent)
}
