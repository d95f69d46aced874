//! The `intent_events` audit trail. Rows are only ever appended.
use sqlx::SqliteConnection;

use crate::{
    db_types::{IntentEvent, Reference},
    traits::ProcessorObservation,
};

/// Label used for the audit entry written when an intent is created.
pub const CREATED: &str = "created";

pub async fn record_observation(
    observation: &ProcessorObservation,
    outcome: &str,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO intent_events (reference, source, reported_status, external_payment_id, outcome)
        VALUES ($1, $2, $3, $4, $5);
        "#,
    )
    .bind(observation.reference.as_str())
    .bind(observation.source)
    .bind(Some(observation.status.as_str()).filter(|s| !s.is_empty()))
    .bind(observation.external_payment_id.as_deref())
    .bind(outcome)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_events(reference: &Reference, conn: &mut SqliteConnection) -> Result<Vec<IntentEvent>, sqlx::Error> {
    let events = sqlx::query_as("SELECT * FROM intent_events WHERE reference = $1 ORDER BY id")
        .bind(reference.as_str())
        .fetch_all(conn)
        .await?;
    Ok(events)
}
