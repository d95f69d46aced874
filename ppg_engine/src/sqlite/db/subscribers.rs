use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::db_types::{Reference, Subscriber};

/// Sets the payer's active plan and validity window, creating the subscriber record if necessary. Applying the same
/// grant twice leaves the record as it was after the first time.
pub async fn upsert_plan_grant(
    payer_id: &str,
    plan_id: &str,
    reference: &Reference,
    starts_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Subscriber, sqlx::Error> {
    let subscriber = sqlx::query_as(
        r#"
        INSERT INTO subscribers (payer_id, plan_id, plan_started_at, plan_expires_at, last_reference, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (payer_id) DO UPDATE SET
            plan_id = excluded.plan_id,
            plan_started_at = excluded.plan_started_at,
            plan_expires_at = excluded.plan_expires_at,
            last_reference = excluded.last_reference,
            updated_at = excluded.updated_at
        RETURNING *;
        "#,
    )
    .bind(payer_id)
    .bind(plan_id)
    .bind(starts_at)
    .bind(expires_at)
    .bind(reference.as_str())
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(subscriber)
}

pub async fn fetch_subscriber(payer_id: &str, conn: &mut SqliteConnection) -> Result<Option<Subscriber>, sqlx::Error> {
    let subscriber =
        sqlx::query_as("SELECT * FROM subscribers WHERE payer_id = $1").bind(payer_id).fetch_optional(conn).await?;
    Ok(subscriber)
}
