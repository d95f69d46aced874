use sqlx::SqliteConnection;

use crate::db_types::{NewNotification, Notification};

/// Stores the notification unless one of the same kind already exists for the reference. Returns `true` if a row was
/// written.
pub async fn insert_notification(notification: NewNotification, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO notifications (recipient_id, kind, reference, title, message)
        VALUES ($1, $2, $3, $4, $5);
        "#,
    )
    .bind(notification.recipient_id)
    .bind(notification.kind)
    .bind(notification.reference)
    .bind(notification.title)
    .bind(notification.message)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_notifications(
    recipient_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    let notifications = sqlx::query_as("SELECT * FROM notifications WHERE recipient_id = $1 ORDER BY id")
        .bind(recipient_id)
        .fetch_all(conn)
        .await?;
    Ok(notifications)
}
