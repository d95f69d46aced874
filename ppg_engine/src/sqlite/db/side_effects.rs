use log::*;
use sqlx::SqliteConnection;

use super::{notifications, subscribers};
use crate::side_effects::SideEffect;

/// Applies side effects in order. Call this inside the transaction that moved the intent into its terminal state, so
/// that the effects and the transition commit or fail together.
pub async fn apply_side_effects(effects: Vec<SideEffect>, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    for effect in effects {
        match effect {
            SideEffect::GrantPlan { payer_id, plan_id, reference, starts_at, expires_at } => {
                let sub =
                    subscribers::upsert_plan_grant(&payer_id, &plan_id, &reference, starts_at, expires_at, conn).await?;
                debug!("🗃️ Plan '{}' granted to {} until {}", sub.plan_id, sub.payer_id, sub.plan_expires_at);
            },
            SideEffect::Notify(notification) => {
                let (recipient, kind, reference) =
                    (notification.recipient_id.clone(), notification.kind, notification.reference.clone());
                if notifications::insert_notification(notification, conn).await? {
                    debug!("🗃️ {kind} notification for {reference} queued for {recipient}");
                } else {
                    warn!("🗃️ A {kind} notification for {reference} already exists. Not sending it again.");
                }
            },
        }
    }
    Ok(())
}
