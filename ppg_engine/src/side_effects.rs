//! Business consequences of an intent reaching a terminal state.
//!
//! This module only decides *what* must happen. Storage backends apply the returned [`SideEffect`]s inside the same
//! transaction that moved the intent out of `Pending`. Every effect is idempotent when applied: entitlements are
//! upserted and notifications are unique per `(reference, kind)`.
use chrono::{DateTime, Duration, Utc};

use crate::db_types::{NewNotification, NotificationKind, PaymentIntent, Reference};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// Make `plan_id` the payer's active plan for the given window.
    GrantPlan {
        payer_id: String,
        plan_id: String,
        reference: Reference,
        starts_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
    Notify(NewNotification),
}

/// The validity window granted by an approved intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ValidityWindow {
    pub fn starting_at(start: DateTime<Utc>, period_days: i64) -> Self {
        Self { start, end: start + Duration::days(period_days.max(0)) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEffects {
    pub window: ValidityWindow,
    pub effects: Vec<SideEffect>,
}

pub fn completion_effects(intent: &PaymentIntent, now: DateTime<Utc>) -> CompletionEffects {
    let window = ValidityWindow::starting_at(now, intent.period_days);
    let grant = SideEffect::GrantPlan {
        payer_id: intent.payer_id.clone(),
        plan_id: intent.subject_id.clone(),
        reference: intent.reference.clone(),
        starts_at: window.start,
        expires_at: window.end,
    };
    let message = if intent.amount.is_zero() {
        format!("Your plan '{}' is active until {}.", intent.subject_id, window.end.format("%Y-%m-%d"))
    } else {
        format!(
            "We received your payment of {} {} (ref {}). Your plan '{}' is active until {}.",
            intent.amount,
            intent.currency,
            intent.reference,
            intent.subject_id,
            window.end.format("%Y-%m-%d")
        )
    };
    let notify = SideEffect::Notify(NewNotification {
        recipient_id: intent.payer_id.clone(),
        kind: NotificationKind::PaymentApproved,
        reference: intent.reference.clone(),
        title: "Payment approved".to_string(),
        message,
    });
    CompletionEffects { window, effects: vec![grant, notify] }
}

/// A rejected payment only notifies the payer. No entitlement is touched.
pub fn rejection_effects(intent: &PaymentIntent) -> Vec<SideEffect> {
    let message = format!(
        "Your payment for plan '{}' (ref {}) was not approved. No charge was applied to your plan.",
        intent.subject_id, intent.reference
    );
    vec![SideEffect::Notify(NewNotification {
        recipient_id: intent.payer_id.clone(),
        kind: NotificationKind::PaymentRejected,
        reference: intent.reference.clone(),
        title: "Payment rejected".to_string(),
        message,
    })]
}
