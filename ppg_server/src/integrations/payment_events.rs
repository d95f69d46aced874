//! Event hooks the server registers with the engine.
//!
//! Entitlements and notifications are written by the engine in the same transaction as the status change, so nothing
//! here is needed for correctness. The hooks give operators a single log line per finished payment, which is what
//! they grep for when a payer asks where their plan is.
use futures::future::BoxFuture;
use log::*;
use ppg_engine::events::{EventHandlers, EventHooks};

const PAYMENT_EVENT_BUFFER_SIZE: usize = 25;

pub fn create_payment_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_payment_completed(|ev| {
        let intent = ev.intent;
        info!(
            "📬️ Payment {} completed via {}. {} now has plan '{}' until {}.",
            intent.reference,
            ev.source,
            intent.payer_id,
            intent.subject_id,
            intent.window_end.map(|d| d.to_rfc3339()).unwrap_or_else(|| "further notice".into())
        );
        no_op()
    });
    hooks.on_payment_rejected(|ev| {
        let intent = ev.intent;
        info!(
            "📬️ Payment {} for plan '{}' by {} was rejected via {}. Processor status: {}",
            intent.reference,
            intent.subject_id,
            intent.payer_id,
            ev.source,
            intent.external_status.as_deref().unwrap_or("unknown")
        );
        no_op()
    });
    EventHandlers::new(PAYMENT_EVENT_BUFFER_SIZE, hooks)
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
