use cucumber::{given, then, when};
use ppg_engine::{
    db_types::{Amount, IntentStatus, NotificationKind, Plan, SignalSource},
    intent_objects::ReturnConfirmation,
    traits::ProcessorError,
    PlanDirectory,
};

use crate::cucumber::{world::PaymentSystem, PaymentWorld};

#[given("a fresh payment gateway")]
async fn fresh_gateway(world: &mut PaymentWorld) {
    world.system = Some(PaymentSystem::new().await);
}

#[given(expr = "the plan '{word}' costs {int} for {int} days")]
async fn plan_costs(world: &mut PaymentWorld, plan_id: String, price: i64, days: i64) {
    let plan = Plan::new(plan_id.clone(), plan_id, Amount::from_major(price), days);
    world.system().db.upsert_plan(plan).await.expect("Error saving plan");
}

#[given("return visits may claim a payment status")]
async fn trust_claims(world: &mut PaymentWorld) {
    world.trust_claimed_status = true;
}

#[given("the processor is down")]
async fn processor_down(world: &mut PaymentWorld) {
    world.system().processor.fail_with(ProcessorError::Unavailable("503 Service Unavailable".into()));
}

#[given("the processor is back up")]
async fn processor_up(world: &mut PaymentWorld) {
    world.system().processor.recover();
}

#[when(expr = "'{word}' checks out plan '{word}' as [{word}]")]
async fn checkout(world: &mut PaymentWorld, payer: String, plan_id: String, alias: String) {
    let result = world.system().checkout.checkout(&plan_id, &payer).await.expect("Checkout failed");
    world.last_outcome = Some(if result.activated { "activated".into() } else { "redirected".into() });
    world.references.insert(alias, result.reference);
}

#[when(expr = "'{word}' tries to check out plan '{word}'")]
async fn failed_checkout(world: &mut PaymentWorld, payer: String, plan_id: String) {
    let outcome = match world.system().checkout.checkout(&plan_id, &payer).await {
        Ok(_) => "ok".to_string(),
        Err(e) => format!("{e:?}").split('(').next().unwrap_or_default().to_string(),
    };
    world.last_outcome = Some(outcome);
}

#[when(expr = "the processor records payment {word} for [{word}] as '{word}'")]
async fn processor_records_payment(world: &mut PaymentWorld, payment_id: String, alias: String, status: String) {
    let reference = world.reference(&alias);
    world.system().processor.set_payment(&payment_id, &reference, &status);
}

#[when(expr = "the webhook for payment {word} arrives {int} time(s)")]
async fn webhook_arrives(world: &mut PaymentWorld, payment_id: String, times: usize) {
    for _ in 0..times {
        let result = world.system().reconciliation.reconcile_payment(&payment_id, SignalSource::Webhook).await;
        world.last_outcome = Some(match result {
            Ok(r) => r.transition.label().to_string(),
            Err(e) => e.to_string(),
        });
    }
}

#[when(expr = "the payer returns for [{word}] with payment {word}")]
async fn payer_returns_with_payment(world: &mut PaymentWorld, alias: String, payment_id: String) {
    let visit = ReturnConfirmation::new(world.reference(&alias)).with_payment_id(payment_id);
    return_visit(world, visit).await;
}

#[when(expr = "the payer returns for [{word}] claiming '{word}'")]
async fn payer_returns_claiming(world: &mut PaymentWorld, alias: String, status: String) {
    let visit = ReturnConfirmation::new(world.reference(&alias)).with_claimed_status(status);
    return_visit(world, visit).await;
}

async fn return_visit(world: &mut PaymentWorld, visit: ReturnConfirmation) {
    let visit = visit.trusting_claims(world.trust_claimed_status);
    let outcome = world.system().reconciliation.confirm_return(visit).await.expect("Return visit failed");
    world.last_outcome = Some(outcome.outcome_label().to_string());
}

#[when(expr = "the payer refreshes [{word}]")]
async fn payer_refreshes(world: &mut PaymentWorld, alias: String) {
    let reference = world.reference(&alias);
    world.system().reconciliation.refresh(&reference).await.expect("Refresh failed");
}

#[then(expr = "intent [{word}] is {word}")]
async fn intent_status(world: &mut PaymentWorld, alias: String, status: String) {
    let expected = status.parse::<IntentStatus>().expect("Not a valid intent status");
    let intent = world.intent(&alias).await;
    assert_eq!(intent.local_status, expected);
}

#[then(expr = "intent [{word}] has a validity window of {int} days")]
async fn intent_window(world: &mut PaymentWorld, alias: String, days: i64) {
    let intent = world.intent(&alias).await;
    let (start, end) = (intent.window_start.expect("No window start"), intent.window_end.expect("No window end"));
    assert_eq!((end - start).num_days(), days);
}

#[then(expr = "intent [{word}] records the processor status '{word}'")]
async fn intent_external_status(world: &mut PaymentWorld, alias: String, status: String) {
    let intent = world.intent(&alias).await;
    assert_eq!(intent.external_status.as_deref(), Some(status.as_str()));
}

#[then(expr = "the outcome is '{word}'")]
async fn outcome_is(world: &mut PaymentWorld, expected: String) {
    assert_eq!(world.last_outcome.as_deref(), Some(expected.as_str()));
}

#[then(expr = "'{word}' has {int} '{word}' notification(s)")]
async fn notification_count(world: &mut PaymentWorld, payer: String, count: usize, kind: String) {
    let kind = match kind.as_str() {
        "PaymentApproved" => NotificationKind::PaymentApproved,
        "PaymentRejected" => NotificationKind::PaymentRejected,
        _ => panic!("Unknown notification kind {kind}"),
    };
    let notifications = world.system().intents.notifications(&payer).await.expect("Error fetching notifications");
    assert_eq!(notifications.iter().filter(|n| n.kind == kind).count(), count);
}

#[then(expr = "'{word}' is subscribed to plan '{word}'")]
async fn subscribed(world: &mut PaymentWorld, payer: String, plan_id: String) {
    let subscriber = world.system().intents.subscriber(&payer).await.expect("Error fetching subscriber");
    assert_eq!(subscriber.map(|s| s.plan_id), Some(plan_id));
}

#[then(expr = "'{word}' has no plan")]
async fn no_plan(world: &mut PaymentWorld, payer: String) {
    let subscriber = world.system().intents.subscriber(&payer).await.expect("Error fetching subscriber");
    assert!(subscriber.is_none(), "{payer} has a plan: {subscriber:?}");
}

#[then(expr = "the processor was called {int} time(s)")]
async fn processor_calls(world: &mut PaymentWorld, calls: usize) {
    assert_eq!(world.system().processor.total_calls(), calls);
}

#[then(expr = "'{word}' has no payment intents")]
async fn no_intents(world: &mut PaymentWorld, payer: String) {
    let intents = world.system().intents.intents_for_payer(&payer).await.expect("Error fetching intents");
    assert!(intents.is_empty());
}
