use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use ppg_common::Secret;
use ppg_engine::{
    db_types::{IntentStatus, Reference},
    events::EventProducers,
    helpers::WebhookSignatureVerifier,
    test_utils::fake_processor::FakeProcessor,
    traits::ProcessorError,
    IntentManagement,
    ReconciliationApi,
    SqliteDatabase,
};
use serde_json::Value;

use super::helpers::{get_request, json, post_request, TestDb, ALICE};
use crate::routes::{webhook_liveness, PaymentWebhookRoute};

const WEBHOOK_SECRET: &str = "whsec-endpoint-tests";
const REFERENCE: &str = "PLAN-pro-20241015-WBHK01";
const PAYMENT_ID: &str = "1319204532";
const REQUEST_ID: &str = "bb56a2f1-6aae-46ac-982e-9dcd3581d08e";

fn verifier() -> WebhookSignatureVerifier {
    WebhookSignatureVerifier::new(Secret::new(WEBHOOK_SECRET.to_string()), true)
}

fn configure(db: SqliteDatabase, processor: FakeProcessor) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = ReconciliationApi::new(db, processor, EventProducers::default());
        cfg.service(webhook_liveness)
            .service(PaymentWebhookRoute::<SqliteDatabase, FakeProcessor>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(verifier()));
    }
}

fn signature(payment_id: &str) -> String {
    verifier().sign(payment_id, Some(REQUEST_ID), Utc::now().timestamp()).expect("No webhook secret")
}

/// Delivers a payment notification for `payment_id`, signed with `signature`.
async fn notify(
    test_db: &TestDb,
    processor: &FakeProcessor,
    payment_id: &str,
    signature: &str,
) -> (StatusCode, Value) {
    let path = format!("/payments/webhook?type=payment&data.id={payment_id}");
    let body = format!(r#"{{"action": "payment.updated", "type": "payment", "data": {{"id": "{payment_id}"}}}}"#);
    let headers = [("x-request-id", REQUEST_ID), ("x-signature", signature)];
    let (status, body) = post_request("", &path, &body, &headers, configure(test_db.db.clone(), processor.clone()))
        .await
        .expect("Request failed");
    (status, json(&body))
}

#[actix_web::test]
async fn liveness_check() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    let (status, body) = get_request("", "/payments/webhook", configure(test_db.db.clone(), FakeProcessor::new()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "ok");
    test_db.tear_down().await;
}

#[actix_web::test]
async fn approved_payment_completes_the_intent() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    test_db.pending_intent(REFERENCE, "pro", ALICE).await;
    let processor = FakeProcessor::new();
    processor.set_payment(PAYMENT_ID, &Reference::from(REFERENCE), "approved");

    let (status, ack) = notify(&test_db, &processor, PAYMENT_ID, &signature(PAYMENT_ID)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "processed", "{ack}");
    let intent = test_db.intent(REFERENCE).await;
    assert_eq!(intent.local_status, IntentStatus::Completed);
    assert_eq!(intent.external_payment_id.as_deref(), Some(PAYMENT_ID));
    assert_eq!(intent.external_status.as_deref(), Some("approved"));
    let (start, end) = (intent.window_start.unwrap(), intent.window_end.unwrap());
    assert_eq!((end - start).num_days(), 30);
    let subscriber = test_db.db.fetch_subscriber(ALICE).await.unwrap().expect("Plan was not granted");
    assert_eq!(subscriber.plan_id, "pro");
    assert_eq!(subscriber.plan_expires_at, end);

    // The processor delivers the same notification again. Nothing changes.
    let (status, ack) = notify(&test_db, &processor, PAYMENT_ID, &signature(PAYMENT_ID)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "processed");
    let again = test_db.intent(REFERENCE).await;
    assert_eq!(again.local_status, IntentStatus::Completed);
    assert_eq!(again.window_start, intent.window_start);
    assert_eq!(again.window_end, intent.window_end);
    let events = test_db.db.fetch_intent_events(&Reference::from(REFERENCE)).await.unwrap();
    assert_eq!(events.iter().filter(|e| e.outcome == "completed").count(), 1);
    assert_eq!(test_db.db.fetch_notifications(ALICE).await.unwrap().len(), 1);
    test_db.tear_down().await;
}

#[actix_web::test]
async fn rejected_payment_rejects_the_intent() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    test_db.pending_intent(REFERENCE, "pro", ALICE).await;
    let processor = FakeProcessor::new();
    processor.set_payment(PAYMENT_ID, &Reference::from(REFERENCE), "rejected");

    let (_, ack) = notify(&test_db, &processor, PAYMENT_ID, &signature(PAYMENT_ID)).await;
    assert_eq!(ack["status"], "processed");
    let intent = test_db.intent(REFERENCE).await;
    assert_eq!(intent.local_status, IntentStatus::Rejected);
    assert!(intent.window_start.is_none());
    assert!(test_db.db.fetch_subscriber(ALICE).await.unwrap().is_none());
    test_db.tear_down().await;
}

#[actix_web::test]
async fn forged_signature() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    test_db.pending_intent(REFERENCE, "pro", ALICE).await;
    let processor = FakeProcessor::new();
    processor.set_payment(PAYMENT_ID, &Reference::from(REFERENCE), "approved");

    let forged = format!("ts={},v1={}", Utc::now().timestamp(), "ab".repeat(32));
    let (status, ack) = notify(&test_db, &processor, PAYMENT_ID, &forged).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "signature_invalid");
    // A signature for another payment does not carry over
    let (_, ack) = notify(&test_db, &processor, PAYMENT_ID, &signature("999")).await;
    assert_eq!(ack["status"], "signature_invalid");
    assert_eq!(processor.total_calls(), 0);
    assert_eq!(test_db.intent(REFERENCE).await.local_status, IntentStatus::Pending);
    test_db.tear_down().await;
}

#[actix_web::test]
async fn unsigned_notification() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    let processor = FakeProcessor::new();
    let path = format!("/payments/webhook?type=payment&data.id={PAYMENT_ID}");
    let (status, body) = post_request("", &path, "", &[], configure(test_db.db.clone(), processor.clone()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "signature_invalid");
    assert_eq!(processor.total_calls(), 0);
    test_db.tear_down().await;
}

#[actix_web::test]
async fn other_topics_are_ignored() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    let processor = FakeProcessor::new();
    let body = r#"{"topic": "merchant_order", "resource": "https://api.example.com/merchant_orders/1"}"#;
    let (status, body) = post_request(
        "",
        "/payments/webhook?topic=merchant_order&id=1",
        body,
        &[],
        configure(test_db.db.clone(), processor.clone()),
    )
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "ignored");
    assert_eq!(processor.total_calls(), 0);
    test_db.tear_down().await;
}

#[actix_web::test]
async fn notification_without_an_id() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    let processor = FakeProcessor::new();
    let (status, body) = post_request(
        "",
        "/payments/webhook?type=payment&data.id=null",
        r#"{"type": "payment", "data": {}}"#,
        &[],
        configure(test_db.db.clone(), processor.clone()),
    )
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "no_id");
    assert_eq!(processor.total_calls(), 0);
    test_db.tear_down().await;
}

#[actix_web::test]
async fn id_in_the_body_only() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    test_db.pending_intent(REFERENCE, "pro", ALICE).await;
    let processor = FakeProcessor::new();
    processor.set_payment(PAYMENT_ID, &Reference::from(REFERENCE), "approved");
    let sig = signature(PAYMENT_ID);
    let headers = [("x-request-id", REQUEST_ID), ("x-signature", sig.as_str())];
    let body = format!(r#"{{"type": "payment", "data": {{"id": {PAYMENT_ID}}}}}"#);
    let (status, body) =
        post_request("", "/payments/webhook", &body, &headers, configure(test_db.db.clone(), processor.clone()))
            .await
            .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "processed");
    assert_eq!(test_db.intent(REFERENCE).await.local_status, IntentStatus::Completed);
    test_db.tear_down().await;
}

#[actix_web::test]
async fn payment_for_an_unknown_reference() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    let processor = FakeProcessor::new();
    processor.set_payment(PAYMENT_ID, &Reference::from("SOMEONE-ELSES-ORDER"), "approved");

    let (status, ack) = notify(&test_db, &processor, PAYMENT_ID, &signature(PAYMENT_ID)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "unknown_reference");
    test_db.tear_down().await;
}

#[actix_web::test]
async fn processor_outage() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    test_db.pending_intent(REFERENCE, "pro", ALICE).await;
    let processor = FakeProcessor::new();
    processor.set_payment(PAYMENT_ID, &Reference::from(REFERENCE), "approved");
    processor.fail_with(ProcessorError::Timeout("Timed out after 10s".to_string()));

    let (status, ack) = notify(&test_db, &processor, PAYMENT_ID, &signature(PAYMENT_ID)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "error");
    assert_eq!(test_db.intent(REFERENCE).await.local_status, IntentStatus::Pending);

    // The processor retries once it is back
    processor.recover();
    let (_, ack) = notify(&test_db, &processor, PAYMENT_ID, &signature(PAYMENT_ID)).await;
    assert_eq!(ack["status"], "processed");
    assert_eq!(test_db.intent(REFERENCE).await.local_status, IntentStatus::Completed);
    test_db.tear_down().await;
}

#[actix_web::test]
async fn garbage_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    let (status, body) =
        post_request("", "/payments/webhook", "}{ not json", &[], configure(test_db.db.clone(), FakeProcessor::new()))
            .await
            .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "ignored");
    test_db.tear_down().await;
}
