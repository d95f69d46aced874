use actix_web::{http::StatusCode, web, web::ServiceConfig};
use ppg_common::Amount;
use ppg_engine::{
    db_types::{IntentStatus, Reference},
    events::EventProducers,
    traits::{CheckoutSession, ProcessorError},
    CheckoutApi,
    CheckoutOptions,
    IntentManagement,
    SqliteDatabase,
};

use super::{
    helpers::{error_message, expired_token, issue_token, json, post_request, TestDb, ALICE},
    mocks::MockProcessor,
};
use crate::routes::CheckoutRoute;

const PUBLIC_URL: &str = "https://plans.example.com";

fn configure(db: SqliteDatabase, processor: MockProcessor) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let options = CheckoutOptions::new(PUBLIC_URL)
            .with_notification_url(Some(format!("{PUBLIC_URL}/payments/webhook")));
        let api = CheckoutApi::new(db, processor, options, EventProducers::default());
        cfg.service(CheckoutRoute::<SqliteDatabase, MockProcessor>::new()).app_data(web::Data::new(api));
    }
}

async fn checkout(token: &str, body: &str, test_db: &TestDb, processor: MockProcessor) -> (StatusCode, String) {
    post_request(token, "/payments/checkout", body, &[], configure(test_db.db.clone(), processor))
        .await
        .expect("Request failed")
}

fn idle_processor() -> MockProcessor {
    let mut processor = MockProcessor::new();
    processor.expect_create_preference().never();
    processor.expect_fetch_payment().never();
    processor.expect_search_payments().never();
    processor
}

#[actix_web::test]
async fn checkout_without_a_token() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    let (status, body) = checkout("", r#"{"subject_id": "pro"}"#, &test_db, idle_processor()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(error_message(&body).contains("No access token"), "{body}");
    test_db.tear_down().await;
}

#[actix_web::test]
async fn checkout_with_an_expired_token() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    let token = expired_token(ALICE);
    let (status, body) = checkout(&token, r#"{"subject_id": "pro"}"#, &test_db, idle_processor()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(error_message(&body).contains("ExpiredSignature"), "{body}");
    test_db.tear_down().await;
}

#[actix_web::test]
async fn checkout_paid_plan() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    let mut processor = MockProcessor::new();
    processor
        .expect_create_preference()
        .withf(|req| {
            req.subject_id == "pro" &&
                req.payer_id == ALICE &&
                req.amount == Amount::from_major(15_000) &&
                req.return_urls.success == format!("{PUBLIC_URL}/payments/return/success") &&
                req.return_urls.failure == format!("{PUBLIC_URL}/payments/return/failure") &&
                req.notification_url.as_deref() == Some("https://plans.example.com/payments/webhook")
        })
        .times(1)
        .returning(|req| {
            Ok(CheckoutSession {
                preference_id: "pref-001".to_string(),
                checkout_url: format!("https://checkout.example.com/pay?ref={}", req.reference),
            })
        });
    let token = issue_token(ALICE);
    let (status, body) = checkout(&token, r#"{"subject_id": "pro"}"#, &test_db, processor).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let result = json(&body);
    let reference = result["reference"].as_str().expect("No reference").to_string();
    assert!(reference.starts_with("PLAN-pro-"), "{reference}");
    assert_eq!(result["checkoutUrl"], format!("https://checkout.example.com/pay?ref={reference}"));
    assert!(result.get("checkout_url").is_none());
    assert!(result.get("activated").is_none());

    let intent = test_db.intent(&reference).await;
    assert_eq!(intent.local_status, IntentStatus::Pending);
    assert_eq!(intent.payer_id, ALICE);
    assert_eq!(intent.amount, Amount::from_major(15_000));
    assert_eq!(intent.external_preference_id.as_deref(), Some("pref-001"));
    assert!(intent.window_start.is_none());
    test_db.tear_down().await;
}

#[actix_web::test]
async fn checkout_accepts_plan_id() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    let mut processor = MockProcessor::new();
    processor.expect_create_preference().times(1).returning(|_| {
        Ok(CheckoutSession {
            preference_id: "pref-002".to_string(),
            checkout_url: "https://checkout.example.com/pay".to_string(),
        })
    });
    let token = issue_token(ALICE);
    let (status, _) = checkout(&token, r#"{"plan_id": "pro"}"#, &test_db, processor).await;
    assert_eq!(status, StatusCode::OK);
    test_db.tear_down().await;
}

#[actix_web::test]
async fn checkout_free_plan() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    let token = issue_token(ALICE);
    let (status, body) = checkout(&token, r#"{"subject_id": "free"}"#, &test_db, idle_processor()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let result = json(&body);
    assert_eq!(result["activated"], true);
    assert!(result.get("checkoutUrl").is_none());

    let reference = result["reference"].as_str().expect("No reference");
    let intent = test_db.intent(reference).await;
    assert_eq!(intent.local_status, IntentStatus::Completed);
    assert!(intent.window_start.is_some());
    let subscriber = test_db.db.fetch_subscriber(ALICE).await.unwrap().expect("Free plan was not granted");
    assert_eq!(subscriber.plan_id, "free");
    assert_eq!(subscriber.last_reference, Reference::from(reference));
    test_db.tear_down().await;
}

#[actix_web::test]
async fn checkout_unknown_plan() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    let token = issue_token(ALICE);
    let (status, body) = checkout(&token, r#"{"subject_id": "platinum"}"#, &test_db, idle_processor()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(error_message(&body).contains("platinum"), "{body}");
    test_db.tear_down().await;
}

#[actix_web::test]
async fn checkout_inactive_plan() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    let token = issue_token(ALICE);
    let (status, _) = checkout(&token, r#"{"subject_id": "legacy"}"#, &test_db, idle_processor()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(test_db.db.fetch_intents_for_payer(ALICE).await.unwrap().is_empty());
    test_db.tear_down().await;
}

#[actix_web::test]
async fn checkout_when_processor_is_down() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    let mut processor = MockProcessor::new();
    processor
        .expect_create_preference()
        .times(1)
        .returning(|_| Err(ProcessorError::Unavailable("503 Service Unavailable".to_string())));
    let token = issue_token(ALICE);
    let (status, body) = checkout(&token, r#"{"subject_id": "pro"}"#, &test_db, processor).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY, "{body}");
    assert!(test_db.db.fetch_intents_for_payer(ALICE).await.unwrap().is_empty());
    test_db.tear_down().await;
}

#[actix_web::test]
async fn checkout_with_a_bad_body() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    let token = issue_token(ALICE);
    let (status, _) = checkout(&token, r#"{"plan": 42}"#, &test_db, idle_processor()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    test_db.tear_down().await;
}
