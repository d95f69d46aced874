use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{DateTime, Days, TimeZone, Utc};
use ppg_common::Amount;
use ppg_engine::{
    db_types::{IntentStatus, PaymentIntent, Reference, SubjectType},
    events::EventProducers,
    test_utils::fake_processor::FakeProcessor,
    IntentApi,
    ReconciliationApi,
    SqliteDatabase,
};

use super::{
    helpers::{error_message, expired_token, get_request, issue_token, json, post_request, TestDb, ALICE, BOB},
    mocks::MockIntentStore,
};
use crate::routes::{PaymentStatusRoute, RefreshPaymentRoute};

const COMPLETED: &str = "PLAN-pro-20241015-STAT01";
const EXPIRED: &str = "PLAN-pro-20240601-STAT02";

fn configure(cfg: &mut ServiceConfig) {
    let mut store = MockIntentStore::new();
    store.expect_fetch_intent().returning(|reference| {
        Ok(match reference.as_str() {
            COMPLETED => Some(intent(COMPLETED, Utc::now() - Days::new(2))),
            EXPIRED => Some(intent(EXPIRED, Utc.with_ymd_and_hms(2024, 6, 1, 15, 0, 0).unwrap())),
            _ => None,
        })
    });
    let api = IntentApi::new(store);
    cfg.service(PaymentStatusRoute::<MockIntentStore>::new()).app_data(web::Data::new(api));
}

// A completed 30-day plan for alice
fn intent(reference: &str, paid_at: DateTime<Utc>) -> PaymentIntent {
    PaymentIntent {
        id: 1,
        reference: Reference::from(reference),
        subject_type: SubjectType::Plan,
        subject_id: "pro".to_string(),
        payer_id: ALICE.to_string(),
        amount: Amount::from_major(15_000),
        currency: "CLP".to_string(),
        period_days: 30,
        local_status: IntentStatus::Completed,
        external_preference_id: Some("pref-001".to_string()),
        external_payment_id: Some("1319204532".to_string()),
        external_status: Some("approved".to_string()),
        window_start: Some(paid_at),
        window_end: Some(paid_at + Days::new(30)),
        created_at: paid_at,
        updated_at: paid_at,
    }
}

#[actix_web::test]
async fn fetch_status() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(ALICE);
    let path = format!("/payments/{COMPLETED}");
    let (status, body) = get_request(&token, &path, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK, "{body}");
    let view = json(&body);
    assert_eq!(view["reference"], COMPLETED);
    assert_eq!(view["subject_id"], "pro");
    assert_eq!(view["local_status"], "Completed");
    assert_eq!(view["external_status"], "approved");
    assert_eq!(view["window_active"], true);
    assert!(view["window_start"].is_string());
}

#[actix_web::test]
async fn fetch_status_of_lapsed_plan() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(ALICE);
    let (status, body) = get_request(&token, &format!("/payments/{EXPIRED}"), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let view = json(&body);
    assert_eq!(view["local_status"], "Completed");
    assert_eq!(view["window_active"], false);
    assert_eq!(view["window_end"], "2024-07-01T15:00:00Z");
}

#[actix_web::test]
async fn fetch_status_without_a_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", &format!("/payments/{COMPLETED}"), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(error_message(&body).contains("No access token"));
}

#[actix_web::test]
async fn fetch_status_with_bad_tokens() {
    let _ = env_logger::try_init().ok();
    let path = format!("/payments/{COMPLETED}");
    let (status, _) = get_request(&expired_token(ALICE), &path, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut token = issue_token(ALICE);
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let (status, body) = get_request(&token, &path, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(error_message(&body).contains("Access token is invalid"), "{body}");
}

#[actix_web::test]
async fn fetch_someone_elses_status() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(BOB);
    let path = format!("/payments/{COMPLETED}");
    let (status, body) = get_request(&token, &path, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(error_message(&body).contains("Insufficient Permissions"));
}

#[actix_web::test]
async fn fetch_unknown_status() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(ALICE);
    let (status, _) =
        get_request(&token, "/payments/PLAN-pro-20241015-NOSUCH", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//----------------------------------------------   Refresh  ----------------------------------------------------

const PENDING: &str = "PLAN-pro-20241015-RFSH01";

fn configure_refresh(db: SqliteDatabase, processor: FakeProcessor) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = ReconciliationApi::new(db, processor, EventProducers::default());
        cfg.service(RefreshPaymentRoute::<SqliteDatabase, FakeProcessor>::new()).app_data(web::Data::new(api));
    }
}

async fn refresh(test_db: &TestDb, processor: &FakeProcessor, token: &str) -> (StatusCode, String) {
    let path = format!("/payments/{PENDING}/refresh");
    post_request(token, &path, "", &[], configure_refresh(test_db.db.clone(), processor.clone()))
        .await
        .expect("Request failed")
}

#[actix_web::test]
async fn refresh_pending_intent() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    test_db.pending_intent(PENDING, "pro", ALICE).await;
    let processor = FakeProcessor::new();
    let token = issue_token(ALICE);

    // Nothing paid yet
    let (status, body) = refresh(&test_db, &processor, &token).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["local_status"], "Pending");
    assert_eq!(processor.search_calls(), 1);

    processor.set_payment("4410", &Reference::from(PENDING), "approved");
    let (status, body) = refresh(&test_db, &processor, &token).await;
    assert_eq!(status, StatusCode::OK);
    let view = json(&body);
    assert_eq!(view["local_status"], "Completed");
    assert_eq!(view["window_active"], true);
    assert_eq!(test_db.intent(PENDING).await.external_payment_id.as_deref(), Some("4410"));

    // Terminal intents are not refreshed
    let calls = processor.total_calls();
    let (status, _) = refresh(&test_db, &processor, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(processor.total_calls(), calls);
    test_db.tear_down().await;
}

#[actix_web::test]
async fn refresh_needs_the_owner() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    test_db.pending_intent(PENDING, "pro", ALICE).await;
    let processor = FakeProcessor::new();
    processor.set_payment("4410", &Reference::from(PENDING), "approved");

    let (status, _) = refresh(&test_db, &processor, "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = refresh(&test_db, &processor, &issue_token(BOB)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(processor.total_calls(), 0);
    assert_eq!(test_db.intent(PENDING).await.local_status, IntentStatus::Pending);
    test_db.tear_down().await;
}

#[actix_web::test]
async fn refresh_unknown_intent() {
    let _ = env_logger::try_init().ok();
    let test_db = TestDb::new().await;
    let processor = FakeProcessor::new();
    let (status, _) = refresh(&test_db, &processor, &issue_token(ALICE)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    test_db.tear_down().await;
}
