use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use log::debug;
use ppg_common::Amount;
use ppg_engine::{
    db_types::{NewPaymentIntent, PaymentIntent, Plan, Reference},
    test_utils::prepare_env::{drop_database, prepare_test_env, random_db_path},
    IntentManagement,
    PaymentIntentDatabase,
    PlanDirectory,
    SqliteDatabase,
};
use serde_json::Value;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::AuthConfig,
    middleware::JwtMiddlewareFactory,
};

// DO NOT re-use this secret anywhere.
const TEST_JWT_SECRET: &str = "ppg-endpoint-tests-0c3a5e8d41b27f96a0d4c1e87b35f2aa";

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_JWT_SECRET)
}

pub fn issue_token(payer_id: &str) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(payer_id, None).expect("Failed to sign token")
}

pub fn expired_token(payer_id: &str) -> String {
    let claims = JwtClaims { sub: payer_id.to_string(), exp: Utc::now().timestamp() - 3600 };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()))
        .expect("Failed to sign token")
}

pub async fn get_request<F>(token: &str, path: &str, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let req = with_token(TestRequest::get().uri(path), token);
    send(req, configure).await
}

pub async fn post_request<F>(
    token: &str,
    path: &str,
    body: &str,
    headers: &[(&str, &str)],
    configure: F,
) -> Result<(StatusCode, String), String>
where
    F: FnOnce(&mut ServiceConfig),
{
    let mut req = TestRequest::post()
        .uri(path)
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_string());
    for &(name, value) in headers {
        req = req.insert_header((name, value));
    }
    send(with_token(req, token), configure).await
}

fn with_token(req: TestRequest, token: &str) -> TestRequest {
    if token.is_empty() {
        req
    } else {
        req.insert_header(("Authorization", format!("Bearer {token}")))
    }
}

async fn send<F>(req: TestRequest, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().wrap(JwtMiddlewareFactory::new(&get_auth_config())).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = res.into_body().try_into_bytes().map_err(|_| "Could not read the response body".to_string())?;
    Ok((status, String::from_utf8_lossy(&body).into_owned()))
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON: {e}. {body}"))
}

pub fn error_message(body: &str) -> String {
    json(body)["error"].as_str().expect("Response has no error message").to_string()
}

/// The plans every test database starts with.
pub fn test_plans() -> Vec<Plan> {
    vec![
        Plan::new("free", "Starter", Amount::from(0), 30),
        Plan::new("pro", "Professional", Amount::from_major(15_000), 30),
        Plan::new("legacy", "Legacy", Amount::from_major(9_000), 30).inactive(),
    ]
}

/// A throwaway SQLite database, seeded with [`test_plans`].
pub struct TestDb {
    pub url: String,
    pub db: SqliteDatabase,
}

impl TestDb {
    pub async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        for plan in test_plans() {
            db.upsert_plan(plan).await.expect("Error seeding plans");
        }
        Self { url, db }
    }

    /// Opens a pending intent for `plan_id` directly in the database, as a successful checkout would.
    pub async fn pending_intent(&self, reference: &str, plan_id: &str, payer_id: &str) -> PaymentIntent {
        let plan = self.db.fetch_plan(plan_id).await.expect("Error fetching plan").expect("Plan does not exist");
        let intent = NewPaymentIntent::for_plan(Reference::from(reference), &plan, payer_id)
            .with_preference_id(format!("pref-{reference}"));
        self.db.insert_intent(intent).await.expect("Error inserting intent")
    }

    pub async fn intent(&self, reference: &str) -> PaymentIntent {
        self.db
            .fetch_intent(&Reference::from(reference))
            .await
            .expect("Error fetching intent")
            .expect("Intent does not exist")
    }

    pub async fn tear_down(self) {
        self.db.pool().close().await;
        drop_database(&self.url).await;
    }
}
