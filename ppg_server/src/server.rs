use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use ppg_engine::{
    events::EventProducers,
    helpers::WebhookSignatureVerifier,
    CheckoutApi,
    IntentApi,
    ReconciliationApi,
    SqliteDatabase,
};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::{payment_events::create_payment_event_handlers, processor::ProcessorClient},
    middleware::JwtMiddlewareFactory,
    plan_catalogue::load_plan_catalogue,
    routes::{
        health,
        webhook_liveness,
        CheckoutRoute,
        PaymentReturnRoute,
        PaymentStatusRoute,
        PaymentWebhookRoute,
        RefreshPaymentRoute,
    },
};

const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not run migrations. {e}")))?;
    info!("🚀️ Database at {} is ready", config.database_url);
    if let Some(path) = &config.plans_file {
        load_plan_catalogue(path, &config.currency, &IntentApi::new(db.clone())).await?;
    }
    let processor = ProcessorClient::new(config.processor.clone())
        .map_err(|e| ServerError::InitializeError(format!("Could not create the payment processor client. {e}")))?;
    let handlers = create_payment_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, processor, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    processor: ProcessorClient,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let verifier = WebhookSignatureVerifier::new(config.webhook_secret.clone(), options.production);
    let checkout_options = config.checkout_options();
    info!(
        "🚀️ Running in {} mode. Processor back URLs point at {}",
        config.environment, checkout_options.public_base_url
    );
    let auth_config = config.auth.clone();
    let srv = HttpServer::new(move || {
        let checkout_api =
            CheckoutApi::new(db.clone(), processor.clone(), checkout_options.clone(), producers.clone());
        let reconciliation_api = ReconciliationApi::new(db.clone(), processor.clone(), producers.clone());
        let intent_api = IntentApi::new(db.clone());
        App::new()
            .wrap(JwtMiddlewareFactory::new(&auth_config))
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ppg::access_log"))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(intent_api))
            .app_data(web::Data::new(verifier.clone()))
            .app_data(web::Data::new(options))
            .service(health)
            .service(webhook_liveness)
            .service(PaymentWebhookRoute::<SqliteDatabase, ProcessorClient>::new())
            .service(CheckoutRoute::<SqliteDatabase, ProcessorClient>::new())
            .service(PaymentReturnRoute::<SqliteDatabase, ProcessorClient>::new())
            .service(RefreshPaymentRoute::<SqliteDatabase, ProcessorClient>::new())
            .service(PaymentStatusRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
