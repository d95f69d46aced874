//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the database or the payment processor,
//! so they are all `async` and never block.
//!
//! Route order matters: `GET /payments/webhook` must be registered before `GET /payments/{reference}`, which would
//! otherwise swallow it.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use ppg_engine::{
    db_types::{PaymentIntent, Reference},
    helpers::WebhookSignatureVerifier,
    intent_objects::{IntentStatusView, ReturnConfirmation},
    CheckoutApi,
    IntentApi,
    IntentManagement,
    PaymentIntentDatabase,
    PaymentProcessor,
    ReconciliationApi,
};

use crate::{
    auth::JwtClaims,
    config::ServerOptions,
    data_objects::{
        CheckoutRequest,
        ReturnPage,
        ReturnQuery,
        ReturnResponse,
        WebhookAck,
        WebhookNotification,
        WebhookQuery,
        WebhookStatus,
    },
    errors::ServerError,
    webhooks::process_notification,
};

const REQUEST_ID_HEADER: &str = "x-request-id";
const SIGNATURE_HEADER: &str = "x-signature";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

//----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/payments/checkout" impl PaymentIntentDatabase, PaymentProcessor);
pub async fn checkout<B, P>(
    claims: JwtClaims,
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentIntentDatabase,
    P: PaymentProcessor,
{
    debug!("💻️ {} wants to check out plan '{}'", claims.payer_id(), body.subject_id);
    let result = api.checkout(&body.subject_id, claims.payer_id()).await?;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
#[get("/payments/webhook")]
pub async fn webhook_liveness() -> impl Responder {
    trace!("💻️ Received webhook liveness check");
    HttpResponse::Ok().json(WebhookAck::new(WebhookStatus::Ok, "Payment notifications are accepted here"))
}

route!(payment_webhook => Post "/payments/webhook" impl PaymentIntentDatabase, PaymentProcessor);
/// Always answers 200. See [`crate::webhooks`] for the meaning of the status token in the body.
pub async fn payment_webhook<B, P>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<ReconciliationApi<B, P>>,
    verifier: web::Data<WebhookSignatureVerifier>,
) -> HttpResponse
where
    B: PaymentIntentDatabase,
    P: PaymentProcessor,
{
    trace!("💻️ Received processor notification: {}", req.query_string());
    let query = web::Query::<WebhookQuery>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .unwrap_or_else(|e| {
            debug!("💻️ Could not parse the notification query string. Ignoring it. {e}");
            WebhookQuery::default()
        });
    let request_id = header_value(&req, REQUEST_ID_HEADER);
    let signature = header_value(&req, SIGNATURE_HEADER);
    let notification = WebhookNotification::from_parts(&query, &body, request_id, signature);
    let ack = process_notification(notification, api.get_ref(), verifier.get_ref()).await;
    HttpResponse::Ok().json(ack)
}

//----------------------------------------------   Return pages  ------------------------------------------------
route!(payment_return => Get "/payments/return/{page}" impl PaymentIntentDatabase, PaymentProcessor);
pub async fn payment_return<B, P>(
    req: HttpRequest,
    path: web::Path<String>,
    api: web::Data<ReconciliationApi<B, P>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentIntentDatabase,
    P: PaymentProcessor,
{
    let page = path.parse::<ReturnPage>().map_err(ServerError::NoRecordFound)?;
    let query = web::Query::<ReturnQuery>::from_query(req.query_string())
        .map_err(|e| ServerError::InvalidRequestQuery(e.to_string()))?
        .into_inner();
    let reference = query.reference().ok_or_else(|| {
        ServerError::InvalidRequestQuery("The return URL does not carry a payment reference".to_string())
    })?;
    debug!("💻️ Payer returned to the {page} page for {reference}");
    let mut visit = ReturnConfirmation::new(reference).trusting_claims(options.trust_return_status);
    if let Some(payment_id) = query.payment_id() {
        visit = visit.with_payment_id(payment_id);
    }
    if let Some(status) = query.claimed_status() {
        visit = visit.with_claimed_status(status);
    }
    let outcome = api.confirm_return(visit).await?;
    Ok(HttpResponse::Ok().json(ReturnResponse::new(outcome, page)))
}

//----------------------------------------------   Intent status  -----------------------------------------------
route!(payment_status => Get "/payments/{reference}" impl IntentManagement);
pub async fn payment_status<B: IntentManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<IntentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let reference = Reference::from(path.into_inner());
    let intent = api.intent(&reference).await?.ok_or_else(|| no_such_intent(&reference))?;
    check_owner(&claims, &intent)?;
    Ok(HttpResponse::Ok().json(IntentStatusView::from(&intent)))
}

route!(refresh_payment => Post "/payments/{reference}/refresh" impl PaymentIntentDatabase, PaymentProcessor);
pub async fn refresh_payment<B, P>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<ReconciliationApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentIntentDatabase,
    P: PaymentProcessor,
{
    let reference = Reference::from(path.into_inner());
    let intent = api.db().fetch_intent(&reference).await?.ok_or_else(|| no_such_intent(&reference))?;
    check_owner(&claims, &intent)?;
    debug!("💻️ {} asked for a refresh of {reference}", claims.payer_id());
    let intent = api.refresh(&reference).await?;
    Ok(HttpResponse::Ok().json(IntentStatusView::from(&intent)))
}

fn header_value<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

fn no_such_intent(reference: &Reference) -> ServerError {
    ServerError::NoRecordFound(format!("No payment intent exists with reference {reference}"))
}

fn check_owner(claims: &JwtClaims, intent: &PaymentIntent) -> Result<(), ServerError> {
    if intent.payer_id == claims.payer_id() {
        Ok(())
    } else {
        warn!("💻️ {} tried to access {}, which belongs to someone else", claims.payer_id(), intent.reference);
        Err(ServerError::InsufficientPermissions(format!("{} is not your payment", intent.reference)))
    }
}
