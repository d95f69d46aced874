//! Access token middleware for Actix Web.
//!
//! Validates the bearer token in the `Authorization` header, if there is one, and stores the outcome in the request
//! extensions: [`JwtClaims`] on success, the [`AuthError`] otherwise. Requests are never refused here. Handlers that
//! require a payer take a [`JwtClaims`] argument, whose extractor turns a missing or failed token into a 401, while
//! public routes (processor webhooks, return pages) are unaffected by whatever headers they arrive with.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{debug, trace};

use crate::{
    auth::{JwtClaims, TokenValidator},
    config::AuthConfig,
    errors::AuthError,
};

pub struct JwtMiddlewareFactory {
    validator: TokenValidator,
}

impl JwtMiddlewareFactory {
    pub fn new(config: &AuthConfig) -> Self {
        Self { validator: TokenValidator::new(config) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = JwtMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtMiddlewareService { validator: self.validator.clone(), service: Rc::new(service) }))
    }
}

pub struct JwtMiddlewareService<S> {
    validator: TokenValidator,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let outcome = req.headers().get(AUTHORIZATION).map(|value| {
            value
                .to_str()
                .map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))
                .and_then(|header| self.validator.validate_header(header))
        });
        Box::pin(async move {
            match outcome {
                None => trace!("🔐️ No access token in request to {}", req.path()),
                Some(Ok(claims)) => {
                    trace!("🔐️ Access token for {} ✅️", claims.sub);
                    req.extensions_mut().insert::<JwtClaims>(claims);
                },
                Some(Err(e)) => {
                    debug!("🔐️ Invalid access token in request to {}. {e}", req.path());
                    req.extensions_mut().insert::<AuthError>(e);
                },
            }
            service.call(req).await
        })
    }
}
