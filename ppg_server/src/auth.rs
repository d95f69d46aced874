//! Payer authentication.
//!
//! Payers sign in on the marketplace, which issues them an HS256 JWT signed with the secret it shares with this server.
//! The token is presented as `Authorization: Bearer <token>`. Its subject is the payer id.
//!
//! [`crate::middleware::JwtMiddlewareFactory`] validates the token once per request and leaves the result in the
//! request extensions. Handlers that need an authenticated payer simply take a [`JwtClaims`] argument.
use std::{
    future::{ready, Ready},
    time::Duration,
};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The payer id
    pub sub: String,
    /// Expiry, as a unix timestamp
    pub exp: i64,
}

impl JwtClaims {
    pub fn payer_id(&self) -> &str {
        &self.sub
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let extensions = req.extensions();
        let result = match (extensions.get::<JwtClaims>(), extensions.get::<AuthError>()) {
            (Some(claims), _) => Ok(claims.clone()),
            (None, Some(e)) => Err(ServerError::AuthenticationError(e.clone())),
            (None, None) => Err(ServerError::AuthenticationError(AuthError::MissingToken)),
        };
        ready(result)
    }
}

/// Extracts the token from an `Authorization` header value.
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected 'Bearer <token>'".to_string()))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::PoorlyFormattedToken(format!("Unsupported authorization scheme '{scheme}'")));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::PoorlyFormattedToken("The bearer token is empty".to_string()));
    }
    Ok(token)
}

#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self { key, validation }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| {
            debug!("🔐️ Access token rejected. {e}");
            AuthError::ValidationError(e.to_string())
        })?;
        Ok(data.claims)
    }

    /// Validates the token carried in an `Authorization` header value.
    pub fn validate_header(&self, header: &str) -> Result<JwtClaims, AuthError> {
        bearer_token(header).and_then(|token| self.validate(token))
    }
}

/// Issues access tokens. In production the marketplace does this; the server only needs it for tooling and tests.
pub struct TokenIssuer {
    key: EncodingKey,
    header: Header,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { key, header: Header::new(Algorithm::HS256) }
    }

    pub fn issue_token(&self, payer_id: &str, duration: Option<Duration>) -> Result<String, AuthError> {
        let duration = duration.unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let exp = Utc::now().timestamp() + i64::try_from(duration.as_secs()).unwrap_or(i64::MAX / 2);
        let claims = JwtClaims { sub: payer_id.to_string(), exp };
        encode(&self.header, &claims, &self.key).map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))
    }
}
