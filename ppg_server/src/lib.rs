//! # PPG server
//! This crate hosts the HTTP front end of the plan payment gateway. It is responsible for:
//! * Opening hosted checkout sessions for authenticated payers.
//! * Receiving payment notifications from the processor and reconciling the intents they refer to.
//! * Handling the payer's browser when the processor redirects it back after checkout.
//! * Letting payers look up, and refresh, the state of their own payment intents.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /payments/checkout`: Start a checkout for a plan (authenticated).
//! * `POST /payments/webhook`: Processor notifications. Always answers 200 with a status token.
//! * `GET /payments/webhook`: Liveness check for the processor's webhook configuration screen.
//! * `GET /payments/return/{success|failure|pending}`: The processor's back URLs.
//! * `GET /payments/{reference}`: The state of one of the caller's intents (authenticated, owner only).
//! * `POST /payments/{reference}/refresh`: Ask the processor for news on a pending intent (authenticated, owner only).

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod plan_catalogue;
pub mod routes;
pub mod server;
pub mod webhooks;
