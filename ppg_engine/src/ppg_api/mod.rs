//! # Plan payment gateway public API
//!
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`checkout_api`] opens payment intents, either against the processor's hosted checkout or, for free plans,
//!   directly in the completed state.
//! * [`reconciliation_api`] applies processor signals (webhooks, return-URL redirects and explicit refreshes) to
//!   payment intents.
//! * [`intent_api`] provides read-only access to intents, their audit trail, subscribers and notifications, plus plan
//!   maintenance.
//!
//! # API usage
//!
//! An API instance is created by supplying a backend that implements the traits required by the API, and, where the
//! API talks to the processor, a [`crate::traits::PaymentProcessor`].
//!
//! ```rust,ignore
//! use ppg_engine::{events::EventProducers, ReconciliationApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = ReconciliationApi::new(db, processor, EventProducers::default());
//! let outcome = api.reconcile_payment("1319204532", SignalSource::Webhook).await?;
//! ```
pub mod checkout_api;
pub mod errors;
pub mod intent_api;
pub mod intent_objects;
pub mod reconciliation_api;
