//! Plan Payment Gateway Engine
//!
//! The engine turns the eventually-consistent, possibly duplicated and possibly out-of-order signals of an external
//! payment processor into a single local decision per payment, applied exactly once.
//!
//! The library is divided into these main sections:
//! 1. Storage ([`mod@traits`] and, with the `sqlite` feature, [`SqliteDatabase`]). Backends implement the traits in
//!    [`mod@traits`]. The data types used in the database are public and live in [`mod@db_types`].
//! 2. The pure decision logic. [`mod@reconciler`] holds the payment intent state machine and [`mod@side_effects`] decides
//!    what an intent reaching a terminal state entails. Neither touches storage.
//! 3. The public API ([`CheckoutApi`], [`ReconciliationApi`] and [`IntentApi`]). This is what servers call.
//!
//! The engine also publishes events when an intent completes or is rejected. See [`mod@events`] for how to hook into
//! them.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod reconciler;
pub mod side_effects;
pub mod traits;

mod ppg_api;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use ppg_api::{
    checkout_api::{CheckoutApi, CheckoutOptions},
    errors::{CheckoutError, ReconciliationError},
    intent_api::IntentApi,
    intent_objects,
    reconciliation_api::ReconciliationApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    IntentManagement,
    IntentStoreError,
    PaymentIntentDatabase,
    PaymentProcessor,
    PlanDirectory,
    ProcessorError,
};
