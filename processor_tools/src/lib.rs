//! # Processor tools
//!
//! A thin, typed client for the hosted-checkout payment processor's REST API. It knows how to
//! * create a checkout preference (the hosted checkout session the payer is redirected to),
//! * fetch the canonical state of a payment by its processor-assigned id, and
//! * search payments by the external reference that was attached to the preference.
//!
//! Loosely-typed processor payloads are parsed into the structs in [`data_objects`] here, at the boundary, so nothing
//! downstream ever touches raw JSON.
mod api;
mod config;
mod error;

pub mod data_objects;

pub use api::ProcessorApi;
pub use config::ProcessorConfig;
pub use data_objects::{BackUrls, NewPreference, Payment, PaymentSearchResult, Preference, PreferenceItem};
pub use error::ProcessorApiError;
