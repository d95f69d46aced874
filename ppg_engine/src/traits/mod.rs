//! # Backend and collaborator interfaces
//!
//! The engine is written against these traits, never against a concrete database or processor.
//!
//! * [`PaymentIntentDatabase`] defines the write side of the payment intent store: creating intents and reconciling
//!   processor observations against them, side effects included, in a single atomic unit.
//! * [`IntentManagement`] provides read-only queries over intents, their audit trail, subscribers and notifications.
//! * [`PlanDirectory`] is the catalogue of purchasable plans.
//! * [`PaymentProcessor`] is the external, authoritative payment processor.
mod data_objects;
mod intent_management;
mod payment_intent_database;
mod payment_processor;
mod plan_directory;

pub use data_objects::{ProcessorObservation, ReconcileResult};
pub use intent_management::IntentManagement;
pub use payment_intent_database::{IntentStoreError, PaymentIntentDatabase};
pub use payment_processor::{
    CheckoutSession,
    PaymentProcessor,
    PreferenceRequest,
    ProcessorError,
    ProcessorPayment,
    ReturnUrls,
};
pub use plan_directory::PlanDirectory;
