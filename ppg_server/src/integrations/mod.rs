pub mod payment_events;
pub mod processor;
