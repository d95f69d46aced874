//! Helpers for tests that need a real database or a stand-in payment processor.
pub mod fake_processor;
pub mod prepare_env;
