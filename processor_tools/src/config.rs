use std::time::Duration;

use log::*;
use ppg_common::{parse_boolean_flag, Secret};

const DEFAULT_API_URL: &str = "https://api.mercadopago.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Base URL of the processor's REST API, without a trailing slash.
    pub api_url: String,
    pub access_token: Secret<String>,
    /// Upper bound for every call made to the processor, connection set-up included.
    pub timeout: Duration,
    /// If true, payers are sent to the sandbox checkout URL rather than the live one.
    pub use_sandbox: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            access_token: Secret::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            use_sandbox: false,
        }
    }
}

impl ProcessorConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("PPG_PROCESSOR_API_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| {
                info!("🪛️ PPG_PROCESSOR_API_URL not set, using {DEFAULT_API_URL}");
                DEFAULT_API_URL.to_string()
            });
        let access_token = Secret::new(std::env::var("PPG_PROCESSOR_ACCESS_TOKEN").unwrap_or_else(|_| {
            error!("🪛️ PPG_PROCESSOR_ACCESS_TOKEN not set. Every call to the payment processor will be refused.");
            String::default()
        }));
        let timeout = std::env::var("PPG_PROCESSOR_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid value for PPG_PROCESSOR_TIMEOUT_SECS ({s}). {e}"))
                    .ok()
            })
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let use_sandbox = parse_boolean_flag(std::env::var("PPG_PROCESSOR_SANDBOX").ok(), false);
        Self { api_url, access_token, timeout, use_sandbox }
    }
}
