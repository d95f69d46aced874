use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use log::*;
use ppg_common::{parse_boolean_flag, Secret, DEFAULT_CURRENCY_CODE};
use ppg_engine::CheckoutOptions;
use processor_tools::ProcessorConfig;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::errors::ServerError;

const DEFAULT_PPG_HOST: &str = "127.0.0.1";
const DEFAULT_PPG_PORT: u16 = 8460;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/ppg_store.db";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8460";
const RANDOM_JWT_SECRET_LENGTH: usize = 64;

//-------------------------------------------------  Environment  ------------------------------------------------------
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" | "test" | "staging" => Ok(Self::Development),
            other => Err(format!("'{other}' is not a known environment")),
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

//-------------------------------------------------  ServerConfig  -----------------------------------------------------
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub environment: Environment,
    pub auth: AuthConfig,
    /// Shared secret for processor webhook signatures. An empty secret switches verification off outside of
    /// production, and rejects every notification in production.
    pub webhook_secret: Secret<String>,
    /// The externally visible URL of this server. The processor's back URLs are built from it.
    pub public_base_url: String,
    /// Overrides the webhook URL handed to the processor with each checkout.
    pub notification_url: Option<String>,
    /// If true, a return visit that claims `approved` without a payment id completes the intent. **DANGER**
    pub trust_return_status: bool,
    /// The currency of catalogue plans that do not name one.
    pub currency: String,
    /// A JSON plan catalogue that is upserted into the database at start-up.
    pub plans_file: Option<PathBuf>,
    pub processor: ProcessorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PPG_HOST.to_string(),
            port: DEFAULT_PPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            environment: Environment::default(),
            auth: AuthConfig::default(),
            webhook_secret: Secret::default(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            notification_url: None,
            trust_return_status: false,
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            plans_file: None,
            processor: ProcessorConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PPG_HOST").ok().unwrap_or_else(|| DEFAULT_PPG_HOST.into());
        let port = env::var("PPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PPG_PORT. {e} Using the default, {DEFAULT_PPG_PORT}, instead."
                    );
                    DEFAULT_PPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PPG_PORT);
        let database_url = env::var("PPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ PPG_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let environment = env::var("PPG_ENVIRONMENT")
            .map_err(|_| info!("🪛️ PPG_ENVIRONMENT is not set. Assuming a development environment."))
            .and_then(|s| {
                s.parse::<Environment>().map_err(|e| {
                    warn!("🪛️ Invalid value for PPG_ENVIRONMENT. {e}. Assuming a development environment.")
                })
            })
            .unwrap_or_default();
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let webhook_secret = Secret::new(env::var("PPG_WEBHOOK_SECRET").unwrap_or_default());
        let public_base_url = env::var("PPG_PUBLIC_BASE_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                warn!(
                    "🪛️ PPG_PUBLIC_BASE_URL is not set. Using {DEFAULT_PUBLIC_BASE_URL}. The processor will not be able \
                     to reach this server or redirect payers back to it."
                );
                DEFAULT_PUBLIC_BASE_URL.to_string()
            });
        let notification_url = env::var("PPG_NOTIFICATION_URL").ok().filter(|s| !s.trim().is_empty());
        let trust_return_status = parse_boolean_flag(env::var("PPG_TRUST_RETURN_STATUS").ok(), false);
        if trust_return_status {
            warn!(
                "🚨️ PPG_TRUST_RETURN_STATUS is on. Return visits claiming 'approved' without a payment id will complete \
                 payment intents without confirmation from the processor."
            );
        }
        let currency = env::var("PPG_CURRENCY")
            .map(|s| s.trim().to_ascii_uppercase())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
        let plans_file = env::var("PPG_PLANS_FILE").ok().filter(|s| !s.trim().is_empty()).map(PathBuf::from);
        let processor = ProcessorConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            environment,
            auth,
            webhook_secret,
            public_base_url,
            notification_url,
            trust_return_status,
            currency,
            plans_file,
            processor,
        }
    }

    pub fn checkout_options(&self) -> CheckoutOptions {
        let options = CheckoutOptions::new(self.public_base_url.as_str());
        match &self.notification_url {
            Some(url) => options.with_notification_url(Some(url.clone())),
            None => options,
        }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret that payer access tokens are signed with. It is shared with the marketplace that issues them.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this, since no token issued elsewhere will be accepted. 🚨️🚨️🚨️"
        );
        let secret: String =
            thread_rng().sample_iter(&Alphanumeric).take(RANDOM_JWT_SECRET_LENGTH).map(char::from).collect();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("PPG_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [PPG_JWT_SECRET]")))?;
        if secret.trim().is_empty() {
            return Err(ServerError::ConfigurationError("PPG_JWT_SECRET is empty".to_string()));
        }
        if secret.len() < 32 {
            warn!("🪛️ PPG_JWT_SECRET is shorter than 32 bytes. Consider using a longer secret.");
        }
        Ok(Self { jwt_secret: Secret::new(secret) })
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub trust_return_status: bool,
    pub production: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { trust_return_status: config.trust_return_status, production: config.environment.is_production() }
    }
}
