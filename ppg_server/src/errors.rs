use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use ppg_engine::{CheckoutError, IntentStoreError, ReconciliationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request query: {0}")]
    InvalidRequestQuery(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The request cannot be fulfilled. {0}")]
    Unavailable(String),
    #[error("The payment processor could not be reached. {0}")]
    ProcessorUnavailable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestQuery(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::CouldNotIssueToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Unavailable(_) => StatusCode::CONFLICT,
            Self::ProcessorUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Could not issue an access token. {0}")]
    CouldNotIssueToken(String),
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::PlanNotFound(_) => Self::NoRecordFound(e.to_string()),
            CheckoutError::PlanUnavailable(_) => Self::Unavailable(e.to_string()),
            CheckoutError::ProcessorUnavailable(_) => Self::ProcessorUnavailable(e.to_string()),
            CheckoutError::DatabaseError(_) => {
                error!("💻️ Checkout failed on the backend. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<ReconciliationError> for ServerError {
    fn from(e: ReconciliationError) -> Self {
        match e {
            ReconciliationError::UnknownReference(_) => Self::NoRecordFound(e.to_string()),
            ReconciliationError::ProcessorUnavailable(_) => Self::ProcessorUnavailable(e.to_string()),
            ReconciliationError::ReferenceMismatch { .. } | ReconciliationError::MissingReference(_) => {
                Self::InvalidRequestQuery(e.to_string())
            },
            ReconciliationError::DatabaseError(_) => {
                error!("💻️ Reconciliation failed on the backend. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<IntentStoreError> for ServerError {
    fn from(e: IntentStoreError) -> Self {
        match e {
            IntentStoreError::IntentNotFound(_) => Self::NoRecordFound(e.to_string()),
            _ => Self::BackendError(format!("Database error: {e}")),
        }
    }
}
