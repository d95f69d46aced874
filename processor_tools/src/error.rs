use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessorApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("'{0}' is not a valid payment id")]
    InvalidPaymentId(String),
    #[error("The processor did not respond in time: {0}")]
    Timeout(String),
    #[error("Could not reach the processor: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

impl ProcessorApiError {
    /// True if the processor answered with a 404 for the requested resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::QueryError { status: 404, .. })
    }

    /// True if the failure is transient (network, timeout, or a 5xx answer) and a later attempt may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::RestRequestError(_) => true,
            Self::QueryError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
