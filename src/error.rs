use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentryError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    DecodeFailure(String),

    #[error("sandbox error: {0}")]
    Sandbox(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SentryError {
    /// Whether the fault lies with the request rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::DecodeFailure(_))
    }
}

pub type SentryResult<T> = Result<T, SentryError>;
