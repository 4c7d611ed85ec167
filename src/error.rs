use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaytpvError>;

#[derive(Error, Debug)]
pub enum PaytpvError {
    /// A local precondition failed. Nothing was sent to the gateway.
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// A field named in a signing list is absent from the request.
    #[error("Missing field for signature: {0}")]
    MissingField(String),
    /// The transport could not complete the round trip.
    #[error("Transport error: {0}")]
    TransportError(Box<dyn std::error::Error + Send + Sync>),
    /// The gateway answered with a non-zero `DS_ERROR_ID`.
    #[error("Error: {code}")]
    GatewayError { code: i64 },
    #[error("Invalid reply: {0}")]
    InvalidReply(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl PaytpvError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// Wraps any collaborator failure as a [`PaytpvError::TransportError`].
    pub fn transport<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::TransportError(error.into())
    }

    /// The gateway error code, if this is a [`PaytpvError::GatewayError`].
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::GatewayError { code } => Some(*code),
            _ => None,
        }
    }
}
