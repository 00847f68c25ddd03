use std::fmt;

/// Failure of a read against the entity store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("store returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed store response: {0}")]
    Decode(String),

    #[error("partition unavailable: {0}")]
    Unavailable(String),
}

/// Error raised by the write client.
///
/// Only the message and the optional numeric code are carried; both feed
/// error classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteError {
    pub message: String,
    pub code: Option<i64>,
}

impl WriteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for WriteError {}

impl From<StoreError> for WriteError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Http { status, body } => {
                WriteError::with_code(i64::from(status), format!("HTTP {}: {}", status, body))
            }
            StoreError::Rpc { code, message } => WriteError::with_code(code, message),
            other => WriteError::new(other.to_string()),
        }
    }
}
