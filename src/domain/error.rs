use thiserror::Error;

pub const MISSING_CREDENTIALS: &str = "Fill Cloudflare credentials first.";

/// Failure of a single purge invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PurgeError {
    #[error("{message}")]
    Configuration { message: String },
    #[error("{message}")]
    Remote { message: String, status: i64 },
    #[error("{message}")]
    Authorization { message: String },
}

impl PurgeError {
    pub fn missing_credentials() -> Self {
        Self::Configuration {
            message: MISSING_CREDENTIALS.to_string(),
        }
    }

    pub fn remote(message: impl Into<String>, status: i64) -> Self {
        Self::Remote {
            message: message.into(),
            status,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Status code carried with the error: the remote error code for
    /// `Remote`, 401 otherwise.
    pub fn status(&self) -> i64 {
        match self {
            PurgeError::Remote { status, .. } => *status,
            PurgeError::Configuration { .. } | PurgeError::Authorization { .. } => 401,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PurgeError::Configuration { .. } => "configuration",
            PurgeError::Remote { .. } => "remote",
            PurgeError::Authorization { .. } => "authorization",
        }
    }
}
