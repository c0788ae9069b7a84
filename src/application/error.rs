use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::{
    application::{ports::ContentError, purge::PurgeServiceError},
    domain::error::PurgeError,
    infra::error::InfraError,
};

/// Diagnostic attached to error responses for the response-logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Purge(#[from] PurgeError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

impl From<PurgeServiceError> for AppError {
    fn from(err: PurgeServiceError) -> Self {
        match err {
            PurgeServiceError::Content(err) => AppError::Content(err),
            PurgeServiceError::Purge(err) => AppError::Purge(err),
        }
    }
}
