use std::borrow::Cow;

use crate::application::error::ErrorReport;
use crate::application::ports::ContentError;
use crate::application::purge::PurgeServiceError;
use crate::domain::error::PurgeError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const CONFIGURATION: &str = "configuration_error";
    pub const CLOUDFLARE: &str = "cloudflare_error";
    pub const CONTENT_NOT_FOUND: &str = "content_not_found";
    pub const CONTENT: &str = "content_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Error code reported by Cloudflare.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: Cow<'static, str>,
    hint: Option<String>,
    remote_status: Option<i64>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: impl Into<Cow<'static, str>>,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            hint,
            remote_status: None,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<PurgeError> for ApiError {
    fn from(err: PurgeError) -> Self {
        match err {
            PurgeError::Configuration { message } => Self::new(
                StatusCode::UNAUTHORIZED,
                codes::CONFIGURATION,
                message,
                None,
            ),
            PurgeError::Authorization { message } => {
                Self::new(StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED, message, None)
            }
            PurgeError::Remote { message, status } => {
                let mut error = Self::new(StatusCode::BAD_GATEWAY, codes::CLOUDFLARE, message, None);
                error.remote_status = Some(status);
                error
            }
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::NotFound { .. } | ContentError::NoPublished => Self::new(
                StatusCode::NOT_FOUND,
                codes::CONTENT_NOT_FOUND,
                err.to_string(),
                None,
            ),
            ContentError::Source(detail) => Self::new(
                StatusCode::BAD_GATEWAY,
                codes::CONTENT,
                "Content source unavailable",
                Some(detail),
            ),
        }
    }
}

impl From<PurgeServiceError> for ApiError {
    fn from(err: PurgeServiceError) -> Self {
        match err {
            PurgeServiceError::Content(err) => err.into(),
            PurgeServiceError::Purge(err) => err.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = format!(
            "{}: {}",
            self.code,
            self.hint.as_deref().unwrap_or(&self.message)
        );
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.into_owned(),
                hint: self.hint,
                status: self.remote_status,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message("infra::http::api", self.status, detail).attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_errors_map_to_statuses() {
        let configuration = ApiError::from(PurgeError::missing_credentials());
        assert_eq!(configuration.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(configuration.code, codes::CONFIGURATION);

        let unauthorized = ApiError::from(PurgeError::unauthorized("Unauthorized"));
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unauthorized.code, codes::UNAUTHORIZED);

        let remote = ApiError::from(PurgeError::remote("Invalid zone", 1003));
        assert_eq!(remote.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(remote.remote_status, Some(1003));
    }

    #[test]
    fn missing_content_is_not_found() {
        let err = ApiError::from(PurgeServiceError::Content(ContentError::NotFound { id: 4 }));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code, codes::CONTENT_NOT_FOUND);
    }

    #[test]
    fn error_response_carries_report() {
        let response = ApiError::from(PurgeError::unauthorized("Unauthorized")).into_response();
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.status, StatusCode::UNAUTHORIZED);
        assert_eq!(report.messages, vec!["unauthorized: Unauthorized".to_string()]);
    }
}
