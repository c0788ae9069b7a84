use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use tracing::debug;

use super::error::ApiError;
use super::state::ApiState;
use crate::domain::error::PurgeError;

const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Guards the purge endpoint with the shared secret.
///
/// The `Authorization` header may carry the secret as-is or as
/// `Bearer <secret>`. An empty configured secret rejects every request.
pub async fn endpoint_auth(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let authorized = match presented {
        Some(raw) => {
            let secret = state.config().endpoint_secret.as_str();
            secret_matches(raw, secret)
                || raw
                    .strip_prefix("Bearer ")
                    .is_some_and(|bearer| secret_matches(bearer, secret))
        }
        None => false,
    };

    if !authorized {
        debug!(
            target: "purge_cache::http::auth",
            header_present = presented.is_some(),
            "purge endpoint secret mismatch"
        );
        return reject();
    }

    next.run(request).await
}

/// Guards the manual triggers and the content hook with the admin token.
pub async fn admin_auth(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authorized = extract_token(request.headers().get(header::AUTHORIZATION))
        .is_some_and(|token| secret_matches(token, &state.admin_token));

    if !authorized {
        return reject();
    }

    next.run(request).await
}

fn reject() -> Response {
    ApiError::from(PurgeError::unauthorized(UNAUTHORIZED_MESSAGE)).into_response()
}

fn extract_token(header: Option<&HeaderValue>) -> Option<&str> {
    let raw = header?.to_str().ok()?;
    raw.strip_prefix("Bearer ")
}

fn secret_matches(presented: &str, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    bool::from(presented.as_bytes().ct_eq(secret.as_bytes()))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::application::error::ErrorReport;

    #[test]
    fn empty_secret_never_matches() {
        assert!(!secret_matches("", ""));
        assert!(!secret_matches("anything", ""));
    }

    #[test]
    fn secret_comparison_is_exact() {
        assert!(secret_matches("s3cret", "s3cret"));
        assert!(!secret_matches("s3cret ", "s3cret"));
        assert!(!secret_matches("S3CRET", "s3cret"));
    }

    #[test]
    fn rejection_is_reported_as_authorization_error() {
        let response = reject();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.messages, vec!["unauthorized: Unauthorized".to_string()]);
    }

    #[test]
    fn bearer_prefix_is_required_for_tokens() {
        let header = HeaderValue::from_static("Bearer abc");
        assert_eq!(extract_token(Some(&header)), Some("abc"));

        let raw = HeaderValue::from_static("abc");
        assert_eq!(extract_token(Some(&raw)), None);
        assert_eq!(extract_token(None), None);
    }
}
