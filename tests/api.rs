use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use purge_cache::application::ports::{ContentError, ContentSource, PurgeExecutor};
use purge_cache::application::purge::PurgeService;
use purge_cache::application::trigger::PurgeScheduler;
use purge_cache::domain::content::ContentItem;
use purge_cache::domain::error::PurgeError;
use purge_cache::domain::purge::{PurgeConfig, PurgeOutcome, PurgeRequest};
use purge_cache::infra::http::{ApiState, build_router};
use serde_json::Value;
use tower::ServiceExt;

const SECRET: &str = "endpoint-secret";
const ADMIN_TOKEN: &str = "admin-token";

struct FixedContent;

#[async_trait]
impl ContentSource for FixedContent {
    async fn find_item(&self, id: u64) -> Result<ContentItem, ContentError> {
        if id == 404 {
            return Err(ContentError::NotFound { id });
        }
        Ok(item(id))
    }

    async fn latest_published(&self) -> Result<ContentItem, ContentError> {
        Ok(item(7))
    }
}

fn item(id: u64) -> ContentItem {
    ContentItem {
        id,
        slug: format!("post-{id}"),
        permalink: format!("https://internal.site/post-{id}/"),
        author_nicename: "jane".to_string(),
        categories: vec!["news".to_string()],
        tags: Vec::new(),
    }
}

/// Counts calls and answers with a canned result.
struct CountingExecutor {
    calls: AtomicUsize,
    requests: Mutex<Vec<PurgeRequest>>,
    failure: Option<PurgeError>,
}

impl CountingExecutor {
    fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            failure: None,
        })
    }

    fn failing(err: PurgeError) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            failure: Some(err),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PurgeExecutor for CountingExecutor {
    async fn execute(
        &self,
        request: &PurgeRequest,
        _config: &PurgeConfig,
    ) -> Result<PurgeOutcome, PurgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(PurgeOutcome::succeeded(request)),
        }
    }
}

fn config() -> PurgeConfig {
    PurgeConfig {
        zone_id: "zone".to_string(),
        api_token: "token".to_string(),
        site_url: "https://internal.site".to_string(),
        frontend_url: "https://public.site".to_string(),
        endpoint_enabled: true,
        endpoint_secret: SECRET.to_string(),
        admin_button_enabled: true,
        ..Default::default()
    }
}

fn router_with(config: PurgeConfig, executor: Arc<CountingExecutor>) -> Router {
    let service = Arc::new(PurgeService::new(
        Arc::new(config),
        Arc::new(FixedContent),
        executor,
    ));
    let scheduler = Arc::new(PurgeScheduler::new(
        service.clone(),
        Duration::from_millis(10),
    ));
    build_router(ApiState::new(service, scheduler, ADMIN_TOKEN))
}

fn request(method: Method, uri: &str, authorization: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(body).expect("request should build")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    serde_json::from_slice(&bytes).expect("body should be json")
}

#[tokio::test]
async fn wrong_secret_is_rejected_without_purging() {
    let executor = CountingExecutor::succeeding();
    let app = router_with(config(), executor.clone());

    for authorization in [Some("nope"), Some("Bearer nope"), None] {
        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/cpc/v1/purge",
                authorization,
                Body::empty(),
            ))
            .await
            .expect("router should respond");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "unauthorized");
        assert_eq!(body["error"]["message"], "Unauthorized");
    }

    assert_eq!(executor.calls(), 0);
}

#[tokio::test]
async fn matching_secret_purges_everything() {
    let executor = CountingExecutor::succeeding();
    let app = router_with(config(), executor.clone());

    let bearer = format!("Bearer {SECRET}");
    for (method, authorization) in [
        (Method::POST, SECRET),
        (Method::PUT, bearer.as_str()),
        (Method::PATCH, SECRET),
    ] {
        let response = app
            .clone()
            .oneshot(request(
                method,
                "/cpc/v1/purge",
                Some(authorization),
                Body::empty(),
            ))
            .await
            .expect("router should respond");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["purged"], "everything");
        assert!(
            body["message"]
                .as_str()
                .expect("message")
                .starts_with("Cloudflare Cache purged everything successfully.")
        );
    }

    assert_eq!(executor.calls(), 3);
    assert!(
        executor
            .requests
            .lock()
            .expect("lock")
            .iter()
            .all(|request| *request == PurgeRequest::Everything)
    );
}

#[tokio::test]
async fn disabled_endpoint_is_not_routed() {
    let executor = CountingExecutor::succeeding();
    let app = router_with(
        PurgeConfig {
            endpoint_enabled: false,
            ..config()
        },
        executor.clone(),
    );

    let response = app
        .oneshot(request(
            Method::POST,
            "/cpc/v1/purge",
            Some(SECRET),
            Body::empty(),
        ))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(executor.calls(), 0);
}

#[tokio::test]
async fn missing_credentials_map_to_configuration_error() {
    let executor = CountingExecutor::failing(PurgeError::missing_credentials());
    let app = router_with(config(), executor);

    let response = app
        .oneshot(request(
            Method::POST,
            "/cpc/v1/purge",
            Some(SECRET),
            Body::empty(),
        ))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "configuration_error");
    assert_eq!(
        body["error"]["message"],
        "Fill Cloudflare credentials first."
    );
}

#[tokio::test]
async fn remote_failure_maps_to_bad_gateway() {
    let executor = CountingExecutor::failing(PurgeError::remote("Invalid zone", 1003));
    let app = router_with(config(), executor);

    let response = app
        .oneshot(request(
            Method::POST,
            "/cpc/v1/purge",
            Some(SECRET),
            Body::empty(),
        ))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "cloudflare_error");
    assert_eq!(body["error"]["message"], "Invalid zone");
    assert_eq!(body["error"]["status"], 1003);
}

#[tokio::test]
async fn admin_routes_require_token() {
    let executor = CountingExecutor::succeeding();
    let app = router_with(config(), executor.clone());

    for authorization in [None, Some(ADMIN_TOKEN), Some("Bearer wrong")] {
        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/admin/purge/everything",
                authorization,
                Body::empty(),
            ))
            .await
            .expect("router should respond");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    assert_eq!(executor.calls(), 0);
}

#[tokio::test]
async fn admin_purge_everything_button() {
    let executor = CountingExecutor::succeeding();
    let app = router_with(config(), executor.clone());
    let bearer = format!("Bearer {ADMIN_TOKEN}");

    let response = app
        .oneshot(request(
            Method::POST,
            "/admin/purge/everything",
            Some(&bearer),
            Body::empty(),
        ))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["purged"], "everything");
    assert_eq!(executor.calls(), 1);
}

#[tokio::test]
async fn disabled_button_is_not_routed() {
    let executor = CountingExecutor::succeeding();
    let app = router_with(
        PurgeConfig {
            admin_button_enabled: false,
            ..config()
        },
        executor.clone(),
    );
    let bearer = format!("Bearer {ADMIN_TOKEN}");

    let response = app
        .oneshot(request(
            Method::POST,
            "/admin/purge/everything",
            Some(&bearer),
            Body::empty(),
        ))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(executor.calls(), 0);
}

#[tokio::test]
async fn admin_purge_latest_targets_latest_post() {
    let executor = CountingExecutor::succeeding();
    let app = router_with(config(), executor.clone());
    let bearer = format!("Bearer {ADMIN_TOKEN}");

    let response = app
        .oneshot(request(
            Method::POST,
            "/admin/purge/latest",
            Some(&bearer),
            Body::empty(),
        ))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["purged"],
        "https://public.site/post-7"
    );
}

#[tokio::test]
async fn content_hook_schedules_debounced_purge() {
    let executor = CountingExecutor::succeeding();
    let app = router_with(config(), executor.clone());
    let bearer = format!("Bearer {ADMIN_TOKEN}");

    let mut scheduled = Vec::new();
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/hooks/content",
                Some(&bearer),
                Body::from(r#"{"id": 3}"#),
            ))
            .await
            .expect("router should respond");
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        scheduled.push(json_body(response).await["scheduled"].clone());
    }
    assert_eq!(scheduled, vec![Value::Bool(true), Value::Bool(false)]);

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(executor.calls(), 1);
    assert_eq!(
        executor.requests.lock().expect("lock").as_slice(),
        &[PurgeRequest::FileList(vec![
            "https://public.site/post-3".to_string()
        ])]
    );
}

#[tokio::test]
async fn content_hook_ignores_revisions() {
    let executor = CountingExecutor::succeeding();
    let app = router_with(config(), executor.clone());
    let bearer = format!("Bearer {ADMIN_TOKEN}");

    let response = app
        .oneshot(request(
            Method::POST,
            "/hooks/content",
            Some(&bearer),
            Body::from(r#"{"id": 3, "revision": true}"#),
        ))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(json_body(response).await["scheduled"], false);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(executor.calls(), 0);
}

#[tokio::test]
async fn malformed_content_event_is_bad_request() {
    let executor = CountingExecutor::succeeding();
    let app = router_with(config(), executor);
    let bearer = format!("Bearer {ADMIN_TOKEN}");

    let response = app
        .oneshot(request(
            Method::POST,
            "/hooks/content",
            Some(&bearer),
            Body::from(r#"{"slug": "x"}"#),
        ))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "bad_request");
}

#[tokio::test]
async fn health_is_no_content() {
    let app = router_with(config(), CountingExecutor::succeeding());

    let response = app
        .oneshot(request(Method::GET, "/health", None, Body::empty()))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().contains_key("x-request-id"));
}
