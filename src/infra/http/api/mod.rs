pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{post, put},
};

pub const ENDPOINT_PATH: &str = "/cpc/v1/purge";

/// Routes for the purge endpoint, manual triggers and the content hook.
///
/// The endpoint is only registered when enabled, as is the purge-everything
/// button; disabled routes fall through to 404.
pub fn build_api_router(state: ApiState) -> Router<ApiState> {
    let config = state.config();
    let mut router = Router::new();

    if config.endpoint_enabled {
        let endpoint = Router::new()
            .route(
                ENDPOINT_PATH,
                put(handlers::purge_endpoint)
                    .post(handlers::purge_endpoint)
                    .patch(handlers::purge_endpoint),
            )
            .route_layer(axum_middleware::from_fn_with_state(
                state.clone(),
                middleware::endpoint_auth,
            ));
        router = router.merge(endpoint);
    }

    let mut admin = Router::new()
        .route("/admin/purge/latest", post(handlers::admin_purge_latest))
        .route("/hooks/content", post(handlers::content_event));
    if config.admin_button_enabled {
        admin = admin.route(
            "/admin/purge/everything",
            post(handlers::admin_purge_everything),
        );
    }
    let admin = admin.route_layer(axum_middleware::from_fn_with_state(
        state.clone(),
        middleware::admin_auth,
    ));

    router.merge(admin)
}
