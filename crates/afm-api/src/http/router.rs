//! Axum router configuration with middleware.
//!
//! Fixed routes: `GET /` (agent info) and `GET /health`. The webhook and web
//! chat routes are mounted at the paths the agent document declares, only
//! when the matching interface exists.
//! Middleware: request tracing, 1 MiB body limit, optional CORS.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Maximum accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const RESERVED_PATHS: [&str; 2] = ["/", "/health"];

/// Check that interface paths can be mounted side by side.
pub fn validate_paths(webchat: Option<&str>, webhook: Option<&str>) -> Result<(), String> {
    for (kind, path) in [("webchat", webchat), ("webhook", webhook)] {
        let Some(path) = path else { continue };
        if !path.starts_with('/') {
            return Err(format!("{kind} path '{path}' must start with '/'"));
        }
        if RESERVED_PATHS.contains(&path) {
            return Err(format!("{kind} path '{path}' is reserved"));
        }
    }
    if let (Some(a), Some(b)) = (webchat, webhook)
        && a == b
    {
        return Err(format!(
            "webchat and webhook interfaces cannot share the path '{a}'"
        ));
    }
    Ok(())
}

/// Build the complete router with all routes and middleware.
///
/// `cors_origins` empty disables CORS; `"*"` allows any origin.
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::info::agent_info))
        .route("/health", get(handlers::info::health));

    if let Some(webhook) = &state.webhook {
        router = router.route(
            &webhook.path,
            get(handlers::webhook::verify_subscription).post(handlers::webhook::receive_event),
        );
    }
    if let Some(webchat) = &state.webchat {
        router = router.route(&webchat.path, post(handlers::webchat::chat));
    }

    let router = router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http());

    let router = match cors_layer(cors_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.with_state(state)
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };
    Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}
