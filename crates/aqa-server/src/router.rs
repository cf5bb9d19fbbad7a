//! Router assembly for the Control API.
//!
//! [`build_router`] wires all handler functions to their routes with
//! CORS, tracing, and request-id correlation layers.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Builds the complete axum router with all API routes.
///
/// Routes use axum 0.8 `/{param}` path syntax. CORS is permissive (agents
/// may call from various origins). `TraceLayer` provides request-level
/// logging via tracing; the request-id layer stamps and echoes
/// `X-Request-ID` on every response.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/generate", post(handlers::generate::generate))
        .route("/validate", post(handlers::validate::validate))
        .route("/execute", post(handlers::execute::execute))
        .route("/history", get(handlers::history::list_history))
        .route("/history/stats", get(handlers::history::history_stats))
        .route(
            "/history/{id}",
            get(handlers::history::get_history).delete(handlers::history::delete_history),
        )
        .route("/plans", get(handlers::plans::list_plans))
        .route("/plans/{name}", get(handlers::plans::get_plan))
        .route("/plans/{name}/versions", get(handlers::plans::list_versions))
        .route("/plans/{name}/diff", get(handlers::plans::diff_plan))
        .route(
            "/plans/{name}/versions/{version}/restore",
            post(handlers::plans::restore_version),
        )
        .route("/workspace/init", post(handlers::workspace::init_workspace))
        .route("/workspace/status", get(handlers::workspace::workspace_status))
        .route("/ws/execute", get(handlers::ws::ws_execute))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}
