pub mod admin;
pub mod auth;
pub mod error;
pub mod middleware;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};

use crate::auth::AppState;
use crate::middleware::require_admin;

/// Admin routes behind `require_admin`, plus a public health probe.
pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/api/admin/verify", get(admin::verify))
        .route("/api/admin/flags", get(admin::list_flags))
        .route("/api/admin/flags/{flag_id}/resolve", post(admin::resolve_flag))
        .route("/api/admin/posts/{post_id}", delete(admin::delete_post))
        .route("/api/admin/users/{wallet}/role", put(admin::set_role))
        .route("/api/admin/audit-log", get(admin::audit_log))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state);

    Router::new()
        .route("/health", get(health))
        .merge(admin_routes)
}

async fn health() -> &'static str {
    "ok"
}
