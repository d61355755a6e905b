//! Operator admin API.
//!
//! Routes (all require `Authorization: Bearer <admin.api_key>`):
//! - `GET  /admin/status` selector snapshot
//! - `POST /admin/mode`   switch endpoint mode
//! - `POST /admin/reset`  clear failure records

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;

pub use self::handlers::AdminState;

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/mode", post(set_mode))
        .route("/admin/reset", post(reset_failures))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
