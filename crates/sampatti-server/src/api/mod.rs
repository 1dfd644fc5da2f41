//! API module for the Sampatti server

pub mod error;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::gateway::{authenticate, require_full_tier, require_owner};
use handlers::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Create the API router
///
/// Protected routes pass through `authenticate` first, then the owner-only
/// or full-tier guard attached to them.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/health", get(health))
        .route("/api/v1/auth/register", post(handlers::register))
        .route("/api/v1/auth/login", post(handlers::login))
        .route("/api/v1/auth/refresh-token", post(handlers::refresh_token))
        .route("/api/v1/auth/emergency-access", post(handlers::emergency_access));

    let owner_only = Router::new()
        .route("/api/v1/users/change-password", post(handlers::change_password))
        .route(
            "/api/v1/nominees",
            get(handlers::list_nominees).post(handlers::create_nominee),
        )
        .route("/api/v1/nominees/access-log", get(handlers::list_access_logs))
        .route(
            "/api/v1/nominees/{id}",
            get(handlers::get_nominee)
                .put(handlers::update_nominee)
                .delete(handlers::delete_nominee),
        )
        .route("/api/v1/nominees/{id}/send-invitation", post(handlers::send_invitation))
        .route("/api/v1/nominees/{id}/invite", post(handlers::invite_nominee))
        .route("/api/v1/nominees/{id}/activate", post(handlers::activate_nominee))
        .route("/api/v1/nominees/{id}/revoke", post(handlers::revoke_nominee))
        .route(
            "/api/v1/documents/{id}/nominee-access",
            patch(handlers::set_document_access),
        )
        .route_layer(middleware::from_fn(require_owner));

    // Same path, different guard per method
    let profile = get(handlers::get_profile)
        .route_layer(middleware::from_fn(require_full_tier))
        .merge(put(handlers::update_profile).route_layer(middleware::from_fn(require_owner)));

    let protected = Router::new()
        .route("/api/v1/users/profile", profile)
        .route("/api/v1/data", get(handlers::get_data))
        .route("/api/v1/nominee/access-log", post(handlers::log_nominee_action))
        .merge(owner_only)
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
