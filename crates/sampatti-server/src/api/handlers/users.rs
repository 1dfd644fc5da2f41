//! Owner profile handlers

use axum::{extract::State, Json};
use sampatti_core::{ProfileUpdate, User};
use serde::Deserialize;
use std::sync::Arc;

use super::{owner_id, AppState, MessageResponse};
use crate::api::error::ApiError;
use crate::gateway::RequestPrincipal;

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// GET /api/v1/users/profile
///
/// Full-tier nominees read the profile of the owner they act for.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    caller: RequestPrincipal,
) -> Result<Json<User>, ApiError> {
    let user = state.accounts.profile(caller.acting_user_id()).await?;
    Ok(Json(user))
}

/// PUT /api/v1/users/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    caller: RequestPrincipal,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .accounts
        .update_profile(owner_id(&caller)?, update)
        .await?;
    Ok(Json(user))
}

/// POST /api/v1/users/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    caller: RequestPrincipal,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .accounts
        .change_password(
            owner_id(&caller)?,
            &request.current_password,
            &request.new_password,
        )
        .await?;
    Ok(Json(MessageResponse::new("password changed")))
}
