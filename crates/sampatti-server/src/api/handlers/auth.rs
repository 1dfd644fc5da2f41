//! Authentication Handlers
//!
//! Owner registration, login and refresh, and the nominee emergency-access
//! exchange. None of these routes sit behind the gateway.

use axum::{extract::State, http::StatusCode, Json};
use sampatti_core::{AccessTier, Principal, User};
use sampatti_credentials::NOMINEE_TTL_HOURS;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::api::error::ApiError;
use crate::core::{OwnerData, Registration, Session, ACTION_EMERGENCY_DATA_ACCESS};
use crate::gateway::ClientOrigin;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// Emergency access request from a nominee
#[derive(Debug, Deserialize)]
pub struct EmergencyAccessRequest {
    /// Nominee email
    pub email: String,
    /// Owner the nominee acts for
    pub user_id: Uuid,
    pub access_code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NomineeSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub access_level: AccessTier,
}

#[derive(Debug, Serialize)]
pub struct EmergencyAccessResponse {
    /// Nominee credential, valid for 24 hours
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub nominee: NomineeSummary,
    pub data: OwnerData,
}

/// Register an owner account
///
/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<Registration>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.accounts.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = state
        .accounts
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(session))
}

/// Exchange a refresh token for a new access token
///
/// POST /api/v1/auth/refresh-token
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let access_token = state.accounts.refresh(&request.refresh_token).await?;
    Ok(Json(RefreshResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.codec.access_ttl().num_seconds(),
    }))
}

/// Exchange an emergency access code for a nominee credential
///
/// POST /api/v1/auth/emergency-access
///
/// 1. Verify the code (activating a pending nominee)
/// 2. Issue a nominee credential carrying the nominee's tier
/// 3. Read the owner's data through the access policy
/// 4. Record the access with the caller's IP and user agent
pub async fn emergency_access(
    State(state): State<Arc<AppState>>,
    ClientOrigin(origin): ClientOrigin,
    Json(request): Json<EmergencyAccessRequest>,
) -> Result<Json<EmergencyAccessResponse>, ApiError> {
    let nominee = state
        .registry
        .verify_access_code(
            &request.email,
            request.user_id,
            &request.access_code,
            &origin,
        )
        .await?;

    let access_token =
        state
            .codec
            .issue_nominee_token(nominee.id, nominee.user_id, nominee.access_level)?;

    let principal = Principal::nominee(nominee.id, nominee.user_id, nominee.access_level);
    let data = state.data.owner_data(&principal).await?;

    state
        .registry
        .audit()
        .record(nominee.id, ACTION_EMERGENCY_DATA_ACCESS, &origin)
        .await;

    info!(
        nominee_id = %nominee.id,
        user_id = %nominee.user_id,
        access_tier = %nominee.access_level,
        ip = %origin.ip_address,
        "Emergency access granted"
    );

    Ok(Json(EmergencyAccessResponse {
        access_token,
        token_type: "Bearer",
        expires_in: NOMINEE_TTL_HOURS * 3600,
        nominee: NomineeSummary {
            id: nominee.id,
            name: nominee.name,
            email: nominee.email,
            access_level: nominee.access_level,
        },
        data,
    }))
}
