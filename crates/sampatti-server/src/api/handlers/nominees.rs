//! Nominee Management Handlers
//!
//! Owner-only. The router rejects nominee credentials before these run.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use sampatti_core::{NewNominee, Nominee, NomineeUpdate};

use super::{owner_id, AppState, MessageResponse};
use crate::api::error::ApiError;
use crate::core::NamedAccessLogEntry;
use crate::gateway::RequestPrincipal;

/// Freshly issued access code
///
/// The only place the cleartext code ever leaves the server.
#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub nominee_id: Uuid,
    pub access_code: String,
}

#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub access_code: String,
    pub nominee_name: String,
    pub nominee_email: String,
    pub nominee: Nominee,
}

#[derive(Debug, Deserialize)]
pub struct DocumentAccessRequest {
    /// Complete set of nominees the document is granted to
    #[serde(default)]
    pub nominee_ids: Vec<Uuid>,
    /// Optional change to the document's nominee flag
    #[serde(default)]
    pub accessible_to_nominees: Option<bool>,
}

/// GET /api/v1/nominees
pub async fn list_nominees(
    State(state): State<Arc<AppState>>,
    caller: RequestPrincipal,
) -> Result<Json<Vec<Nominee>>, ApiError> {
    Ok(Json(state.registry.list(owner_id(&caller)?).await?))
}

/// POST /api/v1/nominees
pub async fn create_nominee(
    State(state): State<Arc<AppState>>,
    caller: RequestPrincipal,
    Json(request): Json<NewNominee>,
) -> Result<(StatusCode, Json<Nominee>), ApiError> {
    let nominee = state.registry.create(owner_id(&caller)?, request).await?;
    Ok((StatusCode::CREATED, Json(nominee)))
}

/// GET /api/v1/nominees/{id}
pub async fn get_nominee(
    State(state): State<Arc<AppState>>,
    caller: RequestPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<Nominee>, ApiError> {
    Ok(Json(state.registry.get(id, owner_id(&caller)?).await?))
}

/// PUT /api/v1/nominees/{id}
pub async fn update_nominee(
    State(state): State<Arc<AppState>>,
    caller: RequestPrincipal,
    Path(id): Path<Uuid>,
    Json(update): Json<NomineeUpdate>,
) -> Result<Json<Nominee>, ApiError> {
    Ok(Json(
        state
            .registry
            .update(id, owner_id(&caller)?, update)
            .await?,
    ))
}

/// DELETE /api/v1/nominees/{id}
pub async fn delete_nominee(
    State(state): State<Arc<AppState>>,
    caller: RequestPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.registry.delete(id, owner_id(&caller)?).await?;
    Ok(Json(MessageResponse::new("nominee deleted")))
}

/// Generate a fresh access code, replacing any previous one
///
/// POST /api/v1/nominees/{id}/invite
pub async fn invite_nominee(
    State(state): State<Arc<AppState>>,
    caller: RequestPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<InviteResponse>, ApiError> {
    let access_code = state
        .registry
        .generate_invite(id, owner_id(&caller)?)
        .await?;
    Ok(Json(InviteResponse {
        nominee_id: id,
        access_code,
    }))
}

/// Generate an access code and activate the nominee
///
/// POST /api/v1/nominees/{id}/send-invitation
pub async fn send_invitation(
    State(state): State<Arc<AppState>>,
    caller: RequestPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<InvitationResponse>, ApiError> {
    let invitation = state
        .registry
        .send_invitation(id, owner_id(&caller)?)
        .await?;
    Ok(Json(InvitationResponse {
        access_code: invitation.access_code,
        nominee_name: invitation.nominee.name.clone(),
        nominee_email: invitation.nominee.email.clone(),
        nominee: invitation.nominee,
    }))
}

/// POST /api/v1/nominees/{id}/activate
pub async fn activate_nominee(
    State(state): State<Arc<AppState>>,
    caller: RequestPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<Nominee>, ApiError> {
    Ok(Json(state.registry.activate(id, owner_id(&caller)?).await?))
}

/// POST /api/v1/nominees/{id}/revoke
pub async fn revoke_nominee(
    State(state): State<Arc<AppState>>,
    caller: RequestPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<Nominee>, ApiError> {
    Ok(Json(state.registry.revoke(id, owner_id(&caller)?).await?))
}

/// Access log across all of the owner's nominees, newest first
///
/// GET /api/v1/nominees/access-log
pub async fn list_access_logs(
    State(state): State<Arc<AppState>>,
    caller: RequestPrincipal,
) -> Result<Json<Vec<NamedAccessLogEntry>>, ApiError> {
    Ok(Json(state.registry.access_logs(owner_id(&caller)?).await?))
}

/// PATCH /api/v1/documents/{id}/nominee-access
pub async fn set_document_access(
    State(state): State<Arc<AppState>>,
    caller: RequestPrincipal,
    Path(id): Path<Uuid>,
    Json(request): Json<DocumentAccessRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .data
        .set_document_access(
            owner_id(&caller)?,
            id,
            request.accessible_to_nominees,
            &request.nominee_ids,
        )
        .await?;
    Ok(Json(MessageResponse::new("document access updated")))
}
