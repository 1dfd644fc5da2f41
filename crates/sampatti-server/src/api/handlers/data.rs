//! Policy-filtered data reads and nominee action logging

use axum::{extract::State, http::StatusCode, Json};
use sampatti_core::{AccessError, AccessLogEntry};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use super::AppState;
use crate::api::error::ApiError;
use crate::core::{OwnerData, ACTION_VIEWED_USER_DATA};
use crate::gateway::RequestPrincipal;

#[derive(Debug, Deserialize)]
pub struct NomineeActionRequest {
    pub action: String,
}

/// GET /api/v1/data
///
/// Owners see everything they own. Nominees see what their tier allows,
/// and each nominee read is logged.
pub async fn get_data(
    State(state): State<Arc<AppState>>,
    caller: RequestPrincipal,
) -> Result<Json<OwnerData>, ApiError> {
    let data = state.data.owner_data(&caller.principal).await?;

    if let Some(nominee_id) = caller.principal.nominee_id() {
        state
            .registry
            .audit()
            .record(nominee_id, ACTION_VIEWED_USER_DATA, &caller.origin)
            .await;
    }

    Ok(Json(data))
}

/// POST /api/v1/nominee/access-log
pub async fn log_nominee_action(
    State(state): State<Arc<AppState>>,
    caller: RequestPrincipal,
    Json(request): Json<NomineeActionRequest>,
) -> Result<(StatusCode, Json<AccessLogEntry>), ApiError> {
    let Some(nominee_id) = caller.principal.nominee_id() else {
        warn!(user_id = %caller.acting_user_id(), "Owner credential on nominee action log");
        return Err(AccessError::Unauthorized.into());
    };

    let entry = state
        .registry
        .log_action(nominee_id, &request.action, &caller.origin)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
