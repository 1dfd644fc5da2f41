//! API error types and responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sampatti_core::{AccessError, ResponseClass};
use sampatti_credentials::CredentialError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::storage::StorageError;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

fn status_for(class: ResponseClass) -> StatusCode {
    match class {
        ResponseClass::BadRequest => StatusCode::BAD_REQUEST,
        ResponseClass::Unauthenticated => StatusCode::UNAUTHORIZED,
        ResponseClass::Forbidden => StatusCode::FORBIDDEN,
        ResponseClass::NotFound => StatusCode::NOT_FOUND,
        ResponseClass::Conflict => StatusCode::CONFLICT,
        ResponseClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            ApiError::Access(err) => {
                let class = err.class();
                let message = if class == ResponseClass::Internal {
                    // Storage and internal detail stays in the server log
                    error!(error = %err, "Request failed");
                    "internal server error".to_string()
                } else {
                    err.to_string()
                };
                let details = match err {
                    AccessError::InvalidTransition { from, to } => Some(serde_json::json!({
                        "from": from,
                        "to": to,
                    })),
                    _ => None,
                };
                (status_for(class), err.code(), message, details)
            }
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                msg.clone(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        ApiError::Access(err.into())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Access(err.into())
    }
}
