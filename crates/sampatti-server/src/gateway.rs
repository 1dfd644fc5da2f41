//! Authorization Gateway
//!
//! The single enforcement point for protected routes:
//!
//! 1. `authenticate` extracts the bearer token, validates it and binds a
//!    [`RequestPrincipal`] to the request. Any failure is a 401 and the
//!    handler never runs.
//! 2. `require_owner` / `require_full_tier` are route layers that reject
//!    nominees (or non-Full nominees) with a 403.
//! 3. Handlers take the bound principal as an extractor.
//!
//! Nothing is cached between requests.

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use sampatti_core::{AccessError, AccessOrigin, AccessTier, Principal};
use sampatti_credentials::extract_bearer;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::handlers::AppState;

/// Principal and caller metadata bound to an authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPrincipal {
    pub principal: Principal,
    pub origin: AccessOrigin,
}

impl RequestPrincipal {
    pub fn is_nominee(&self) -> bool {
        self.principal.is_nominee()
    }

    /// Owner id, or the owner a nominee acts for
    pub fn acting_user_id(&self) -> Uuid {
        self.principal.acting_user_id()
    }

    /// `None` for owners
    pub fn access_tier(&self) -> Option<AccessTier> {
        self.principal.access_tier()
    }
}

/// Owner-only guard; yields the owner's id
pub fn check_owner_only(principal: &Principal) -> Result<Uuid, AccessError> {
    match principal {
        Principal::Owner { user_id } => Ok(*user_id),
        Principal::Nominee { .. } => Err(AccessError::OwnerOnly),
    }
}

/// Full-tier guard; owners always pass
pub fn check_full_tier(principal: &Principal) -> Result<(), AccessError> {
    match principal {
        Principal::Owner { .. } => Ok(()),
        Principal::Nominee {
            access_tier: AccessTier::Full,
            ..
        } => Ok(()),
        Principal::Nominee { .. } => Err(AccessError::InsufficientTier),
    }
}

/// Caller IP and user agent
///
/// The IP is the first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// socket peer when the server was started with connect info.
pub fn request_origin(headers: &HeaderMap, peer: Option<SocketAddr>) -> AccessOrigin {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let ip = header_str("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| header_str("x-real-ip").map(str::to_string))
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_default();

    let device = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    AccessOrigin::new(ip, device)
}

fn peer_of(extensions: &axum::http::Extensions) -> Option<SocketAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Validate the bearer credential and bind the principal
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = match request.headers().get(header::AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| AccessError::MalformedCredential)?,
        ),
        None => None,
    };

    let token = extract_bearer(header).map_err(|e| {
        debug!(error = %e, path = %request.uri().path(), "Rejected request without usable credential");
        e
    })?;

    let principal = state.codec.validate(token).map_err(|e| {
        warn!(error = %e, path = %request.uri().path(), "Credential rejected");
        AccessError::from(e)
    })?;

    let origin = request_origin(request.headers(), peer_of(request.extensions()));
    request
        .extensions_mut()
        .insert(RequestPrincipal { principal, origin });

    Ok(next.run(request).await)
}

fn bound(request: &Request) -> Result<&RequestPrincipal, AccessError> {
    request
        .extensions()
        .get::<RequestPrincipal>()
        .ok_or(AccessError::NoCredential)
}

/// Route layer rejecting nominee credentials
pub async fn require_owner(request: Request, next: Next) -> Result<Response, ApiError> {
    let principal = bound(&request)?;
    if let Err(e) = check_owner_only(&principal.principal) {
        warn!(path = %request.uri().path(), "Nominee credential on owner-only route");
        return Err(e.into());
    }
    Ok(next.run(request).await)
}

/// Route layer rejecting nominees below the Full tier
pub async fn require_full_tier(request: Request, next: Next) -> Result<Response, ApiError> {
    let principal = bound(&request)?;
    if let Err(e) = check_full_tier(&principal.principal) {
        warn!(path = %request.uri().path(), "Insufficient nominee tier");
        return Err(e.into());
    }
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for RequestPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestPrincipal>()
            .cloned()
            .ok_or_else(|| AccessError::NoCredential.into())
    }
}

/// Caller metadata for unauthenticated routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOrigin(pub AccessOrigin);

impl<S> FromRequestParts<S> for ClientOrigin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientOrigin(request_origin(
            &parts.headers,
            peer_of(&parts.extensions),
        )))
    }
}
