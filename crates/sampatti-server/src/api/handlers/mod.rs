//! API request handlers

pub mod auth;
pub mod data;
pub mod nominees;
pub mod users;

use sampatti_core::{CodeSource, SecretVerifier};
use sampatti_credentials::TokenCodec;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::core::{AdvisorySink, Accounts, DataAccess, NomineeRegistry};
use crate::gateway::{check_owner_only, RequestPrincipal};
use crate::storage::VaultStore;

pub use auth::{
    emergency_access, login, refresh_token, register, EmergencyAccessRequest,
    EmergencyAccessResponse, LoginRequest, NomineeSummary, RefreshRequest, RefreshResponse,
};
pub use data::{get_data, log_nominee_action, NomineeActionRequest};
pub use nominees::{
    activate_nominee, create_nominee, delete_nominee, get_nominee, invite_nominee,
    list_access_logs, list_nominees, revoke_nominee, send_invitation, set_document_access,
    update_nominee, DocumentAccessRequest, InvitationResponse, InviteResponse,
};
pub use users::{change_password, get_profile, update_profile, ChangePasswordRequest};

/// Application state shared across handlers
#[derive(Debug)]
pub struct AppState {
    /// Signs and validates every bearer credential
    pub codec: Arc<TokenCodec>,
    pub accounts: Accounts,
    pub registry: NomineeRegistry,
    pub data: DataAccess,
}

impl AppState {
    pub fn new(
        store: Arc<dyn VaultStore>,
        codec: TokenCodec,
        secrets: Arc<dyn SecretVerifier>,
        codes: Arc<dyn CodeSource>,
        advisory: Arc<dyn AdvisorySink>,
    ) -> Self {
        let codec = Arc::new(codec);
        Self {
            accounts: Accounts::new(store.clone(), secrets.clone(), codec.clone()),
            registry: NomineeRegistry::new(store.clone(), secrets, codes, advisory),
            data: DataAccess::new(store),
            codec,
        }
    }
}

/// Plain acknowledgement body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Owner id of an owner-only request
fn owner_id(caller: &RequestPrincipal) -> Result<Uuid, ApiError> {
    Ok(check_owner_only(&caller.principal)?)
}
