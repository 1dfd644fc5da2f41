//! Sampatti Server
//!
//! Emergency-access authorization backend. Owners register, manage their
//! nominees and decide which documents each nominee may see. A nominee who
//! presents a valid emergency access code receives a 24h credential and a
//! view of the owner's data filtered by the nominee's access tier.
//!
//! ## Components
//!
//! - [`gateway`]: bearer-credential enforcement on every protected route
//! - [`core::NomineeRegistry`]: nominee records, status machine, access codes
//! - [`core::Accounts`]: owner registration, login, refresh and profile
//! - [`core::DataAccess`]: policy-filtered reads and document grants
//! - [`core::AuditLog`]: nominee access log with advisory reporting
//! - [`storage`]: in-memory and PostgreSQL backends
//!
//! ## API Endpoints
//!
//! ### Public
//! - `GET /health` - Liveness check
//! - `POST /api/v1/auth/register` - Register an owner
//! - `POST /api/v1/auth/login` - Owner login (access + refresh token)
//! - `POST /api/v1/auth/refresh-token` - New owner access token
//! - `POST /api/v1/auth/emergency-access` - Exchange an access code for a nominee credential
//!
//! ### Authenticated
//! - `GET /api/v1/users/profile` - Owner or Full-tier nominee
//! - `GET /api/v1/data` - Policy-filtered assets and documents
//! - `POST /api/v1/nominee/access-log` - Nominee records an action
//!
//! ### Owner only
//! - `PUT /api/v1/users/profile`, `POST /api/v1/users/change-password`
//! - `GET|POST /api/v1/nominees`, `GET|PUT|DELETE /api/v1/nominees/{id}`
//! - `POST /api/v1/nominees/{id}/{invite,send-invitation,activate,revoke}`
//! - `GET /api/v1/nominees/access-log`
//! - `PATCH /api/v1/documents/{id}/nominee-access`

pub mod api;
pub mod config;
pub mod core;
pub mod gateway;
pub mod storage;

pub use api::create_router;
pub use api::handlers::AppState;
pub use config::{AppConfig, ConfigError};
pub use crate::core::{AdvisorySink, NomineeRegistry, TracingAdvisory};
pub use gateway::{ClientOrigin, RequestPrincipal};
pub use storage::{MemoryStore, StorageError, VaultStore};
