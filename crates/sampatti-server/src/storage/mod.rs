//! Storage abstraction for the Sampatti server
//!
//! A single trait covers everything the emergency-access subsystem persists
//! or reads: owners, nominees, the nominee access log, and the asset and
//! document records the access policy filters. The in-memory backend is the
//! default; PostgreSQL is available behind the `postgres` feature.
//!
//! Every call is read-your-writes for the caller that made it.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sampatti_core::{
    AccessError, AccessLogEntry, Asset, Document, Nominee, NomineeStatus, NomineeUpdate,
    ProfileUpdate, User,
};
use std::fmt::Debug;
use uuid::Uuid;

/// Error type for storage operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// A uniqueness constraint was violated
    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    /// A stored value could not be decoded into a domain type
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection error: {0}")]
    Connection(String),

    /// An in-process lock was poisoned by a panicking writer
    #[error("Storage lock poisoned")]
    Poisoned,
}

impl From<StorageError> for AccessError {
    fn from(err: StorageError) -> Self {
        AccessError::Storage(err.to_string())
    }
}

/// Storage backend trait for the Sampatti server
///
/// Implementations must be thread-safe and support concurrent access.
/// Update and delete methods return `false` when the target row is absent.
#[async_trait]
pub trait VaultStore: Send + Sync + Debug {
    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new owner; `AlreadyExists` if the email is taken
    async fn create_user(&self, user: User) -> Result<(), StorageError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StorageError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    async fn update_user_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<bool, StorageError>;

    async fn update_password_hash(&self, id: Uuid, hash: &str) -> Result<bool, StorageError>;

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StorageError>;

    // =========================================================================
    // Nominees
    // =========================================================================

    /// Insert a new nominee; `AlreadyExists` on a duplicate `(user_id, email)`
    async fn create_nominee(&self, nominee: Nominee) -> Result<(), StorageError>;

    async fn get_nominee(&self, id: Uuid) -> Result<Option<Nominee>, StorageError>;

    async fn get_nominee_by_email_and_owner(
        &self,
        email: &str,
        user_id: Uuid,
    ) -> Result<Option<Nominee>, StorageError>;

    /// Nominees of one owner, newest first
    async fn list_nominees(&self, user_id: Uuid) -> Result<Vec<Nominee>, StorageError>;

    /// Overwrite the owner-editable fields only
    async fn update_nominee(&self, id: Uuid, update: &NomineeUpdate)
        -> Result<bool, StorageError>;

    /// Set the status to `to` only if it is currently `from`
    ///
    /// Returns `false` when the row is absent or another writer changed the
    /// status first.
    async fn transition_nominee_status(
        &self,
        id: Uuid,
        from: NomineeStatus,
        to: NomineeStatus,
    ) -> Result<bool, StorageError>;

    /// Replace the stored access code hash (last write wins)
    async fn update_access_code_hash(&self, id: Uuid, hash: &str) -> Result<bool, StorageError>;

    async fn update_last_access(&self, id: Uuid, at: DateTime<Utc>)
        -> Result<bool, StorageError>;

    /// Remove a nominee and its document grants. Access log entries stay.
    async fn delete_nominee(&self, id: Uuid) -> Result<bool, StorageError>;

    // =========================================================================
    // Access Log
    // =========================================================================

    async fn append_access_log(&self, entry: AccessLogEntry) -> Result<(), StorageError>;

    /// Entries for one nominee, newest first
    async fn list_access_logs(&self, nominee_id: Uuid)
        -> Result<Vec<AccessLogEntry>, StorageError>;

    // =========================================================================
    // Assets & Documents
    // =========================================================================

    async fn insert_asset(&self, asset: Asset) -> Result<(), StorageError>;

    async fn list_assets(&self, user_id: Uuid) -> Result<Vec<Asset>, StorageError>;

    async fn insert_document(&self, document: Document) -> Result<(), StorageError>;

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, StorageError>;

    /// Documents of one owner with their grant lists populated
    async fn list_documents(&self, user_id: Uuid) -> Result<Vec<Document>, StorageError>;

    /// Replace a document's grant list, optionally updating its nominee flag
    async fn set_document_access(
        &self,
        id: Uuid,
        accessible_to_nominees: Option<bool>,
        nominee_ids: &[Uuid],
    ) -> Result<bool, StorageError>;
}
