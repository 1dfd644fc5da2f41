//! In-memory storage backend
//!
//! Default storage implementation using in-memory hashmaps.
//! Suitable for development, tests and single-instance demos.
//! Data is lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sampatti_core::{
    AccessLogEntry, Asset, Document, Nominee, NomineeStatus, NomineeUpdate, ProfileUpdate, User,
};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};
use uuid::Uuid;

use super::{StorageError, VaultStore};

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StorageError> {
    lock.read().map_err(|_| StorageError::Poisoned)
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StorageError> {
    lock.write().map_err(|_| StorageError::Poisoned)
}

/// In-memory vault store implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    nominees: RwLock<HashMap<Uuid, Nominee>>,
    access_logs: RwLock<Vec<AccessLogEntry>>,
    assets: RwLock<HashMap<Uuid, Asset>>,
    documents: RwLock<HashMap<Uuid, Document>>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

/// Apply `f` to the nominee with `id`, bumping `updated_at`
fn with_nominee(
    nominees: &mut HashMap<Uuid, Nominee>,
    id: Uuid,
    f: impl FnOnce(&mut Nominee),
) -> bool {
    match nominees.get_mut(&id) {
        Some(nominee) => {
            f(nominee);
            nominee.updated_at = Utc::now();
            true
        }
        None => false,
    }
}

#[async_trait]
impl VaultStore for MemoryStore {
    // =========================================================================
    // Users
    // =========================================================================

    async fn create_user(&self, user: User) -> Result<(), StorageError> {
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.email == user.email) {
            return Err(StorageError::AlreadyExists(format!("user {}", user.email)));
        }
        info!(user_id = %user.id, "Storing new user");
        users.insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StorageError> {
        Ok(read(&self.users)?.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        Ok(read(&self.users)?
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<bool, StorageError> {
        let mut users = write(&self.users)?;
        Ok(match users.get_mut(&id) {
            Some(user) => {
                user.name = update.name.clone();
                user.phone_number = update.phone_number.clone();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn update_password_hash(&self, id: Uuid, hash: &str) -> Result<bool, StorageError> {
        let mut users = write(&self.users)?;
        Ok(match users.get_mut(&id) {
            Some(user) => {
                user.password_hash = hash.to_string();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StorageError> {
        let mut users = write(&self.users)?;
        Ok(match users.get_mut(&id) {
            Some(user) => {
                user.last_login = Some(at);
                true
            }
            None => false,
        })
    }

    // =========================================================================
    // Nominees
    // =========================================================================

    async fn create_nominee(&self, nominee: Nominee) -> Result<(), StorageError> {
        let mut nominees = write(&self.nominees)?;
        if nominees
            .values()
            .any(|n| n.user_id == nominee.user_id && n.email == nominee.email)
        {
            return Err(StorageError::AlreadyExists(format!(
                "nominee {} for user {}",
                nominee.email, nominee.user_id
            )));
        }
        info!(nominee_id = %nominee.id, user_id = %nominee.user_id, "Storing new nominee");
        nominees.insert(nominee.id, nominee);
        Ok(())
    }

    async fn get_nominee(&self, id: Uuid) -> Result<Option<Nominee>, StorageError> {
        Ok(read(&self.nominees)?.get(&id).cloned())
    }

    async fn get_nominee_by_email_and_owner(
        &self,
        email: &str,
        user_id: Uuid,
    ) -> Result<Option<Nominee>, StorageError> {
        Ok(read(&self.nominees)?
            .values()
            .find(|n| n.user_id == user_id && n.email == email)
            .cloned())
    }

    async fn list_nominees(&self, user_id: Uuid) -> Result<Vec<Nominee>, StorageError> {
        let mut list: Vec<Nominee> = read(&self.nominees)?
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn update_nominee(
        &self,
        id: Uuid,
        update: &NomineeUpdate,
    ) -> Result<bool, StorageError> {
        let mut nominees = write(&self.nominees)?;
        Ok(with_nominee(&mut nominees, id, |n| {
            n.name = update.name.clone();
            n.phone_number = update.phone_number.clone();
            n.relationship = update.relationship.clone();
            n.access_level = update.access_level;
        }))
    }

    async fn transition_nominee_status(
        &self,
        id: Uuid,
        from: NomineeStatus,
        to: NomineeStatus,
    ) -> Result<bool, StorageError> {
        let mut nominees = write(&self.nominees)?;
        match nominees.get_mut(&id) {
            Some(n) if n.status == from => {
                n.status = to;
                n.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_access_code_hash(&self, id: Uuid, hash: &str) -> Result<bool, StorageError> {
        let mut nominees = write(&self.nominees)?;
        Ok(with_nominee(&mut nominees, id, |n| {
            n.access_code_hash = Some(hash.to_string())
        }))
    }

    async fn update_last_access(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut nominees = write(&self.nominees)?;
        Ok(with_nominee(&mut nominees, id, |n| n.last_access_date = Some(at)))
    }

    async fn delete_nominee(&self, id: Uuid) -> Result<bool, StorageError> {
        let removed = write(&self.nominees)?.remove(&id).is_some();
        if removed {
            let mut documents = write(&self.documents)?;
            for doc in documents.values_mut() {
                doc.granted_to.retain(|n| *n != id);
            }
            info!(nominee_id = %id, "Removed nominee");
        }
        Ok(removed)
    }

    // =========================================================================
    // Access Log
    // =========================================================================

    async fn append_access_log(&self, entry: AccessLogEntry) -> Result<(), StorageError> {
        debug!(nominee_id = %entry.nominee_id, action = %entry.action, "Appending access log");
        write(&self.access_logs)?.push(entry);
        Ok(())
    }

    async fn list_access_logs(
        &self,
        nominee_id: Uuid,
    ) -> Result<Vec<AccessLogEntry>, StorageError> {
        // Appended in time order, so reversing gives newest first
        Ok(read(&self.access_logs)?
            .iter()
            .rev()
            .filter(|e| e.nominee_id == nominee_id)
            .cloned()
            .collect())
    }

    // =========================================================================
    // Assets & Documents
    // =========================================================================

    async fn insert_asset(&self, asset: Asset) -> Result<(), StorageError> {
        write(&self.assets)?.insert(asset.id, asset);
        Ok(())
    }

    async fn list_assets(&self, user_id: Uuid) -> Result<Vec<Asset>, StorageError> {
        Ok(read(&self.assets)?
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_document(&self, document: Document) -> Result<(), StorageError> {
        write(&self.documents)?.insert(document.id, document);
        Ok(())
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, StorageError> {
        Ok(read(&self.documents)?.get(&id).cloned())
    }

    async fn list_documents(&self, user_id: Uuid) -> Result<Vec<Document>, StorageError> {
        Ok(read(&self.documents)?
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn set_document_access(
        &self,
        id: Uuid,
        accessible_to_nominees: Option<bool>,
        nominee_ids: &[Uuid],
    ) -> Result<bool, StorageError> {
        let mut documents = write(&self.documents)?;
        Ok(match documents.get_mut(&id) {
            Some(doc) => {
                if let Some(flag) = accessible_to_nominees {
                    doc.accessible_to_nominees = flag;
                }
                doc.granted_to = nominee_ids.to_vec();
                true
            }
            None => false,
        })
    }
}
