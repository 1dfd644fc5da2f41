//! Nominee Registry
//!
//! Owns nominee records, their status machine and their emergency access
//! code material. Every owner-facing operation checks that the nominee
//! belongs to the calling owner before touching it.

use chrono::Utc;
use sampatti_core::{
    AccessError, AccessLogEntry, AccessOrigin, CodeSource, NewNominee, Nominee, NomineeStatus,
    NomineeUpdate, Result, SecretVerifier,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::advisory::{AdvisoryFailure, AdvisoryOperation, AdvisorySink};
use super::audit::{AuditLog, ACTION_CODE_VERIFIED};
use crate::storage::{StorageError, VaultStore};

/// Name shown for log entries whose nominee no longer exists
pub const UNKNOWN_NOMINEE: &str = "Unknown";

/// A freshly generated access code together with the nominee it unlocks
///
/// The code is cleartext and exists only in this value.
#[derive(Debug, Clone, Serialize)]
pub struct Invitation {
    pub access_code: String,
    pub nominee: Nominee,
}

/// Access log entry annotated with the nominee's name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedAccessLogEntry {
    #[serde(flatten)]
    pub entry: AccessLogEntry,
    pub nominee_name: String,
}

fn validate_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AccessError::InvalidInput(format!("invalid email '{}'", email))),
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AccessError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

/// Outcome of a status change
#[derive(Debug)]
enum Transition {
    Changed,
    Unchanged,
    WriteFailed(StorageError),
}

/// Nominee registry
#[derive(Debug, Clone)]
pub struct NomineeRegistry {
    store: Arc<dyn VaultStore>,
    secrets: Arc<dyn SecretVerifier>,
    codes: Arc<dyn CodeSource>,
    audit: AuditLog,
    advisory: Arc<dyn AdvisorySink>,
}

impl NomineeRegistry {
    pub fn new(
        store: Arc<dyn VaultStore>,
        secrets: Arc<dyn SecretVerifier>,
        codes: Arc<dyn CodeSource>,
        advisory: Arc<dyn AdvisorySink>,
    ) -> Self {
        let audit = AuditLog::new(store.clone(), advisory.clone());
        Self {
            store,
            secrets,
            codes,
            audit,
            advisory,
        }
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Load a nominee and check it belongs to `owner`
    async fn owned(&self, nominee_id: Uuid, owner: Uuid) -> Result<Nominee> {
        let nominee = self
            .store
            .get_nominee(nominee_id)
            .await?
            .ok_or(AccessError::NomineeNotFound)?;

        if !nominee.is_owned_by(owner) {
            warn!(nominee_id = %nominee_id, user_id = %owner, "Nominee does not belong to caller");
            return Err(AccessError::Unauthorized);
        }
        Ok(nominee)
    }

    /// Report a failed best-effort write
    fn advise(&self, operation: AdvisoryOperation, nominee_id: Uuid, error: StorageError) {
        self.advisory.report(AdvisoryFailure {
            operation,
            nominee_id,
            error: error.to_string(),
        });
    }

    // =========================================================================
    // Owner-managed records
    // =========================================================================

    /// Create a `Pending` nominee with no access code. The email is stored
    /// trimmed.
    pub async fn create(&self, owner: Uuid, mut new: NewNominee) -> Result<Nominee> {
        new.email = new.email.trim().to_string();
        require_non_empty("name", &new.name)?;
        validate_email(&new.email)?;

        if self
            .store
            .get_nominee_by_email_and_owner(&new.email, owner)
            .await?
            .is_some()
        {
            return Err(AccessError::NomineeExists);
        }

        let nominee = Nominee::from_new(owner, new);
        match self.store.create_nominee(nominee.clone()).await {
            Ok(()) => {}
            // Lost a race with a concurrent create
            Err(StorageError::AlreadyExists(_)) => return Err(AccessError::NomineeExists),
            Err(e) => return Err(e.into()),
        }

        info!(
            nominee_id = %nominee.id,
            user_id = %owner,
            access_tier = %nominee.access_level,
            "Created nominee"
        );
        Ok(nominee)
    }

    pub async fn get(&self, nominee_id: Uuid, owner: Uuid) -> Result<Nominee> {
        self.owned(nominee_id, owner).await
    }

    pub async fn list(&self, owner: Uuid) -> Result<Vec<Nominee>> {
        Ok(self.store.list_nominees(owner).await?)
    }

    /// Edit name, phone, relationship and tier. Email, status, code hash and
    /// last access are left as they are.
    pub async fn update(
        &self,
        nominee_id: Uuid,
        owner: Uuid,
        update: NomineeUpdate,
    ) -> Result<Nominee> {
        require_non_empty("name", &update.name)?;
        self.owned(nominee_id, owner).await?;

        if !self.store.update_nominee(nominee_id, &update).await? {
            return Err(AccessError::NomineeNotFound);
        }

        info!(nominee_id = %nominee_id, access_tier = %update.access_level, "Updated nominee");
        self.store
            .get_nominee(nominee_id)
            .await?
            .ok_or(AccessError::NomineeNotFound)
    }

    /// Remove the record. Its access log entries are kept.
    pub async fn delete(&self, nominee_id: Uuid, owner: Uuid) -> Result<()> {
        self.owned(nominee_id, owner).await?;

        if !self.store.delete_nominee(nominee_id).await? {
            return Err(AccessError::NomineeNotFound);
        }

        info!(nominee_id = %nominee_id, user_id = %owner, "Deleted nominee");
        Ok(())
    }

    // =========================================================================
    // Access code and status machine
    // =========================================================================

    /// Issue a fresh access code, replacing any previous one
    ///
    /// The cleartext is returned exactly once; only its hash is stored.
    /// Concurrent calls are last-write-wins.
    pub async fn generate_invite(&self, nominee_id: Uuid, owner: Uuid) -> Result<String> {
        let nominee = self.owned(nominee_id, owner).await?;
        if nominee.status.is_revoked() {
            return Err(AccessError::NomineeRevoked);
        }

        let code = self.codes.generate();
        let hash = self.secrets.hash(&code)?;

        if !self.store.update_access_code_hash(nominee_id, &hash).await? {
            return Err(AccessError::NomineeNotFound);
        }

        info!(nominee_id = %nominee_id, user_id = %owner, "Generated emergency access code");
        Ok(code)
    }

    /// Generate an invite and activate the nominee in one step
    pub async fn send_invitation(&self, nominee_id: Uuid, owner: Uuid) -> Result<Invitation> {
        let access_code = self.generate_invite(nominee_id, owner).await?;
        let nominee = self.activate(nominee_id, owner).await?;

        info!(nominee_id = %nominee_id, "Invitation prepared");
        Ok(Invitation {
            access_code,
            nominee,
        })
    }

    pub async fn activate(&self, nominee_id: Uuid, owner: Uuid) -> Result<Nominee> {
        let mut nominee = self.owned(nominee_id, owner).await?;
        if let Transition::WriteFailed(e) = self
            .transition(&mut nominee, NomineeStatus::on_activate)
            .await?
        {
            return Err(e.into());
        }
        Ok(nominee)
    }

    pub async fn revoke(&self, nominee_id: Uuid, owner: Uuid) -> Result<Nominee> {
        let mut nominee = self.owned(nominee_id, owner).await?;
        if let Transition::WriteFailed(e) = self
            .transition(&mut nominee, |status| Ok(status.on_revoke()))
            .await?
        {
            return Err(e.into());
        }
        Ok(nominee)
    }

    /// Apply `step` to the nominee's status with a compare-and-set write
    ///
    /// When another writer changed the status first, the row is re-read and
    /// `step` is applied to the fresh status, so a concurrent revocation is
    /// never overwritten. Statuses only move forward, which bounds the
    /// retries. A failed compare-and-set write is handed back to the caller
    /// and `nominee.status` is set to the target regardless.
    async fn transition(
        &self,
        nominee: &mut Nominee,
        step: impl Fn(NomineeStatus) -> Result<NomineeStatus>,
    ) -> Result<Transition> {
        loop {
            let from = nominee.status;
            let to = step(from)?;
            if to == from {
                return Ok(Transition::Unchanged);
            }

            match self
                .store
                .transition_nominee_status(nominee.id, from, to)
                .await
            {
                Ok(true) => {
                    info!(
                        nominee_id = %nominee.id,
                        from = %from,
                        to = %to,
                        "Nominee status changed"
                    );
                    nominee.status = to;
                    return Ok(Transition::Changed);
                }
                Ok(false) => {
                    let current = self
                        .store
                        .get_nominee(nominee.id)
                        .await?
                        .ok_or(AccessError::NomineeNotFound)?;
                    warn!(
                        nominee_id = %nominee.id,
                        expected = %from,
                        found = %current.status,
                        "Nominee status changed concurrently"
                    );
                    nominee.status = current.status;
                }
                Err(e) => {
                    nominee.status = to;
                    return Ok(Transition::WriteFailed(e));
                }
            }
        }
    }

    /// Check an emergency access code presented by a nominee
    ///
    /// On success a `Pending` nominee becomes `Active` and an access log entry
    /// is appended. Both writes are best-effort, as is the last-access stamp,
    /// and the returned nominee reflects the transition either way. A
    /// revocation that lands between the read and the status write still
    /// fails the call. The code is not consumed.
    pub async fn verify_access_code(
        &self,
        email: &str,
        owner: Uuid,
        code: &str,
        origin: &AccessOrigin,
    ) -> Result<Nominee> {
        let mut nominee = self
            .store
            .get_nominee_by_email_and_owner(email.trim(), owner)
            .await?
            .ok_or(AccessError::NomineeNotFound)?;

        if !nominee.has_access_code() {
            return Err(AccessError::NoAccessCodeSet);
        }
        let hash = nominee.access_code_hash.as_deref().unwrap_or_default();
        if !self.secrets.verify(code, hash) {
            warn!(nominee_id = %nominee.id, ip = %origin.ip_address, "Invalid emergency access code");
            return Err(AccessError::InvalidAccessCode);
        }

        let nominee_id = nominee.id;
        let transition = self
            .transition(&mut nominee, NomineeStatus::on_code_verified)
            .await
            .map_err(|e| {
                if e == AccessError::NomineeRevoked {
                    warn!(nominee_id = %nominee_id, "Revoked nominee presented a valid access code");
                }
                e
            })?;
        match transition {
            Transition::Changed => {
                info!(nominee_id = %nominee.id, "Nominee activated by access code")
            }
            Transition::Unchanged => {}
            Transition::WriteFailed(e) => {
                self.advise(AdvisoryOperation::StatusTransition, nominee.id, e)
            }
        }

        self.audit
            .record(nominee.id, ACTION_CODE_VERIFIED, origin)
            .await;

        let now = Utc::now();
        if let Err(e) = self.store.update_last_access(nominee.id, now).await {
            self.advise(AdvisoryOperation::LastAccess, nominee.id, e);
        }
        nominee.last_access_date = Some(now);

        info!(nominee_id = %nominee.id, user_id = %owner, "Verified emergency access code");
        Ok(nominee)
    }

    // =========================================================================
    // Access log
    // =========================================================================

    /// Log entries across all of an owner's nominees, newest first
    pub async fn access_logs(&self, owner: Uuid) -> Result<Vec<NamedAccessLogEntry>> {
        let nominees = self.store.list_nominees(owner).await?;
        let names: HashMap<Uuid, String> =
            nominees.iter().map(|n| (n.id, n.name.clone())).collect();

        let mut entries = Vec::new();
        for nominee in &nominees {
            entries.extend(self.store.list_access_logs(nominee.id).await?);
        }
        entries.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(entries
            .into_iter()
            .map(|entry| NamedAccessLogEntry {
                nominee_name: names
                    .get(&entry.nominee_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_NOMINEE.to_string()),
                entry,
            })
            .collect())
    }

    /// Append an action reported by a nominee to its own log
    pub async fn log_action(
        &self,
        nominee_id: Uuid,
        action: &str,
        origin: &AccessOrigin,
    ) -> Result<AccessLogEntry> {
        require_non_empty("action", action)?;
        Ok(self.audit.append(nominee_id, action.trim(), origin).await?)
    }
}
