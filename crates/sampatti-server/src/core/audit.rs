//! Nominee access log writer

use sampatti_core::{AccessLogEntry, AccessOrigin};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::advisory::{AdvisoryFailure, AdvisoryOperation, AdvisorySink};
use crate::storage::{StorageError, VaultStore};

pub const ACTION_CODE_VERIFIED: &str = "Verified emergency access code";
pub const ACTION_EMERGENCY_DATA_ACCESS: &str = "Emergency Data Access";
pub const ACTION_VIEWED_USER_DATA: &str = "Viewed User Data";

/// Appends access log entries
#[derive(Debug, Clone)]
pub struct AuditLog {
    store: Arc<dyn VaultStore>,
    advisory: Arc<dyn AdvisorySink>,
}

impl AuditLog {
    pub fn new(store: Arc<dyn VaultStore>, advisory: Arc<dyn AdvisorySink>) -> Self {
        Self { store, advisory }
    }

    /// Append an entry, surfacing failure to the caller
    pub async fn append(
        &self,
        nominee_id: Uuid,
        action: &str,
        origin: &AccessOrigin,
    ) -> Result<AccessLogEntry, StorageError> {
        let entry = AccessLogEntry::new(nominee_id, action, origin);
        self.store.append_access_log(entry.clone()).await?;
        debug!(nominee_id = %nominee_id, action = %action, "Access logged");
        Ok(entry)
    }

    /// Append an entry; a failure goes to the advisory sink
    pub async fn record(&self, nominee_id: Uuid, action: &str, origin: &AccessOrigin) {
        if let Err(e) = self.append(nominee_id, action, origin).await {
            self.advisory.report(AdvisoryFailure {
                operation: AdvisoryOperation::AccessLog,
                nominee_id,
                error: e.to_string(),
            });
        }
    }
}
