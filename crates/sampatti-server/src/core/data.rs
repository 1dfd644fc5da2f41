//! Policy-filtered reads of an owner's assets and documents

use sampatti_core::{AccessError, AccessTier, DataView, Principal, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::storage::VaultStore;

/// The owner's public identity, as shown to nominees
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Everything a principal may see of an owner
#[derive(Debug, Clone, Serialize)]
pub struct OwnerData {
    pub user: OwnerSummary,
    /// `None` for the owner's own view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_level: Option<AccessTier>,
    #[serde(flatten)]
    pub view: DataView,
}

#[derive(Debug, Clone)]
pub struct DataAccess {
    store: Arc<dyn VaultStore>,
}

impl DataAccess {
    pub fn new(store: Arc<dyn VaultStore>) -> Self {
        Self { store }
    }

    /// Read the acting owner's data through the access policy
    pub async fn owner_data(&self, principal: &Principal) -> Result<OwnerData> {
        let owner_id = principal.acting_user_id();
        let user = self
            .store
            .get_user(owner_id)
            .await?
            .ok_or(AccessError::UserNotFound)?;

        let assets = self.store.list_assets(owner_id).await?;
        let documents = self.store.list_documents(owner_id).await?;
        let view = DataView::filter(principal, assets, documents);

        Ok(OwnerData {
            user: OwnerSummary {
                id: user.id,
                name: user.name,
                email: user.email,
            },
            access_level: principal.access_tier(),
            view,
        })
    }

    /// Set which of the owner's nominees a document is granted to
    ///
    /// Every listed nominee must belong to the document's owner.
    pub async fn set_document_access(
        &self,
        owner: Uuid,
        document_id: Uuid,
        accessible_to_nominees: Option<bool>,
        nominee_ids: &[Uuid],
    ) -> Result<()> {
        let document = self
            .store
            .get_document(document_id)
            .await?
            .ok_or(AccessError::DocumentNotFound)?;

        if document.user_id != owner {
            warn!(document_id = %document_id, user_id = %owner, "Document does not belong to caller");
            return Err(AccessError::Unauthorized);
        }

        let requested: BTreeSet<Uuid> = nominee_ids.iter().copied().collect();
        let own: BTreeSet<Uuid> = self
            .store
            .list_nominees(owner)
            .await?
            .into_iter()
            .map(|n| n.id)
            .collect();

        if let Some(foreign) = requested.difference(&own).next() {
            return Err(AccessError::InvalidInput(format!(
                "nominee {} does not belong to this user",
                foreign
            )));
        }

        let grants: Vec<Uuid> = requested.into_iter().collect();
        if !self
            .store
            .set_document_access(document_id, accessible_to_nominees, &grants)
            .await?
        {
            return Err(AccessError::DocumentNotFound);
        }

        info!(document_id = %document_id, grants = grants.len(), "Document nominee access updated");
        Ok(())
    }
}
