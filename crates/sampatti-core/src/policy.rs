//! Access Policy Evaluator
//!
//! Maps a principal to the categories of owner data it may read. The tier
//! table is pure; [`DataView::filter`] applies it to a set of assets and
//! documents already scoped to the acting owner.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Asset, Document};
use crate::types::{AccessTier, Principal};

/// Which of the owner's documents a principal may see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentScope {
    /// Every document of the owner
    All,
    /// No documents
    None,
    /// Documents flagged accessible to nominees and granted to this nominee
    FlaggedAndGranted,
}

/// Decision produced for a principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    pub can_see_assets: bool,
    pub can_see_documents: bool,
    pub document_scope: DocumentScope,
}

impl AccessPolicy {
    /// Unrestricted view used for owners
    pub const fn owner() -> Self {
        Self {
            can_see_assets: true,
            can_see_documents: true,
            document_scope: DocumentScope::All,
        }
    }

    /// The tier table
    pub const fn for_tier(tier: AccessTier) -> Self {
        match tier {
            AccessTier::Full => Self {
                can_see_assets: true,
                can_see_documents: true,
                document_scope: DocumentScope::All,
            },
            AccessTier::Limited => Self {
                can_see_assets: true,
                can_see_documents: false,
                document_scope: DocumentScope::None,
            },
            AccessTier::DocumentsOnly => Self {
                can_see_assets: false,
                can_see_documents: true,
                document_scope: DocumentScope::FlaggedAndGranted,
            },
        }
    }

    /// Owners never consult the tier table
    pub fn for_principal(principal: &Principal) -> Self {
        match principal {
            Principal::Owner { .. } => Self::owner(),
            Principal::Nominee { access_tier, .. } => Self::for_tier(*access_tier),
        }
    }

    /// Whether a single document is visible under this policy
    ///
    /// `nominee_id` is only consulted for [`DocumentScope::FlaggedAndGranted`];
    /// without one nothing in that scope is visible.
    pub fn allows_document(&self, document: &Document, nominee_id: Option<Uuid>) -> bool {
        if !self.can_see_documents {
            return false;
        }
        match self.document_scope {
            DocumentScope::All => true,
            DocumentScope::None => false,
            DocumentScope::FlaggedAndGranted => match nominee_id {
                Some(id) => document.accessible_to_nominees && document.is_granted_to(id),
                None => false,
            },
        }
    }
}

/// Owner data as seen by a particular principal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataView {
    pub assets: Vec<Asset>,
    pub documents: Vec<Document>,
}

impl DataView {
    /// Filter the acting owner's assets and documents for `principal`.
    ///
    /// Records that do not belong to the acting owner are always dropped.
    pub fn filter(principal: &Principal, assets: Vec<Asset>, documents: Vec<Document>) -> Self {
        let policy = AccessPolicy::for_principal(principal);
        let owner_id = principal.acting_user_id();
        let nominee_id = principal.nominee_id();

        let assets = if policy.can_see_assets {
            assets.into_iter().filter(|a| a.user_id == owner_id).collect()
        } else {
            Vec::new()
        };

        let documents = documents
            .into_iter()
            .filter(|d| d.user_id == owner_id && policy.allows_document(d, nominee_id))
            .collect();

        Self { assets, documents }
    }
}
