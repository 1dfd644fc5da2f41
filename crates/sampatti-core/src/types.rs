//! Access tiers, nominee status and the request principal

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AccessError;

/// Access tier granted to a nominee
///
/// The wire and storage representation is the capitalised name
/// (`"Full"`, `"Limited"`, `"DocumentsOnly"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessTier {
    /// Assets and every document of the owner
    Full,
    /// Assets only
    Limited,
    /// Only documents flagged for nominees and granted to this nominee
    DocumentsOnly,
}

impl AccessTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessTier::Full => "Full",
            AccessTier::Limited => "Limited",
            AccessTier::DocumentsOnly => "DocumentsOnly",
        }
    }
}

impl std::fmt::Display for AccessTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessTier {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Full" => Ok(AccessTier::Full),
            "Limited" => Ok(AccessTier::Limited),
            "DocumentsOnly" => Ok(AccessTier::DocumentsOnly),
            _ => Err(AccessError::InvalidInput(format!(
                "invalid access level '{}', must be 'Full', 'Limited', or 'DocumentsOnly'",
                s
            ))),
        }
    }
}

/// Lifecycle state of a nominee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NomineeStatus {
    Pending,
    Active,
    Revoked,
}

impl NomineeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NomineeStatus::Pending => "Pending",
            NomineeStatus::Active => "Active",
            NomineeStatus::Revoked => "Revoked",
        }
    }

    /// Status after a successful emergency-code verification.
    ///
    /// `Pending` auto-activates; `Active` stays put; a revoked nominee can
    /// never verify again.
    pub fn on_code_verified(self) -> Result<NomineeStatus, AccessError> {
        match self {
            NomineeStatus::Pending | NomineeStatus::Active => Ok(NomineeStatus::Active),
            NomineeStatus::Revoked => Err(AccessError::NomineeRevoked),
        }
    }

    /// Status after an explicit owner activation
    pub fn on_activate(self) -> Result<NomineeStatus, AccessError> {
        match self {
            NomineeStatus::Pending | NomineeStatus::Active => Ok(NomineeStatus::Active),
            NomineeStatus::Revoked => Err(AccessError::InvalidTransition {
                from: self,
                to: NomineeStatus::Active,
            }),
        }
    }

    /// Status after an explicit owner revocation. Revoked is terminal, so
    /// revoking twice is a no-op.
    pub fn on_revoke(self) -> NomineeStatus {
        NomineeStatus::Revoked
    }

    pub fn is_revoked(&self) -> bool {
        matches!(self, NomineeStatus::Revoked)
    }
}

impl std::fmt::Display for NomineeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NomineeStatus {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(NomineeStatus::Pending),
            "Active" => Ok(NomineeStatus::Active),
            "Revoked" => Ok(NomineeStatus::Revoked),
            _ => Err(AccessError::InvalidInput(format!("unknown nominee status '{}'", s))),
        }
    }
}

/// Identity resolved from a validated credential
///
/// Never persisted; rebuilt from the bearer token on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    /// The account owner acting on their own data
    Owner { user_id: Uuid },
    /// A nominee acting on behalf of an owner
    Nominee {
        nominee_id: Uuid,
        on_behalf_of: Uuid,
        access_tier: AccessTier,
    },
}

impl Principal {
    pub fn owner(user_id: Uuid) -> Self {
        Principal::Owner { user_id }
    }

    pub fn nominee(nominee_id: Uuid, on_behalf_of: Uuid, access_tier: AccessTier) -> Self {
        Principal::Nominee {
            nominee_id,
            on_behalf_of,
            access_tier,
        }
    }

    /// The user whose data this principal acts upon
    pub fn acting_user_id(&self) -> Uuid {
        match self {
            Principal::Owner { user_id } => *user_id,
            Principal::Nominee { on_behalf_of, .. } => *on_behalf_of,
        }
    }

    /// The token subject: the owner's id or the nominee's id
    pub fn subject_id(&self) -> Uuid {
        match self {
            Principal::Owner { user_id } => *user_id,
            Principal::Nominee { nominee_id, .. } => *nominee_id,
        }
    }

    pub fn is_nominee(&self) -> bool {
        matches!(self, Principal::Nominee { .. })
    }

    pub fn nominee_id(&self) -> Option<Uuid> {
        match self {
            Principal::Owner { .. } => None,
            Principal::Nominee { nominee_id, .. } => Some(*nominee_id),
        }
    }

    /// Access tier of a nominee principal; `None` for owners
    pub fn access_tier(&self) -> Option<AccessTier> {
        match self {
            Principal::Owner { .. } => None,
            Principal::Nominee { access_tier, .. } => Some(*access_tier),
        }
    }
}
