//! Records owned or read by the emergency-access subsystem

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AccessTier, NomineeStatus};

/// Account owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    /// Opaque secret-verifier hash, never serialized
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone_number: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            phone_number: phone_number.into(),
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }
}

/// Profile fields an owner may edit
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
}

/// Recovery contact for exactly one owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nominee {
    pub id: Uuid,
    /// The owning user
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub relationship: String,
    pub access_level: AccessTier,
    pub status: NomineeStatus,
    /// Hash of the current emergency access code. The cleartext is never
    /// stored, and the hash never leaves the service.
    #[serde(skip)]
    pub access_code_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_access_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Nominee {
    /// Build a fresh `Pending` nominee with no access code
    pub fn from_new(user_id: Uuid, new: NewNominee) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: new.name,
            email: new.email,
            phone_number: new.phone_number,
            relationship: new.relationship,
            access_level: new.access_level,
            status: NomineeStatus::Pending,
            access_code_hash: None,
            last_access_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Whether a usable access code hash is on record
    pub fn has_access_code(&self) -> bool {
        self.access_code_hash
            .as_deref()
            .map(|h| !h.is_empty())
            .unwrap_or(false)
    }
}

/// Owner-supplied data for a new nominee
#[derive(Debug, Clone, Deserialize)]
pub struct NewNominee {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub relationship: String,
    pub access_level: AccessTier,
}

/// Owner-editable nominee fields. Email, status and code material are
/// preserved across updates.
#[derive(Debug, Clone, Deserialize)]
pub struct NomineeUpdate {
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub relationship: String,
    pub access_level: AccessTier,
}

/// Caller metadata recorded with audit entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessOrigin {
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub device_info: String,
}

impl AccessOrigin {
    pub fn new(ip_address: impl Into<String>, device_info: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            device_info: device_info.into(),
        }
    }
}

/// Immutable audit record of a nominee authentication or data access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub id: Uuid,
    pub nominee_id: Uuid,
    pub date: DateTime<Utc>,
    pub action: String,
    pub ip_address: String,
    pub device_info: String,
}

impl AccessLogEntry {
    pub fn new(nominee_id: Uuid, action: impl Into<String>, origin: &AccessOrigin) -> Self {
        Self {
            id: Uuid::new_v4(),
            nominee_id,
            date: Utc::now(),
            action: action.into(),
            ip_address: origin.ip_address.clone(),
            device_info: origin.device_info.clone(),
        }
    }
}

/// Financial asset, as far as the access policy needs to see it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub asset_name: String,
    pub asset_type: String,
    #[serde(default)]
    pub institution: String,
    pub current_value: f64,
}

/// Stored document, as far as the access policy needs to see it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub document_type: String,
    /// Owner flag allowing nominees to see this document at all
    pub accessible_to_nominees: bool,
    /// Nominees this document has been explicitly granted to
    #[serde(default)]
    pub granted_to: Vec<Uuid>,
}

impl Document {
    pub fn is_granted_to(&self, nominee_id: Uuid) -> bool {
        self.granted_to.contains(&nominee_id)
    }
}
