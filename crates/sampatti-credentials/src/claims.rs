//! Token claims
//!
//! Tokens are decoded once into [`WireClaims`] and immediately narrowed into
//! the tagged [`Claims`] union. Nothing downstream sees an untyped claim map.

use sampatti_core::{AccessTier, Principal};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CredentialError, Result};

/// Discriminator carried by owner tokens
pub const ACCESS_TYPE_USER: &str = "user";

/// Discriminator carried by nominee tokens
pub const ACCESS_TYPE_NOMINEE: &str = "nominee";

/// Claim set as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_level: Option<String>,
}

/// Owner access or refresh token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerClaims {
    pub user_id: Uuid,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Nominee token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NomineeClaims {
    pub nominee_id: Uuid,
    pub on_behalf_of: Uuid,
    pub access_tier: AccessTier,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Decoded claims of either principal kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claims {
    Owner(OwnerClaims),
    Nominee(NomineeClaims),
}

impl Claims {
    pub fn principal(&self) -> Principal {
        match self {
            Claims::Owner(c) => Principal::owner(c.user_id),
            Claims::Nominee(c) => Principal::nominee(c.nominee_id, c.on_behalf_of, c.access_tier),
        }
    }

    pub fn expires_at(&self) -> i64 {
        match self {
            Claims::Owner(c) => c.expires_at,
            Claims::Nominee(c) => c.expires_at,
        }
    }
}

impl From<OwnerClaims> for WireClaims {
    fn from(c: OwnerClaims) -> Self {
        Self {
            sub: c.user_id.to_string(),
            iat: c.issued_at,
            exp: c.expires_at,
            access_type: Some(ACCESS_TYPE_USER.to_string()),
            user_id: None,
            access_level: None,
        }
    }
}

impl From<NomineeClaims> for WireClaims {
    fn from(c: NomineeClaims) -> Self {
        Self {
            sub: c.nominee_id.to_string(),
            iat: c.issued_at,
            exp: c.expires_at,
            access_type: Some(ACCESS_TYPE_NOMINEE.to_string()),
            user_id: Some(c.on_behalf_of.to_string()),
            access_level: Some(c.access_tier.to_string()),
        }
    }
}

fn parse_uuid(claim: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| CredentialError::Invalid(format!("malformed {} claim", claim)))
}

fn require<'a>(claim: &str, value: &'a Option<String>) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| CredentialError::Invalid(format!("missing {} claim", claim)))
}

impl TryFrom<WireClaims> for Claims {
    type Error = CredentialError;

    /// Fails closed: an absent or unknown discriminator never yields an
    /// owner principal.
    fn try_from(wire: WireClaims) -> Result<Self> {
        match wire.access_type.as_deref() {
            Some(ACCESS_TYPE_USER) => {
                if wire.user_id.is_some() || wire.access_level.is_some() {
                    return Err(CredentialError::Invalid(
                        "owner token carries nominee claims".into(),
                    ));
                }
                Ok(Claims::Owner(OwnerClaims {
                    user_id: parse_uuid("sub", &wire.sub)?,
                    issued_at: wire.iat,
                    expires_at: wire.exp,
                }))
            }
            Some(ACCESS_TYPE_NOMINEE) => {
                let on_behalf_of = parse_uuid("user_id", require("user_id", &wire.user_id)?)?;
                let access_tier = require("access_level", &wire.access_level)?
                    .parse::<AccessTier>()
                    .map_err(|_| CredentialError::Invalid("malformed access_level claim".into()))?;
                Ok(Claims::Nominee(NomineeClaims {
                    nominee_id: parse_uuid("sub", &wire.sub)?,
                    on_behalf_of,
                    access_tier,
                    issued_at: wire.iat,
                    expires_at: wire.exp,
                }))
            }
            Some(other) => Err(CredentialError::Invalid(format!(
                "unknown access_type '{}'",
                other
            ))),
            None => Err(CredentialError::Invalid("missing access_type claim".into())),
        }
    }
}
