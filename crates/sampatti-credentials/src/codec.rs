//! HS256 token codec for owner and nominee credentials

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sampatti_core::{AccessTier, Principal};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::claims::{Claims, NomineeClaims, OwnerClaims, WireClaims};
use crate::error::{CredentialError, Result};

/// Default owner access token lifetime
pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 15;

/// Default owner refresh token lifetime (7 days)
pub const DEFAULT_REFRESH_TTL_MINUTES: i64 = 10_080;

/// Fixed nominee token lifetime
pub const NOMINEE_TTL_HOURS: i64 = 24;

/// Resolves whether a token subject still exists
///
/// Consulted before a refresh token is exchanged for a new access token.
#[async_trait]
pub trait SubjectDirectory: Send + Sync {
    async fn owner_exists(&self, user_id: Uuid) -> Result<bool>;
}

/// Access and refresh tokens issued together at login
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and validates bearer tokens
///
/// Owner access and nominee tokens share the access secret and are told
/// apart by the `access_type` claim. Owner refresh tokens use a distinct
/// secret so they can never pass as access tokens.
#[derive(Clone)]
pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn builder() -> TokenCodecBuilder {
        TokenCodecBuilder::new()
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Short-lived owner access token
    pub fn issue_owner_access_token(&self, user_id: Uuid) -> Result<String> {
        let claims = owner_claims(user_id, self.access_ttl);
        self.sign(&WireClaims::from(claims), &self.access_encoding)
    }

    /// Long-lived owner refresh token, signed with the refresh secret
    pub fn issue_owner_refresh_token(&self, user_id: Uuid) -> Result<String> {
        let claims = owner_claims(user_id, self.refresh_ttl);
        self.sign(&WireClaims::from(claims), &self.refresh_encoding)
    }

    pub fn issue_owner_tokens(&self, user_id: Uuid) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_owner_access_token(user_id)?,
            refresh_token: self.issue_owner_refresh_token(user_id)?,
        })
    }

    /// 24h nominee token acting on behalf of `on_behalf_of`
    pub fn issue_nominee_token(
        &self,
        nominee_id: Uuid,
        on_behalf_of: Uuid,
        access_tier: AccessTier,
    ) -> Result<String> {
        let now = Utc::now();
        let claims = NomineeClaims {
            nominee_id,
            on_behalf_of,
            access_tier,
            issued_at: now.timestamp(),
            expires_at: (now + Duration::hours(NOMINEE_TTL_HOURS)).timestamp(),
        };
        info!(
            nominee_id = %nominee_id,
            user_id = %on_behalf_of,
            access_tier = %access_tier,
            "Issued nominee credential"
        );
        self.sign(&WireClaims::from(claims), &self.access_encoding)
    }

    /// Validate an access or nominee token and rebuild its principal
    pub fn validate(&self, token: &str) -> Result<Principal> {
        self.decode_claims(token, &self.access_decoding)
            .map(|claims| claims.principal())
    }

    /// Exchange an owner refresh token for a fresh access token
    ///
    /// Nominee tokens are never refreshable. The subject must still resolve
    /// through `directory`.
    pub async fn refresh_owner_access_token(
        &self,
        refresh_token: &str,
        directory: &dyn SubjectDirectory,
    ) -> Result<String> {
        let owner = match self.decode_claims(refresh_token, &self.refresh_decoding)? {
            Claims::Owner(owner) => owner,
            Claims::Nominee(nominee) => {
                warn!(nominee_id = %nominee.nominee_id, "Refresh attempted with nominee credential");
                return Err(CredentialError::Invalid("nominee tokens cannot be refreshed".into()));
            }
        };

        if !directory.owner_exists(owner.user_id).await? {
            warn!(user_id = %owner.user_id, "Refresh token subject no longer exists");
            return Err(CredentialError::Invalid("subject not found".into()));
        }

        debug!(user_id = %owner.user_id, "Refreshed owner access token");
        self.issue_owner_access_token(owner.user_id)
    }

    fn decode_claims(&self, token: &str, key: &DecodingKey) -> Result<Claims> {
        let data = decode::<WireClaims>(token, key, &self.validation).map_err(|e| {
            debug!(error = %e, "Credential decode failed");
            CredentialError::from(e)
        })?;
        Claims::try_from(data.claims)
    }

    fn sign(&self, claims: &WireClaims, key: &EncodingKey) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, key)
            .map_err(|e| CredentialError::Signing(e.to_string()))
    }
}

fn owner_claims(user_id: Uuid, ttl: Duration) -> OwnerClaims {
    let now = Utc::now();
    OwnerClaims {
        user_id,
        issued_at: now.timestamp(),
        expires_at: (now + ttl).timestamp(),
    }
}

/// Builder for [`TokenCodec`]
#[derive(Debug, Clone)]
pub struct TokenCodecBuilder {
    access_secret: Option<String>,
    refresh_secret: Option<String>,
    access_ttl_minutes: i64,
    refresh_ttl_minutes: i64,
}

impl TokenCodecBuilder {
    pub fn new() -> Self {
        Self {
            access_secret: None,
            refresh_secret: None,
            access_ttl_minutes: DEFAULT_ACCESS_TTL_MINUTES,
            refresh_ttl_minutes: DEFAULT_REFRESH_TTL_MINUTES,
        }
    }

    pub fn access_secret(mut self, secret: impl Into<String>) -> Self {
        self.access_secret = Some(secret.into());
        self
    }

    pub fn refresh_secret(mut self, secret: impl Into<String>) -> Self {
        self.refresh_secret = Some(secret.into());
        self
    }

    pub fn access_ttl_minutes(mut self, minutes: i64) -> Self {
        self.access_ttl_minutes = minutes;
        self
    }

    pub fn refresh_ttl_minutes(mut self, minutes: i64) -> Self {
        self.refresh_ttl_minutes = minutes;
        self
    }

    /// Build the codec. Both secrets are required, must be non-empty and
    /// must differ; both lifetimes must be positive.
    pub fn build(self) -> Result<TokenCodec> {
        let access = self
            .access_secret
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CredentialError::Configuration("access secret is required".into()))?;
        let refresh = self
            .refresh_secret
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CredentialError::Configuration("refresh secret is required".into()))?;

        if access == refresh {
            return Err(CredentialError::Configuration(
                "access and refresh secrets must differ".into(),
            ));
        }
        if self.access_ttl_minutes <= 0 || self.refresh_ttl_minutes <= 0 {
            return Err(CredentialError::Configuration(
                "token lifetimes must be positive".into(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(TokenCodec {
            access_encoding: EncodingKey::from_secret(access.as_bytes()),
            access_decoding: DecodingKey::from_secret(access.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh.as_bytes()),
            access_ttl: Duration::minutes(self.access_ttl_minutes),
            refresh_ttl: Duration::minutes(self.refresh_ttl_minutes),
            validation,
        })
    }
}

impl Default for TokenCodecBuilder {
    fn default() -> Self {
        Self::new()
    }
}
