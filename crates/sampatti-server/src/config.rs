//! Environment configuration

use sampatti_core::Argon2Verifier;
use sampatti_credentials::codec::{DEFAULT_ACCESS_TTL_MINUTES, DEFAULT_REFRESH_TTL_MINUTES};
use sampatti_credentials::{CredentialError, TokenCodec};
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::Level;

pub const DEFAULT_PORT: u16 = 8080;

/// Argon2 defaults (m = 19 MiB, t = 2, p = 1)
pub const DEFAULT_ARGON2_MEMORY_KIB: u32 = 19_456;
pub const DEFAULT_ARGON2_ITERATIONS: u32 = 2;
pub const DEFAULT_ARGON2_PARALLELISM: u32 = 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Token signing settings
#[derive(Clone, PartialEq, Eq)]
pub struct JwtSettings {
    pub access_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_secret: String,
    pub refresh_ttl_minutes: i64,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("access_secret", &"<redacted>")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_secret", &"<redacted>")
            .field("refresh_ttl_minutes", &self.refresh_ttl_minutes)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Settings {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for Argon2Settings {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_ARGON2_MEMORY_KIB,
            iterations: DEFAULT_ARGON2_ITERATIONS,
            parallelism: DEFAULT_ARGON2_PARALLELISM,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub log_level: Level,
    pub jwt: JwtSettings,
    /// PostgreSQL connection string; in-memory storage when absent
    pub database_url: Option<String>,
    pub argon2: Argon2Settings,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read configuration through an arbitrary lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let access_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let refresh_secret =
            get("JWT_REFRESH_SECRET").ok_or(ConfigError::Missing("JWT_REFRESH_SECRET"))?;
        if access_secret == refresh_secret {
            return Err(ConfigError::Invalid {
                name: "JWT_REFRESH_SECRET",
                reason: "must differ from JWT_SECRET".into(),
            });
        }

        let jwt = JwtSettings {
            access_secret,
            access_ttl_minutes: positive(
                "JWT_EXPIRY_MINUTES",
                get("JWT_EXPIRY_MINUTES"),
                DEFAULT_ACCESS_TTL_MINUTES,
            )?,
            refresh_secret,
            refresh_ttl_minutes: positive(
                "JWT_REFRESH_EXPIRY",
                get("JWT_REFRESH_EXPIRY"),
                DEFAULT_REFRESH_TTL_MINUTES,
            )?,
        };

        let log_level = match get("SAMPATTI_LOG_LEVEL") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "SAMPATTI_LOG_LEVEL",
                reason: format!("unknown level '{}'", raw),
            })?,
            None => Level::INFO,
        };

        let argon2 = Argon2Settings {
            memory_kib: positive(
                "ARGON2_MEMORY_KIB",
                get("ARGON2_MEMORY_KIB"),
                DEFAULT_ARGON2_MEMORY_KIB,
            )?,
            iterations: positive(
                "ARGON2_ITERATIONS",
                get("ARGON2_ITERATIONS"),
                DEFAULT_ARGON2_ITERATIONS,
            )?,
            parallelism: positive(
                "ARGON2_PARALLELISM",
                get("ARGON2_PARALLELISM"),
                DEFAULT_ARGON2_PARALLELISM,
            )?,
        };

        Ok(Self {
            port: parse("SAMPATTI_PORT", get("SAMPATTI_PORT"), DEFAULT_PORT)?,
            log_level,
            jwt,
            database_url: get("DATABASE_URL"),
            argon2,
        })
    }

    pub fn token_codec(&self) -> Result<TokenCodec, CredentialError> {
        TokenCodec::builder()
            .access_secret(self.jwt.access_secret.clone())
            .refresh_secret(self.jwt.refresh_secret.clone())
            .access_ttl_minutes(self.jwt.access_ttl_minutes)
            .refresh_ttl_minutes(self.jwt.refresh_ttl_minutes)
            .build()
    }

    pub fn secret_verifier(&self) -> sampatti_core::Result<Argon2Verifier> {
        Argon2Verifier::with_params(
            self.argon2.memory_kib,
            self.argon2.iterations,
            self.argon2.parallelism,
        )
    }
}

fn parse<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            reason: format!("cannot parse '{}'", raw),
        }),
        None => Ok(default),
    }
}

fn positive<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let value = parse(name, raw, default)?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be positive".into(),
        });
    }
    Ok(value)
}
