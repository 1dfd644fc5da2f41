//! Error taxonomy for the emergency-access subsystem

use thiserror::Error;

use crate::types::NomineeStatus;

/// Result type alias using AccessError
pub type Result<T> = std::result::Result<T, AccessError>;

/// Errors returned uniformly by the authorization and emergency-access core
///
/// Callers branch on the variant (or on [`AccessError::class`]) rather than
/// on message text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// No bearer credential was presented
    #[error("authorization header not found")]
    NoCredential,

    /// The Authorization header is not `Bearer <token>`
    #[error("authorization header format must be Bearer {{token}}")]
    MalformedCredential,

    /// Signature, shape or claim validation failed
    #[error("invalid credential")]
    InvalidCredential,

    /// The credential's `exp` has passed
    #[error("credential has expired")]
    ExpiredCredential,

    /// Unknown email or wrong password at login
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("nominee not found")]
    NomineeNotFound,

    #[error("nominee already exists with this email")]
    NomineeExists,

    #[error("user not found")]
    UserNotFound,

    #[error("user already exists")]
    UserExists,

    #[error("document not found")]
    DocumentNotFound,

    /// The record does not belong to the calling owner
    #[error("unauthorized")]
    Unauthorized,

    /// The route requires an owner credential
    #[error("requires user access")]
    OwnerOnly,

    /// The route requires a Full-tier nominee or an owner
    #[error("requires full access")]
    InsufficientTier,

    #[error("no emergency access code has been set")]
    NoAccessCodeSet,

    #[error("invalid access code")]
    InvalidAccessCode,

    #[error("nominee access has been revoked")]
    NomineeRevoked,

    #[error("cannot move nominee from {from} to {to}")]
    InvalidTransition {
        from: NomineeStatus,
        to: NomineeStatus,
    },

    #[error("invalid request: {0}")]
    InvalidInput(String),

    /// Persistence failure on a primary write or read
    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Logical response class of an error, independent of transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    BadRequest,
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

impl AccessError {
    pub fn class(&self) -> ResponseClass {
        match self {
            AccessError::NoCredential
            | AccessError::MalformedCredential
            | AccessError::InvalidCredential
            | AccessError::ExpiredCredential
            | AccessError::InvalidCredentials
            | AccessError::NoAccessCodeSet
            | AccessError::InvalidAccessCode => ResponseClass::Unauthenticated,
            AccessError::Unauthorized
            | AccessError::OwnerOnly
            | AccessError::InsufficientTier
            | AccessError::NomineeRevoked => ResponseClass::Forbidden,
            AccessError::NomineeNotFound
            | AccessError::UserNotFound
            | AccessError::DocumentNotFound => ResponseClass::NotFound,
            AccessError::NomineeExists
            | AccessError::UserExists
            | AccessError::InvalidTransition { .. } => ResponseClass::Conflict,
            AccessError::InvalidInput(_) => ResponseClass::BadRequest,
            AccessError::Storage(_) | AccessError::Internal(_) => ResponseClass::Internal,
        }
    }

    /// Stable machine-readable code for response bodies
    pub fn code(&self) -> &'static str {
        match self {
            AccessError::NoCredential => "NO_CREDENTIAL",
            AccessError::MalformedCredential => "MALFORMED_CREDENTIAL",
            AccessError::InvalidCredential => "INVALID_CREDENTIAL",
            AccessError::ExpiredCredential => "EXPIRED_CREDENTIAL",
            AccessError::InvalidCredentials => "INVALID_CREDENTIALS",
            AccessError::NomineeNotFound => "NOMINEE_NOT_FOUND",
            AccessError::NomineeExists => "NOMINEE_EXISTS",
            AccessError::UserNotFound => "USER_NOT_FOUND",
            AccessError::UserExists => "USER_EXISTS",
            AccessError::DocumentNotFound => "DOCUMENT_NOT_FOUND",
            AccessError::Unauthorized => "UNAUTHORIZED",
            AccessError::OwnerOnly => "OWNER_ONLY",
            AccessError::InsufficientTier => "INSUFFICIENT_TIER",
            AccessError::NoAccessCodeSet => "NO_ACCESS_CODE_SET",
            AccessError::InvalidAccessCode => "INVALID_ACCESS_CODE",
            AccessError::NomineeRevoked => "NOMINEE_REVOKED",
            AccessError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AccessError::InvalidInput(_) => "BAD_REQUEST",
            AccessError::Storage(_) => "STORAGE_ERROR",
            AccessError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
