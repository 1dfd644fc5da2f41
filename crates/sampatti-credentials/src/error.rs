//! Error types for the credential codec

use sampatti_core::AccessError;
use thiserror::Error;

/// Result type for credential operations
pub type Result<T> = std::result::Result<T, CredentialError>;

/// Errors that can occur while issuing or validating credentials
///
/// The detail carried by `Invalid` is for operator logs only. Callers see
/// nothing beyond invalid vs expired once this crosses into [`AccessError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Bad signature, bad shape, or a missing/malformed claim
    #[error("invalid credential: {0}")]
    Invalid(String),

    /// Signature is valid but `exp` has passed
    #[error("credential has expired")]
    Expired,

    /// Token could not be signed
    #[error("failed to sign credential: {0}")]
    Signing(String),

    /// Codec was built with unusable settings
    #[error("invalid codec configuration: {0}")]
    Configuration(String),

    /// The subject directory could not be consulted
    #[error("subject lookup failed: {0}")]
    Directory(String),
}

impl From<jsonwebtoken::errors::Error> for CredentialError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => CredentialError::Expired,
            _ => CredentialError::Invalid(err.to_string()),
        }
    }
}

impl From<CredentialError> for AccessError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Invalid(_) => AccessError::InvalidCredential,
            CredentialError::Expired => AccessError::ExpiredCredential,
            CredentialError::Signing(msg) | CredentialError::Configuration(msg) => {
                AccessError::Internal(msg)
            }
            CredentialError::Directory(msg) => AccessError::Storage(msg),
        }
    }
}
