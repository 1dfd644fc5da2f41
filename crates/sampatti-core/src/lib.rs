//! # Sampatti Core
//!
//! Domain types for the Sampatti emergency-access subsystem: principals,
//! nominee records and their status machine, the tiered access policy and
//! the secret primitives used for passwords and emergency access codes.
//!
//! ## Key Concepts
//!
//! - **Principal**: an owner, or a nominee acting on an owner's behalf
//! - **Access tier**: `Full`, `Limited` or `DocumentsOnly`, gating what a nominee sees
//! - **Nominee status**: `Pending` → `Active` → `Revoked` (terminal)
//! - **Emergency access code**: 8-character secret shown once, stored only as a hash

pub mod code;
pub mod error;
pub mod model;
pub mod policy;
pub mod secret;
pub mod types;

pub use code::{CodeSource, FixedCodeSource, OsCodeSource, ACCESS_CODE_LEN};
pub use error::{AccessError, ResponseClass, Result};
pub use model::{
    AccessLogEntry, AccessOrigin, Asset, Document, NewNominee, Nominee, NomineeUpdate,
    ProfileUpdate, User,
};
pub use policy::{AccessPolicy, DataView, DocumentScope};
pub use secret::{Argon2Verifier, SecretVerifier};
pub use types::{AccessTier, NomineeStatus, Principal};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the library version
pub fn version() -> &'static str {
    VERSION
}
