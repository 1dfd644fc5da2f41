//! Sampatti Credentials
//!
//! Bearer credentials for the two principal kinds that can call the API:
//!
//! - **Owner**: short-lived access token plus a long-lived refresh token,
//!   each signed with its own secret
//! - **Nominee**: a single 24h token carrying the owner it acts for and its
//!   access tier; never refreshable
//!
//! All tokens are compact HS256 JWTs. Owner access and nominee tokens share
//! a signing secret and are distinguished by the `access_type` claim.
//!
//! ## Usage
//!
//! ```ignore
//! use sampatti_credentials::{extract_bearer, TokenCodec};
//!
//! let codec = TokenCodec::builder()
//!     .access_secret(access_secret)
//!     .refresh_secret(refresh_secret)
//!     .access_ttl_minutes(15)
//!     .build()?;
//!
//! let token = extract_bearer(headers.get("authorization"))?;
//! let principal = codec.validate(token)?;
//! ```

pub mod claims;
pub mod codec;
pub mod error;
pub mod header;

pub use claims::{Claims, NomineeClaims, OwnerClaims, WireClaims};
pub use codec::{SubjectDirectory, TokenCodec, TokenCodecBuilder, TokenPair, NOMINEE_TTL_HOURS};
pub use error::{CredentialError, Result};
pub use header::extract_bearer;
