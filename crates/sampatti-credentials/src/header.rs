//! `Authorization` header parsing

use sampatti_core::AccessError;

const BEARER: &str = "Bearer";

/// Pull the token out of an `Authorization: Bearer <token>` header value
///
/// An absent or empty header is [`AccessError::NoCredential`]; anything
/// other than exactly two space-separated parts with a `Bearer` scheme is
/// [`AccessError::MalformedCredential`]. The scheme is matched
/// case-insensitively.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AccessError> {
    let value = match header {
        Some(v) if !v.is_empty() => v,
        _ => return Err(AccessError::NoCredential),
    };

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case(BEARER) && !token.is_empty() =>
        {
            Ok(token)
        }
        _ => Err(AccessError::MalformedCredential),
    }
}
