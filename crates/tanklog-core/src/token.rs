//! Local access-token inspection.
//!
//! The access token is an opaque three-part compact structure
//! (`header.payload.signature`). The client only decodes the payload to
//! fail fast on an apparently expired token; it never verifies the
//! signature. The server independently re-validates the token on every
//! protected call, so this check must tolerate false negatives from clock
//! skew or already-rotated tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Claims the client reads from the token payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Subject, usually the account email.
    pub sub: Option<String>,
    /// Expiry as Unix epoch seconds.
    pub exp: i64,
}

impl TokenClaims {
    /// Whether the claimed expiry has passed at `now` (epoch seconds).
    pub const fn is_expired(&self, now: i64) -> bool {
        now >= self.exp
    }
}

/// Decode the payload segment of a compact token without verification.
///
/// Rejects tokens that do not have exactly three dot-separated parts, a
/// base64url payload, or a JSON payload carrying `exp`.
pub fn decode_claims(token: &str) -> Result<TokenClaims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(Error::InvalidToken(format!(
            "expected 3 token segments, found {}",
            parts.len()
        )));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|error| Error::InvalidToken(format!("payload is not base64url: {error}")))?;
    serde_json::from_slice(&payload)
        .map_err(|error| Error::InvalidToken(format!("payload is not claim JSON: {error}")))
}

#[cfg(test)]
pub(crate) fn encode_unsigned(sub: &str, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({ "sub": sub, "exp": exp })
            .to_string()
            .as_bytes(),
    );
    format!("{header}.{payload}.signature")
}
