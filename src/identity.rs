//! # Identity Resolution Module
//!
//! ## Purpose
//! Derives a caller identity from an upstream-issued bearer token. The token
//! is verified against a shared symmetric secret and parsed for its subject
//! claim; nothing beyond that is asserted at this layer.
//!
//! ## Input/Output Specification
//! - **Input**: The optional `Authorization` header value
//! - **Output**: `Some(CallerIdentity)` on a parseable token, `None` otherwise
//! - **Policy**: Fail open — a missing or malformed token never blocks the
//!   request, it only leaves the caller unresolved
//!
//! ## Key Features
//! - HS256 verification with a static shared secret
//! - Parse failures are logged at debug level and downgraded to "no identity"
//! - Numeric id and role are never populated here; they are not derivable
//!   from the token payload and must be re-resolved downstream if needed

use crate::config::AuthConfig;
use crate::errors::{DocumentError, Result};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// The subject derived from a bearer token.
///
/// Presence of an identity does not imply verified authorization, and its
/// absence does not imply a public caller; downstream policy decides both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// Subject claim of the token
    pub username: String,
    /// Not derivable from the token payload; always None at this layer
    pub user_id: Option<u64>,
    /// Not derivable from the token payload; always None at this layer
    pub role: Option<String>,
}

/// Claims this service reads from the token payload
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject (username)
    sub: String,
    /// Expiry, seconds since the epoch
    exp: usize,
}

/// Resolves bearer tokens into caller identities
pub struct IdentityResolver {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl IdentityResolver {
    /// Create a resolver for the configured shared secret
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Resolve the `Authorization` header into a caller identity.
    ///
    /// Absent header, missing `Bearer ` prefix, and every parse or
    /// verification failure all resolve to `None`; the request proceeds
    /// unauthenticated either way.
    pub fn resolve(&self, auth_header: Option<&str>) -> Option<CallerIdentity> {
        let header = auth_header?;
        let token = header.strip_prefix("Bearer ")?.trim();

        match self.parse_token(token) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::debug!("Bearer token rejected, continuing unauthenticated: {}", e);
                None
            }
        }
    }

    /// Verify and decode a token into an identity
    fn parse_token(&self, token: &str) -> Result<CallerIdentity> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            DocumentError::TokenParseFailure {
                reason: e.to_string(),
            }
        })?;

        if data.claims.sub.is_empty() {
            return Err(DocumentError::TokenParseFailure {
                reason: "Token has an empty subject claim".to_string(),
            });
        }

        Ok(CallerIdentity {
            username: data.claims.sub,
            user_id: None,
            role: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &str = "jwt.myVerySecureSecretKeyThatIsAtLeast32CharactersLongForHS256Algorithm";

    fn resolver() -> IdentityResolver {
        IdentityResolver::new(&AuthConfig {
            jwt_secret: SECRET.to_string(),
            leeway_seconds: 60,
        })
    }

    fn token_for(sub: &str, secret: &str, exp_offset_secs: i64) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        let claims = Claims {
            sub: sub.to_string(),
            exp: (now + exp_offset_secs) as usize,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_resolves_username_only() {
        let token = token_for("alice", SECRET, 3600);
        let identity = resolver()
            .resolve(Some(&format!("Bearer {}", token)))
            .unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.user_id, None);
        assert_eq!(identity.role, None);
    }

    #[test]
    fn test_absent_header_resolves_to_none() {
        assert_eq!(resolver().resolve(None), None);
    }

    #[test]
    fn test_missing_bearer_prefix_resolves_to_none() {
        let token = token_for("alice", SECRET, 3600);
        assert_eq!(resolver().resolve(Some(&token)), None);
        assert_eq!(resolver().resolve(Some("Basic dXNlcjpwdw==")), None);
    }

    #[test]
    fn test_garbage_token_resolves_to_none() {
        assert_eq!(resolver().resolve(Some("Bearer not.a.token")), None);
        assert_eq!(resolver().resolve(Some("Bearer ")), None);
    }

    #[test]
    fn test_wrong_signature_resolves_to_none() {
        let token = token_for(
            "alice",
            "aDifferentSecretThatIsAlsoAtLeast32CharactersLong!",
            3600,
        );
        assert_eq!(resolver().resolve(Some(&format!("Bearer {}", token))), None);
    }

    #[test]
    fn test_expired_token_resolves_to_none() {
        let token = token_for("alice", SECRET, -7200);
        assert_eq!(resolver().resolve(Some(&format!("Bearer {}", token))), None);
    }

    #[test]
    fn test_empty_subject_resolves_to_none() {
        let token = token_for("", SECRET, 3600);
        assert_eq!(resolver().resolve(Some(&format!("Bearer {}", token))), None);
    }
}
