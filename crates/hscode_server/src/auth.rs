//! Bearer token authentication.
//!
//! Configured tokens are kept only as SHA-256 digests; presented tokens are
//! hashed and compared digest to digest.

use crate::error::{ServerError, ServerResult};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const BEARER_SCHEME: &str = "bearer";

/// Validates `Authorization: Bearer <token>` headers against one token.
#[derive(Clone)]
pub struct TokenValidator {
    realm: &'static str,
    digest: Option<[u8; 32]>,
}

impl TokenValidator {
    /// Creates a validator. Without a token every request is rejected.
    pub fn new(realm: &'static str, token: Option<&str>) -> Self {
        Self {
            realm,
            digest: token.map(digest),
        }
    }

    /// Returns true if a token is configured.
    pub fn is_enabled(&self) -> bool {
        self.digest.is_some()
    }

    /// Checks an `Authorization` header value.
    pub fn validate(&self, authorization: Option<&str>) -> ServerResult<()> {
        let Some(expected) = &self.digest else {
            return Err(ServerError::NotAuthorized(format!(
                "{} endpoint is disabled",
                self.realm
            )));
        };

        let header = authorization
            .map(str::trim)
            .filter(|header| !header.is_empty())
            .ok_or_else(|| ServerError::AuthenticationFailed("missing bearer token".into()))?;
        let token = bearer_token(header).ok_or_else(|| {
            ServerError::AuthenticationFailed("expected a bearer token".into())
        })?;

        if bool::from(digest(token)[..].ct_eq(&expected[..])) {
            Ok(())
        } else {
            Err(ServerError::NotAuthorized(format!(
                "invalid {} token",
                self.realm
            )))
        }
    }
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("realm", &self.realm)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case(BEARER_SCHEME) && !token.is_empty()).then_some(token)
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}
