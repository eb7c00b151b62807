//! Stateless signed session tokens. A token binds a subject (user id) and an
//! issuance timestamp under a process-wide secret; validity is computed from
//! the signature, never looked up. There is no server-side revocation —
//! sign-out is client-side cookie removal only.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::principal::Principal;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user identifier.
    pub sub: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, present only when a session TTL is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// Issues and verifies session tokens with an injected secret, pinned to
/// HS256. Constructed once at startup and shared read-only across requests.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Option<Duration>,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Option<Duration>) -> Self {
        // Pinning the algorithm list rejects tokens signed under any other
        // scheme, including ones re-signed with the same secret.
        let mut validation = Validation::new(Algorithm::HS256);
        if ttl.is_some() {
            validation.set_required_spec_claims(&["exp"]);
        } else {
            let none: [&str; 0] = [];
            validation.set_required_spec_claims(&none);
        }
        TokenService {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Sign a token for the given subject at the current time.
    pub fn issue(&self, subject: &str) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: self.ttl.map(|d| (now as u64).saturating_add(d.as_secs())),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::internal(e.to_string()))
    }

    /// Validate signature, algorithm and claims; yield the subject. Every
    /// failure collapses to `Unauthenticated` — callers never learn whether
    /// the token was malformed, mis-signed or expired.
    pub fn verify(&self, token: &str) -> AppResult<Principal> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| AppError::Unauthenticated)?;
        Ok(Principal::new(data.claims.sub))
    }
}
