//! Password credential lifecycle: salting, key derivation, strength policy
//! and verification. Derivation is PBKDF2-HMAC-SHA512 over a per-user random
//! salt; the plaintext password is never stored or logged.

use serde::{Deserialize, Serialize};
use sha2::Sha512;
use subtle::ConstantTimeEq;

use crate::error::{AppError, AppResult};

pub const SALT_BYTES: usize = 16;
pub const ITERATIONS: u32 = 10_000;
pub const KEY_LENGTH: usize = 512;

pub const PASSWORD_MIN_CHARS: usize = 12;
pub const PASSWORD_MAX_CHARS: usize = 36;

/// A stored credential: hex-encoded salt plus hex-encoded derived key.
/// Immutable once created; replaced wholesale on password change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub salt: String,
    pub derived_key: String,
}

impl Credential {
    /// Validate the password against the strength policy, then mint a fresh
    /// salt and derive the key. A rejected password produces no credential.
    pub fn create(password: &str) -> AppResult<Credential> {
        validate_password(password)?;
        let salt = generate_salt()?;
        let derived_key = derive(password, &salt);
        Ok(Credential { salt, derived_key })
    }
}

/// Length policy applied exactly once, at credential-creation time.
pub fn validate_password(password: &str) -> AppResult<()> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_CHARS {
        return Err(AppError::validation(format!(
            "Password must be at least {} characters.",
            PASSWORD_MIN_CHARS
        )));
    }
    if len > PASSWORD_MAX_CHARS {
        return Err(AppError::validation(format!(
            "Password must be at most {} characters.",
            PASSWORD_MAX_CHARS
        )));
    }
    Ok(())
}

/// Produce a fresh random salt from the CSPRNG, hex-encoded.
pub fn generate_salt() -> AppResult<String> {
    let mut bytes = [0u8; SALT_BYTES];
    getrandom::getrandom(&mut bytes).map_err(|e| AppError::internal(e.to_string()))?;
    Ok(to_hex(&bytes))
}

/// Deterministic key derivation over (password, salt). The salt is mixed in
/// as the bytes of its hex encoding, so the same pair always yields the same
/// key regardless of where the credential was minted.
pub fn derive(password: &str, salt: &str) -> String {
    let mut key = vec![0u8; KEY_LENGTH];
    pbkdf2::pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), ITERATIONS, &mut key);
    to_hex(&key)
}

/// Constant-time check of a submitted password against a stored credential.
pub fn verify(password: &str, credential: &Credential) -> bool {
    let candidate = derive(password, &credential.salt);
    candidate
        .as_bytes()
        .ct_eq(credential.derived_key.as_bytes())
        .into()
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salt_is_fixed_length_hex() {
        let salt = generate_salt().unwrap();
        assert_eq!(salt.len(), SALT_BYTES * 2);
        assert!(salt.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn derived_key_is_fixed_length_hex() {
        let key = derive("correct horse battery", "00112233445566778899aabbccddeeff");
        assert_eq!(key.len(), KEY_LENGTH * 2);
    }
}
