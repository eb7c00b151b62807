//! Session token service tests: round-trip, cross-secret rejection, payload
//! tampering, algorithm pinning and the configurable expiry behavior.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use lectern::error::AppError;
use lectern::identity::{Claims, TokenService};

const SECRET: &str = "per_test_secret";

#[test]
fn round_trip_yields_the_subject() {
    let svc = TokenService::new(SECRET, None);
    let token = svc.issue("64a1f0d2c3b4a5968778695a").expect("issue");
    let principal = svc.verify(&token).expect("verify");
    assert_eq!(principal.user_id, "64a1f0d2c3b4a5968778695a");
}

#[test]
fn token_signed_with_a_different_secret_is_rejected() {
    let token = TokenService::new("other_secret", None)
        .issue("u1")
        .expect("issue");
    let err = TokenService::new(SECRET, None).verify(&token).unwrap_err();
    assert_eq!(err, AppError::Unauthenticated);
}

#[test]
fn tampered_payload_is_rejected() {
    let svc = TokenService::new(SECRET, None);
    let token = svc.issue("u1").expect("issue");
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    assert_eq!(parts.len(), 3);
    // flip one character in the payload segment
    let mut payload: Vec<u8> = parts[1].clone().into_bytes();
    payload[0] = if payload[0] == b'A' { b'B' } else { b'A' };
    parts[1] = String::from_utf8(payload).unwrap();
    let tampered = parts.join(".");
    assert!(svc.verify(&tampered).is_err());
}

#[test]
fn foreign_algorithm_is_rejected_even_under_the_same_secret() {
    let claims = Claims {
        sub: "u1".into(),
        iat: Utc::now().timestamp(),
        exp: None,
    };
    let token = encode(
        &Header::new(Algorithm::HS384),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("encode");
    let err = TokenService::new(SECRET, None).verify(&token).unwrap_err();
    assert_eq!(err, AppError::Unauthenticated);
}

#[test]
fn malformed_tokens_are_rejected() {
    let svc = TokenService::new(SECRET, None);
    assert!(svc.verify("").is_err());
    assert!(svc.verify("not-a-token").is_err());
    assert!(svc.verify("a.b.c").is_err());
}

#[test]
fn ttl_adds_an_expiry_claim_and_enforces_it() {
    let svc = TokenService::new(SECRET, Some(Duration::from_secs(3600)));

    // A freshly issued token verifies.
    let fresh = svc.issue("u1").expect("issue");
    assert!(svc.verify(&fresh).is_ok());

    // A token that expired well past the default leeway is rejected.
    let now = Utc::now().timestamp();
    let stale_claims = Claims {
        sub: "u1".into(),
        iat: now - 7200,
        exp: Some((now - 3600) as u64),
    };
    let stale = encode(
        &Header::new(Algorithm::HS256),
        &stale_claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("encode");
    assert!(svc.verify(&stale).is_err());

    // A token without an expiry claim is rejected once a TTL is configured.
    let bare = TokenService::new(SECRET, None).issue("u1").expect("issue");
    assert!(svc.verify(&bare).is_err());
}

#[test]
fn tokens_without_ttl_do_not_expire() {
    let svc = TokenService::new(SECRET, None);
    let now = Utc::now().timestamp();
    let old_claims = Claims {
        sub: "u1".into(),
        iat: now - 86_400 * 365,
        exp: None,
    };
    let old = encode(
        &Header::new(Algorithm::HS256),
        &old_claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("encode");
    assert!(svc.verify(&old).is_ok());
}
