//! Authentication gate: extract a bearer credential from the request headers
//! and verify it. This runs first on every protected route; downstream
//! guards assume a populated identity.

use axum::http::HeaderMap;

use super::principal::Principal;
use super::token::TokenService;
use crate::error::{AppError, AppResult};

/// Cookie carrying the session token, path `/`.
pub const SESSION_COOKIE: &str = "t";

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie").or_else(|| headers.get("Cookie"))?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some(eq) = p.find('=') {
            let (k, v) = p.split_at(eq);
            if k == name {
                return Some(v[1..].to_string());
            }
        }
    }
    None
}

/// Pull the session token from `Authorization: Bearer <token>` or, failing
/// that, from the session cookie.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        if let Some(rest) = value.strip_prefix("Bearer ") {
            let token = rest.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    parse_cookie(headers, SESSION_COOKIE)
}

/// Authenticate the request or short-circuit with `Unauthenticated`.
pub fn authenticate(tokens: &TokenService, headers: &HeaderMap) -> AppResult<Principal> {
    let token = bearer_token(headers).ok_or(AppError::Unauthenticated)?;
    tokens.verify(&token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        headers.insert("cookie", HeaderValue::from_static("t=def"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_is_used_when_no_header() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("sid=1; t=def; other=x"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("def"));
    }

    #[test]
    fn missing_credential_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
    }
}
