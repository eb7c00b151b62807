//! Unified application error model and mapping helpers.
//! This module provides a common error enum used across the HTTP surface and
//! the identity/credential modules, along with the HTTP mapping. User-facing
//! messages are fixed strings so clients can branch on them.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// Field-level input rejection (password policy, schema constraints).
    Validation { message: String },
    /// Sign-in email is not registered.
    PrincipalNotFound,
    /// Sign-in password does not verify against the stored credential.
    CredentialMismatch,
    /// Missing, malformed, expired or mis-signed session token.
    Unauthenticated,
    /// Authenticated but not entitled to act on the target resource.
    Forbidden,
    /// A path-addressed resource failed to resolve before authorization.
    Resolution { message: String },
    /// A read-path entity lookup came up empty.
    NotFound { message: String },
    /// Unexpected storage failure; surfaced as a generic 400.
    Internal { message: String },
}

impl AppError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        AppError::Validation { message: msg.into() }
    }
    pub fn resolution<S: Into<String>>(msg: S) -> Self {
        AppError::Resolution { message: msg.into() }
    }
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        AppError::NotFound { message: msg.into() }
    }
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        AppError::Internal { message: msg.into() }
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_failed",
            AppError::PrincipalNotFound => "principal_not_found",
            AppError::CredentialMismatch => "credential_mismatch",
            AppError::Unauthenticated => "unauthenticated",
            AppError::Forbidden => "forbidden",
            AppError::Resolution { .. } => "resolution_failed",
            AppError::NotFound { .. } => "not_found",
            AppError::Internal { .. } => "internal",
        }
    }

    /// The fixed, user-visible message for this error.
    pub fn message(&self) -> &str {
        match self {
            AppError::Validation { message }
            | AppError::Resolution { message }
            | AppError::NotFound { message }
            | AppError::Internal { message } => message.as_str(),
            AppError::PrincipalNotFound => "User not found.",
            AppError::CredentialMismatch => "Email and password don't match.",
            AppError::Unauthenticated => "Please sign-in.",
            AppError::Forbidden => "User is not authorized.",
        }
    }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::PrincipalNotFound => StatusCode::UNAUTHORIZED,
            AppError::CredentialMismatch => StatusCode::UNAUTHORIZED,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Resolution { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message() });
        (self.http_status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(AppError::validation("short").http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::PrincipalNotFound.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::CredentialMismatch.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Unauthenticated.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::resolution("gone").http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::not_found("missing").http_status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::internal("boom").http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn fixed_messages_are_stable() {
        assert_eq!(AppError::PrincipalNotFound.message(), "User not found.");
        assert_eq!(AppError::CredentialMismatch.message(), "Email and password don't match.");
        assert_eq!(AppError::Unauthenticated.message(), "Please sign-in.");
        assert_eq!(AppError::Forbidden.message(), "User is not authorized.");
    }
}
