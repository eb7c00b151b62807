//! Sign-in flow: email lookup, credential verification, token issuance.
//! Lookup failure and password mismatch are reported as distinct errors with
//! fixed messages; the mismatch message deliberately does not say which of
//! the two fields was wrong.

use serde::{Deserialize, Serialize};

use super::token::TokenService;
use crate::error::{AppError, AppResult};
use crate::store::{self, SharedStore, User};

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// The public projection of a user returned at sign-in. Credential fields
/// are not part of this type at all.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub user: UserView,
}

/// Verify a submitted email/password pair and issue a session token.
///
/// The store lock is released before key derivation starts, so concurrent
/// sign-ins pay the derivation cost in parallel without contending.
pub fn sign_in(
    store: &SharedStore,
    tokens: &TokenService,
    req: &SignInRequest,
) -> AppResult<SignInResponse> {
    let user = store
        .0
        .read()
        .find_user_by_email(&req.email)
        .ok_or(AppError::PrincipalNotFound)?;
    if !store::password_matches(&user, &req.password) {
        return Err(AppError::CredentialMismatch);
    }
    let token = tokens.issue(&user.id)?;
    tracing::info!(user = %user.id, "auth.signin");
    Ok(SignInResponse {
        token,
        user: UserView::from(&user),
    })
}
