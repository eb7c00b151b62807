use serde::{Deserialize, Serialize};

/// Request-scoped authenticated identity: the subject claim extracted from a
/// verified session token. Lives only for the duration of one request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
}

impl Principal {
    pub fn new<S: Into<String>>(user_id: S) -> Self {
        Principal { user_id: user_id.into() }
    }
}
