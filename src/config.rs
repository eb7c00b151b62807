//! Process configuration, read once from the environment at startup and
//! injected explicitly. The signing secret is read-only after startup.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub jwt_secret: String,
    /// Session TTL. When set, issued tokens carry an expiry claim and
    /// verification enforces it; when unset, tokens do not expire.
    pub token_ttl: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Config {
        let http_port = std::env::var("LECTERN_HTTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);
        let jwt_secret =
            std::env::var("LECTERN_JWT_SECRET").unwrap_or_else(|_| "any_secret_key".to_string());
        let token_ttl = std::env::var("LECTERN_TOKEN_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        Config {
            http_port,
            jwt_secret,
            token_ttl,
        }
    }
}
