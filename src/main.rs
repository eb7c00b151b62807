use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use lectern::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let config = Config::from_env();
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "lectern",
        "lectern starting: RUST_LOG='{}', http_port={}, token_ttl={:?}",
        rust_log, config.http_port, config.token_ttl
    );

    lectern::server::run_with_config(config).await
}
