// TableSync server entrypoint
//!
//! The heavy lifting (context construction, route wiring) lives in the
//! library modules so this file remains a thin orchestrator.

use anyhow::Result;
use log::info;
use tablesync_server::bootstrap;
use tablesync_server::config::ServerConfig;

mod logging;

#[actix_web::main]
async fn main() -> Result<()> {
    let config_path =
        std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = ServerConfig::from_file(&config_path)?;

    // logging before any other side effects
    logging::init_logging(&config.logging)?;

    info!(
        "TableSync server v{} (commit {}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_DATE")
    );

    let ctx = bootstrap::build_context();
    bootstrap::run(config, ctx).await
}
