//! Server bootstrap: shared state construction and the HTTP server loop.

use crate::config::ServerConfig;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use log::info;
use std::sync::Arc;
use tablesync_api::routes::configure_routes;
use tablesync_core::AppContext;
use tablesync_store::InMemoryBackend;

/// Builds the shared application context.
///
/// The bundled backend is in-memory; a durable engine plugs in by handing
/// `AppContext::new` a different `StorageBackend`.
pub fn build_context() -> Arc<AppContext> {
    Arc::new(AppContext::new(Arc::new(InMemoryBackend::new())))
}

/// Runs the HTTP server until shutdown.
pub async fn run(config: ServerConfig, ctx: Arc<AppContext>) -> Result<()> {
    let bind_addr = (config.server.host.clone(), config.server.port);
    info!("listening on {}:{}", config.server.host, config.server.port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(ctx.clone()))
            .configure(configure_routes)
    })
    .workers(config.server.workers)
    .bind(bind_addr)?
    .run()
    .await?;
    Ok(())
}
