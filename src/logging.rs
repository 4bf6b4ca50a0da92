// Logging module — powered by tracing-subscriber
//
// The library crates log through the `log` macros; tracing-subscriber's
// log compatibility layer (installed by `try_init`) routes those records
// through the subscriber alongside native tracing events.

use std::fs::OpenOptions;
use tablesync_server::config::LoggingSettings;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Build the `EnvFilter` from the base level plus hardcoded noisy-crate
/// overrides.
fn build_env_filter(level: &str) -> anyhow::Result<EnvFilter> {
    let mut directives = vec![level.to_string()];
    let noisy: &[(&str, &str)] = &[("actix_server", "warn"), ("actix_web", "warn"), ("h2", "warn")];
    for (target, lvl) in noisy {
        directives.push(format!("{}={}", target, lvl));
    }
    let filter_str = directives.join(",");
    EnvFilter::try_new(&filter_str)
        .map_err(|e| anyhow::anyhow!("invalid tracing filter '{}': {}", filter_str, e))
}

/// Initialize logging based on configuration.
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    let filter = build_env_filter(&settings.level)?;
    let json = settings.format.eq_ignore_ascii_case("json");

    let console_layer = if settings.log_to_console {
        let layer = tracing_subscriber::fmt::layer().with_target(true);
        let layer = if json { layer.json().boxed() } else { layer.boxed() };
        Some(layer)
    } else {
        None
    };

    let file_layer = match &settings.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Arc::new(file));
            let layer = if json { layer.json().boxed() } else { layer.boxed() };
            Some(layer)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;
    Ok(())
}
