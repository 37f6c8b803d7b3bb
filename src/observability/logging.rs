use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console output plus daily-rotated JSON files under `log_dir`.
///
/// Hold the returned guard until exit; dropping it flushes the file writer.
pub fn init_logging(log_dir: &Path) -> WorkerGuard {
    let _ = fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::daily(log_dir, "osm_elevation.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    // Respect RUST_LOG if set; otherwise info for our crate, warnings elsewhere
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("osm_elevation=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}
