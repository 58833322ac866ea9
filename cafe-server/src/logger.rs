//! Logging Infrastructure
//!
//! Structured logging setup with optional JSON output and a daily rolling file.

use std::path::Path;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "cafe_server=info,tower_http=info";

/// Initialize the logger.
///
/// `RUST_LOG` wins over `log_level`; both fall back to [`DEFAULT_FILTER`].
/// When `log_dir` exists, output goes to a daily rolling `cafe-server` file.
pub fn init_logger(log_level: Option<&str>, json: bool, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| match log_level {
            Some(level) => EnvFilter::try_new(level),
            None => EnvFilter::try_new(DEFAULT_FILTER),
        })
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false);

    let file_dir = log_dir
        .map(Path::new)
        .filter(|p| p.exists())
        .and_then(|p| p.to_str());

    match (file_dir, json) {
        (Some(dir), true) => builder
            .json()
            .with_writer(tracing_appender::rolling::daily(dir, "cafe-server"))
            .init(),
        (Some(dir), false) => builder
            .with_ansi(false)
            .with_writer(tracing_appender::rolling::daily(dir, "cafe-server"))
            .init(),
        (None, true) => builder.json().init(),
        (None, false) => builder.init(),
    }
}
