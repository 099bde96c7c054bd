use std::path::Path;

use color_eyre::{eyre::eyre, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Variable holding the file log filter, e.g. `RMDEX_LOG=rmdex=debug`
const LOG_ENV: &str = "RMDEX_LOG";
const LOG_FILE_PREFIX: &str = "rmdex.log";

/// Logs to a daily rolling file under `logs_dir` plus warnings and errors on `stderr`.
pub fn init_logger(logs_dir: &Path) -> Result<()> {
  std::fs::create_dir_all(logs_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", logs_dir.display(), e))?;

  let file_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
  let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
  let file_layer = tracing_subscriber::fmt::layer()
    .with_ansi(false)
    .with_writer(appender)
    .with_filter(file_filter);

  let stderr_layer = tracing_subscriber::fmt::layer()
    .with_writer(std::io::stderr)
    .with_target(false)
    .with_filter(EnvFilter::new("warn"));

  tracing_subscriber::registry()
    .with(file_layer)
    .with(stderr_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))
}
