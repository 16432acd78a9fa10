//! Tracing subscriber setup.
//!
//! The console owns stdout, so log output goes to a file in the config
//! directory. `RUST_LOG` overrides the configured level.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::ConsoleError;

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Build a subscriber writing plain (non-ANSI) lines to `log_file`.
pub fn build_subscriber(
    log_file: File,
    default_level: &str,
) -> impl tracing::Subscriber + Send + Sync {
    let fmt_layer = fmt::layer().with_writer(Arc::new(log_file)).with_ansi(false);
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter(default_level))
}

/// Install the global subscriber logging to `console.log` under `app_config_dir`.
pub fn init_file_logging(app_config_dir: &Path, default_level: &str) -> Result<(), ConsoleError> {
    fs::create_dir_all(app_config_dir)?;
    let log_file = File::create(crate::paths::log_path(app_config_dir))?;
    build_subscriber(log_file, default_level)
        .try_init()
        .map_err(|e| ConsoleError::Io {
            message: format!("Failed to install log subscriber: {e}"),
        })
}

/// Install the global subscriber logging to stderr, for host processes whose
/// stdout carries the transport.
pub fn init_stderr_logging(default_level: &str) {
    let installed = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
        .with(env_filter(default_level))
        .try_init();
    if let Err(e) = installed {
        eprintln!("[demo-host] logging disabled: {e}");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_writes_to_the_log_file() {
        let dir = std::env::temp_dir().join("canvas_console_test_logging");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = crate::paths::log_path(&dir);
        let file = File::create(&path).unwrap();

        tracing::subscriber::with_default(build_subscriber(file, "debug"), || {
            tracing::warn!(request = "get-analytics", "host reply timed out");
            tracing::trace!("below the level");
        });

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("WARN"));
        assert!(contents.contains("host reply timed out"));
        assert!(!contents.contains("below the level"));
        let _ = fs::remove_dir_all(&dir);
    }
}
