//! Structured logging setup.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from `LOG_LEVEL`
//! (default `info`). `LOG_FORMAT=json` switches to one JSON object per line.
//! Logs go to stderr; stdout carries only command output.

use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt};

/// Fallback log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable selecting the level when `RUST_LOG` is absent
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

/// Environment variable selecting the output format (`text` or `json`)
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install the global subscriber; later calls are no-ops
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let level = std::env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
        let json = std::env::var(ENV_LOG_FORMAT)
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let builder = fmt()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .with_env_filter(filter)
            .with_target(false)
            .with_file(true)
            .with_line_number(true);

        // A subscriber may already be installed (tests, embedding); keep it.
        let installed = if json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        if installed.is_err() {
            tracing::debug!("global tracing subscriber already set, keeping it");
        }
    });
}
