//! # Structured Logging
//!
//! One `tracing` subscriber for the whole process, filtered per target:
//!
//! - `linkchain_protocol` logs every accepted block at `debug` and every
//!   rejected append or replacement at `warn`.
//! - `linkchain_node` logs writes, replacements and startup at `info`, and
//!   dumps the full chain at `debug` after each change.
//! - `tower_http` emits one span per HTTP request.
//!
//! Output goes to stderr, leaving stdout to the `version` subcommand.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset. Set
/// `RUST_LOG=linkchain_node=debug` to see the chain after every write.
pub const DEFAULT_FILTER: &str = "linkchain_node=info,linkchain_protocol=info,tower_http=debug";

/// Log line encoding, chosen with `--log-format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Colored, multi-field lines with file and line number.
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// `"json"` in any case selects [`LogFormat::Json`]; anything else is
    /// [`LogFormat::Pretty`].
    pub fn from_str_lossy(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(default_filter: &str, format: LogFormat) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
    }

    tracing::debug!(?format, "logging initialized");
    Ok(())
}
