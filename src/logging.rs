//! Structured logging for the command-line tool.
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! binary's job. Logs go to stderr so command output on stdout stays clean.

use tracing::warn;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `--log-level` nor `RUST_LOG` is set.
pub const DEFAULT_LEVEL: &str = "warn";

/// Installs the global subscriber.
///
/// An explicit `level` wins over `RUST_LOG`. A level that does not parse
/// falls back to [`DEFAULT_LEVEL`] with a warning. Calling this twice is a
/// no-op.
pub fn init_logging(level: Option<&str>) {
    let requested = level.map(EnvFilter::try_new);
    let (env_filter, rejected) = match requested {
        Some(Ok(filter)) => (filter, None),
        Some(Err(err)) => (EnvFilter::new(DEFAULT_LEVEL), Some(err)),
        None => (
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL)),
            None,
        ),
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    if Registry::default()
        .with(env_filter)
        .with(console_layer)
        .try_init()
        .is_err()
    {
        return;
    }

    if let Some(err) = rejected {
        warn!(%err, level, "invalid log level, using {DEFAULT_LEVEL}");
    }
}
