//! Observability setup for processes hosting cmdforge handlers.
//!
//! Logs always go to stderr: a stdio protocol transport owns stdout.

#![warn(missing_docs, clippy::pedantic)]

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Result alias for telemetry setup.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Errors raised while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Neither `RUST_LOG` nor the fallback produced a usable filter.
    #[error("invalid log filter `{directive}`: {reason}")]
    InvalidFilter {
        /// The rejected directive.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("tracing subscriber already installed: {reason}")]
    AlreadyInstalled {
        /// Message from `tracing-subscriber`.
        reason: String,
    },
}

/// Builds the log filter from `RUST_LOG`, falling back to `default_directive`
/// when the variable is unset or unparsable.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when the fallback is unusable.
pub fn env_filter(default_directive: &str) -> TelemetryResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_directive).map_err(|err| TelemetryError::InvalidFilter {
        directive: default_directive.to_owned(),
        reason: err.to_string(),
    })
}

/// Installs a stderr `fmt` subscriber filtered by [`env_filter`].
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for a bad fallback directive and
/// [`TelemetryError::AlreadyInstalled`] when another subscriber owns the
/// process.
pub fn try_init_tracing(default_directive: &str) -> TelemetryResult<()> {
    let filter = env_filter(default_directive)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|err| TelemetryError::AlreadyInstalled {
            reason: err.to_string(),
        })
}

/// Installs the stderr subscriber, ignoring the case where one is already
/// present.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for a bad fallback directive.
pub fn init_tracing(default_directive: &str) -> TelemetryResult<()> {
    match try_init_tracing(default_directive) {
        Err(TelemetryError::AlreadyInstalled { .. }) | Ok(()) => Ok(()),
        Err(err) => Err(err),
    }
}
