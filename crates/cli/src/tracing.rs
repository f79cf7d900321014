//! Tracing configuration for the ocirel CLI
//!
//! Events go to stderr, tagged with a per-process correlation ID. The level
//! applies to ocirel's own crates and the registry client; `RUST_LOG` takes
//! precedence when set.

use std::io;
use std::sync::OnceLock;
pub use tracing::Level;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Crates whose events pass the level filter.
const LOG_TARGETS: &[&str] = &["ocirel", "ocirel_oci", "ocirel_metadata", "oci_distribution"];

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TracingFormat {
    /// Multi-line, indented
    Pretty,
    /// One line per event
    #[default]
    Compact,
    /// One JSON object per event, with span context
    Json,
    /// Full format with source file and line
    Dev,
}

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Show all logs (trace level)
    Trace,
    /// Show debug and above
    Debug,
    /// Show info and above (default)
    Info,
    /// Show warnings and above
    Warn,
    /// Show errors only
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Subscriber settings chosen on the command line.
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    /// Output format.
    pub format: TracingFormat,
    /// Minimum level for ocirel targets.
    pub level: Level,
}

static CORRELATION_ID: OnceLock<Uuid> = OnceLock::new();

/// Correlation ID shared by every span of this process.
pub fn correlation_id() -> Uuid {
    *CORRELATION_ID.get_or_init(Uuid::new_v4)
}

/// Build the filter directive for `level` across ocirel targets.
#[must_use]
pub fn default_directive(level: Level) -> String {
    let level_str = level.as_str().to_lowercase();
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level_str}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// The stderr formatting layer for `format`.
fn fmt_layer<S>(format: TracingFormat) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
    match format {
        TracingFormat::Pretty => layer.pretty().with_target(true).boxed(),
        TracingFormat::Compact => layer.compact().with_target(false).boxed(),
        TracingFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        TracingFormat::Dev => layer
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .boxed(),
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if `RUST_LOG` and the fallback directive are both
/// invalid, or a global subscriber is already installed.
pub fn init_tracing(config: TracingConfig) -> miette::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(config.level)))
        .map_err(|e| miette::miette!("Failed to create tracing filter: {e}"))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer(config.format))
        .try_init()
        .map_err(|e| miette::miette!("Failed to install tracing subscriber: {e}"))?;

    tracing::debug!(
        correlation_id = %correlation_id(),
        version = env!("CARGO_PKG_VERSION"),
        format = ?config.format,
        level = %config.level,
        "Tracing initialized"
    );
    Ok(())
}

/// Span wrapping one command, carrying the correlation ID.
#[macro_export]
macro_rules! command_span {
    ($command:expr) => {
        tracing::info_span!(
            "command",
            command = %$command,
            correlation_id = %$crate::tracing::correlation_id(),
            start_time = %chrono::Utc::now().to_rfc3339(),
        )
    };
}
