use clap::ValueEnum;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable multi-line output
    Pretty,
    /// Single line per event
    #[default]
    Compact,
    /// Structured JSON
    Json,
}

/// Installs the global subscriber, writing to stderr so that rendered
/// output stays clean.
///
/// Level is controlled via `RUST_LOG` [default: `warn`].
pub(crate) fn init(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Pretty => registry.with(fmt::layer().pretty().with_writer(std::io::stderr)).init(),
        LogFormat::Compact => registry.with(fmt::layer().compact().with_writer(std::io::stderr)).init(),
        LogFormat::Json => registry.with(fmt::layer().json().with_writer(std::io::stderr)).init(),
    }
}
