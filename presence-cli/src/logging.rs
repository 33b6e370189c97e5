//! Logging setup

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commands::LogFormat;
use crate::error::{CliError, CliResult};

const VERBOSE_FILTER: &str = "presence=debug,presence_cli=debug,presence_sync=debug,presence_core=debug";
const DEFAULT_FILTER: &str = "info";

/// Filter used when RUST_LOG is not set
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    }
}

/// Install the global subscriber; RUST_LOG takes precedence over `verbose`
pub fn init_logging(format: LogFormat, verbose: bool) -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbose)))
        .map_err(|e| CliError::logging(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
    };

    result.map_err(|e| CliError::logging(e.to_string()))
}
