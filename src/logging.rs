use tracing_subscriber::EnvFilter;

use crate::error::{Result, ToolError};

/// Installs the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set. Otherwise `verbosity` picks the level:
/// 0 is `warn`, 1 is `info`, 2 or more is `debug`.
pub fn init(verbosity: u8) -> Result<()> {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|err| ToolError::Logging(err.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ToolError::Logging(err.to_string()))
}
