use anyhow::{anyhow, Context};
use tracing_subscriber::EnvFilter;

use crate::util::env::env_flag;

/// Installs the global subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Everything goes to stderr; stdout is reserved for the JSON the CLI prints.
/// Set `LOG_SOURCE_LOCATIONS=1` to include target, file and line.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .with_context(|| format!("invalid log filter '{default_filter}'"))?;
    let locations = env_flag("LOG_SOURCE_LOCATIONS", false);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(locations)
        .with_file(locations)
        .with_line_number(locations)
        .try_init()
        .map_err(|e| anyhow!("tracing subscriber already installed: {e}"))
}
