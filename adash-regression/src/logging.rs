//! Logging initialization for adash-regression.
//!
//! Logs and the suite report travel on separate streams: every tracing
//! event goes to **stderr**, while the report rendered by
//! [`OutputWriter`](crate::output::OutputWriter) is the only thing written
//! to **stdout**. `adash-regression > report.json` therefore captures a
//! clean report even with `log_format = "json"`.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from
//! `general.log_level`. HTTP client internals (`reqwest`, `hyper`) are
//! capped at `warn` in the config-derived filter since every WebDriver
//! poll would otherwise log several lines.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use adash_core::config::GeneralConfig;

/// Directives appended to `general.log_level`.
const QUIET_DEPENDENCIES: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn"];

/// Initialize the global tracing subscriber.
///
/// Must be called once, before the first scenario starts.
///
/// # Formats
///
/// * `"json"` - JSON lines, one object per event (for CI log collection)
/// * `"pretty"` - Human-readable multi-line output (for local runs)
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => config_filter(&config.log_level)?,
    };

    let (json, pretty) = match config.log_format.as_str() {
        "json" => (
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
            None,
        ),
        "pretty" => (
            None,
            Some(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr)),
        ),
        other => {
            anyhow::bail!("unknown log format '{other}', expected 'json' or 'pretty'");
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init()
        .with_context(|| format!("failed to initialize {} tracing subscriber", config.log_format))
}

/// `general.log_level` plus the dependency caps.
fn config_filter(level: &str) -> Result<EnvFilter> {
    let directives = std::iter::once(level)
        .chain(QUIET_DEPENDENCIES.iter().copied())
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_new(&directives).with_context(|| format!("invalid log filter '{directives}'"))
}
