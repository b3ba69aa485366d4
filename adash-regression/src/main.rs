//! adash-regression entry point.
//!
//! Loads `adash.toml` (path from `ADASH_CONFIG`), applies CLI flags,
//! initializes logging, runs every enabled environment and renders the
//! report. The exit code reflects the suite result.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use adash_core::config::AdashConfig;
use adash_regression::cli::RegressionCli;
use adash_regression::error::RegressionError;
use adash_regression::infra::LocalInfrastructure;
use adash_regression::logging::init_tracing;
use adash_regression::output::{OutputWriter, ReportFormat};
use adash_regression::suite::RegressionSuite;

/// Config path used when `ADASH_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "adash.toml";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = RegressionCli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("adash-regression: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: RegressionCli) -> Result<(), RegressionError> {
    let path = std::env::var("ADASH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
    let mut config = AdashConfig::load_or_default(&path).await?;

    // CLI 플래그가 파일/환경변수보다 우선
    cli.apply(&mut config);
    config.validate()?;

    init_tracing(&config.general).map_err(|e| RegressionError::Config(e.to_string()))?;
    tracing::info!(
        config = %path,
        browser = %config.browser.browser,
        local = config.browser.local,
        "adash-regression starting"
    );

    let writer = OutputWriter::new(ReportFormat::from_config(&config.general.report_format));
    let suite = RegressionSuite::new(config, Arc::new(LocalInfrastructure));
    let report = suite.run().await;

    writer.render(&report)?;

    if report.all_passed() {
        Ok(())
    } else {
        Err(RegressionError::ScenariosFailed {
            failed: report.failed_count(),
            total: report.outcomes.len(),
        })
    }
}
