//! CLI argument definitions for adash-regression.
//!
//! Uses `clap` v4 derive macros. Every flag is optional and, when given,
//! overrides the value loaded from `adash.toml` and `ADASH_*` variables.

use std::path::PathBuf;

use clap::Parser;

use adash_core::config::AdashConfig;

/// Altinity Dashboard regression suite.
///
/// Provisions one Vagrant VM per Kubernetes distribution, starts the
/// dashboard inside it and drives the dashboard UI through WebDriver.
#[derive(Parser, Debug, Default)]
#[command(name = "adash-regression")]
#[command(version, about, long_about = None)]
pub struct RegressionCli {
    /// Path to the chromedriver binary used in local mode.
    #[arg(long)]
    pub webdriver: Option<PathBuf>,

    /// Browser name requested from the WebDriver endpoint.
    #[arg(long)]
    pub browser: Option<String>,

    /// Launch a local chromedriver instead of connecting to a Selenium hub.
    #[arg(long)]
    pub local: bool,

    /// Global wait time for UI interactions, in seconds.
    #[arg(short = 'g', long = "global_wait_time")]
    pub global_wait_time: Option<u64>,
}

impl RegressionCli {
    /// Apply the given flags on top of `config`.
    ///
    /// Flags take precedence over the config file and environment variables.
    /// `--local` only ever switches local mode on.
    pub fn apply(&self, config: &mut AdashConfig) {
        if let Some(path) = &self.webdriver {
            config.browser.webdriver_path = path.clone();
        }
        if let Some(browser) = &self.browser {
            config.browser.browser = browser.clone();
        }
        if self.local {
            config.browser.local = true;
        }
        if let Some(seconds) = self.global_wait_time {
            config.browser.global_wait_time = seconds;
        }
    }
}
