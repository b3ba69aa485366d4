//! Suite orchestration: preflight, scenario construction and sequential
//! execution over the enabled environments.

use std::path::Path;
use std::sync::Arc;

use adash_core::config::AdashConfig;
use adash_core::environment::EnvironmentConfig;
use adash_core::report::SuiteReport;
use adash_core::scenario::{Scenario, run_scenario};

use crate::context::RegressionContext;
use crate::infra::Infrastructure;
use crate::steps::{
    ChangeToMountedDir, CleanupCluster, DeleteChi, DeleteOperator, DeployChi, DeployOperator,
    OpenBrowser, OpenDashboard, OpenVmShell, ProvisionVm, StartCluster, StartDashboard,
    VerifyChi, VerifyChiRemoved, VerifyOperator, VerifyOperatorRemoved, WaitClusterReady,
};

/// Report attribute holding `<webdriver> --version`.
pub const WEBDRIVER_VERSION: &str = "webdriver.version";

/// Report attribute holding `vboxmanage --version`.
pub const VIRTUALBOX_VERSION: &str = "virtualbox.version";

/// VirtualBox management CLI probed during preflight.
pub const VBOXMANAGE: &str = "vboxmanage";

/// Build the dashboard scenario for one environment.
///
/// The step list is identical for every environment; the context's
/// environment entry supplies the per-distribution commands.
pub fn dashboard_scenario(env: &EnvironmentConfig) -> Scenario<RegressionContext> {
    Scenario::new(env.title.clone())
        .step(ProvisionVm)
        .step(OpenVmShell)
        .step(ChangeToMountedDir)
        .step(StartCluster)
        .step(WaitClusterReady)
        .step(StartDashboard)
        .step(OpenBrowser)
        .step(OpenDashboard)
        .step(DeployOperator)
        .step(VerifyOperator)
        .step(DeployChi)
        .step(VerifyChi)
        .step(DeleteChi)
        .step(VerifyChiRemoved)
        .step(DeleteOperator)
        .step(VerifyOperatorRemoved)
        .step(CleanupCluster)
}

/// Runs one scenario per enabled environment, one at a time.
pub struct RegressionSuite {
    config: Arc<AdashConfig>,
    infra: Arc<dyn Infrastructure>,
}

impl RegressionSuite {
    pub fn new(config: AdashConfig, infra: Arc<dyn Infrastructure>) -> Self {
        Self {
            config: Arc::new(config),
            infra,
        }
    }

    /// Record tool versions as report attributes.
    ///
    /// A missing tool does not stop the suite; the attribute is recorded as
    /// unavailable and the scenarios report the real failure later.
    pub async fn preflight(&self, report: &mut SuiteReport) {
        let webdriver = self.config.browser.webdriver_path.clone();
        self.record_version(report, WEBDRIVER_VERSION, &webdriver)
            .await;
        self.record_version(report, VIRTUALBOX_VERSION, Path::new(VBOXMANAGE))
            .await;
    }

    async fn record_version(&self, report: &mut SuiteReport, attribute: &str, program: &Path) {
        match self.infra.tool_version(program).await {
            Ok(version) => {
                tracing::info!(attribute, version = %version, "tool version");
                report.attribute(attribute, version);
            }
            Err(e) => {
                tracing::warn!(
                    attribute,
                    program = %program.display(),
                    error = %e,
                    "tool version unavailable"
                );
                report.attribute(attribute, format!("unavailable: {e}"));
            }
        }
    }

    /// Run preflight and every enabled environment's scenario.
    ///
    /// A failing scenario never stops the ones after it.
    pub async fn run(&self) -> SuiteReport {
        let mut report = SuiteReport::new();
        self.preflight(&mut report).await;

        let envs: Vec<EnvironmentConfig> = self.config.enabled_environments().cloned().collect();
        tracing::info!(environments = envs.len(), "starting regression suite");

        for env in envs {
            let scenario = dashboard_scenario(&env);
            let env_name = env.name.clone();
            let mut ctx =
                RegressionContext::new(Arc::clone(&self.config), env, Arc::clone(&self.infra));
            let outcome = run_scenario(&scenario, &mut ctx).await;
            tracing::info!(env = %env_name, status = %outcome.status, "environment finished");
            report.record(outcome);
        }

        tracing::info!(
            passed = report.passed_count(),
            failed = report.failed_count(),
            "regression suite finished"
        );
        report
    }
}
