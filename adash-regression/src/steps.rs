//! Steps of the dashboard scenario.
//!
//! Each step is a unit struct implementing [`Step<RegressionContext>`].
//! Environment-specific behavior (start command, kubectl invocation,
//! settle delay, cleanup) comes from the context's
//! [`EnvironmentConfig`](adash_core::environment::EnvironmentConfig), so
//! the same step list serves every distribution.
//!
//! Resource-acquiring steps ([`ProvisionVm`], [`OpenVmShell`],
//! [`StartDashboard`], [`OpenBrowser`]) report `acquires() == true`; the executor registers
//! their release before running them and unwinds releases in reverse.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use adash_core::error::{AdashError, EnvironmentError};
use adash_core::scenario::{BoxFuture, Step, StepRole};
use adash_shell::CommandOutput;
use adash_ui::{DashboardPage, UiDriver};

use crate::context::RegressionContext;
use crate::infra::{ChannelRequest, Infrastructure};

/// Pod name prefix of the ClickHouse operator deployment.
pub const OPERATOR_POD_PREFIX: &str = "clickhouse-operator";

/// CHI status reported once every replica is up.
pub const CHI_COMPLETED: &str = "Completed";

// ─── Output predicates ───────────────────────────────────────────────

/// Whether `kubectl get pods` output shows a running operator pod.
pub fn operator_running(output: &CommandOutput) -> bool {
    output.success()
        && output
            .output
            .lines()
            .any(|line| line.starts_with(OPERATOR_POD_PREFIX) && line.contains("Running"))
}

/// Whether `kubectl get pods` output shows no operator pod at all.
pub fn operator_absent(output: &CommandOutput) -> bool {
    output.success()
        && !output
            .output
            .lines()
            .any(|line| line.starts_with(OPERATOR_POD_PREFIX))
}

/// Whether `kubectl get chi` output lists `name` as completed.
pub fn chi_completed(output: &CommandOutput, name: &str) -> bool {
    output.success()
        && output
            .output
            .lines()
            .any(|line| first_column(line) == Some(name) && line.contains(CHI_COMPLETED))
}

/// Whether `kubectl get chi` output no longer lists `name`.
///
/// kubectl prints "No resources found" with a zero status once the last
/// CHI is gone.
pub fn chi_absent(output: &CommandOutput, name: &str) -> bool {
    output.success()
        && !output
            .output
            .lines()
            .any(|line| first_column(line) == Some(name))
}

fn first_column(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

// ─── Helpers ─────────────────────────────────────────────────────────

async fn run_on_host(
    infra: Arc<dyn Infrastructure>,
    dir: PathBuf,
    command: String,
    timeout: Duration,
) -> Result<(), AdashError> {
    tracing::info!(command = %command, dir = %dir.display(), "running host command");
    let output = infra.run_host(&command, &dir, timeout).await?;
    if output.success() {
        Ok(())
    } else {
        Err(EnvironmentError::Provision {
            command,
            reason: format!("exit status {}: {}", output.exit_status, output.output),
        }
        .into())
    }
}

fn dashboard(ctx: &RegressionContext) -> Result<(&UiDriver, &str), AdashError> {
    Ok((ctx.ui()?, ctx.config().dashboard.url.as_str()))
}

// ─── Setup ───────────────────────────────────────────────────────────

/// `vagrant up` in the environment's Vagrant directory; released with
/// `vagrant halt`.
pub struct ProvisionVm;

impl Step<RegressionContext> for ProvisionVm {
    fn name(&self) -> &str {
        "provision vm"
    }

    fn role(&self) -> StepRole {
        StepRole::Setup
    }

    fn acquires(&self) -> bool {
        true
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        let infra = ctx.infra();
        let dir = ctx.vagrant_dir();
        let command = ctx.config().vm.up_command.clone();
        let timeout = Duration::from_secs(ctx.config().vm.provision_timeout_secs);
        Box::pin(run_on_host(infra, dir, command, timeout))
    }

    fn release<'a>(
        &'a self,
        ctx: &'a mut RegressionContext,
    ) -> BoxFuture<'a, Result<(), AdashError>> {
        let infra = ctx.infra();
        let dir = ctx.vagrant_dir();
        let command = ctx.config().vm.halt_command.clone();
        let timeout = Duration::from_secs(ctx.config().vm.provision_timeout_secs);
        Box::pin(run_on_host(infra, dir, command, timeout))
    }
}

/// Open the persistent shell into the VM; released by closing it.
pub struct OpenVmShell;

impl Step<RegressionContext> for OpenVmShell {
    fn name(&self) -> &str {
        "open vm shell"
    }

    fn role(&self) -> StepRole {
        StepRole::Setup
    }

    fn acquires(&self) -> bool {
        true
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            let infra = ctx.infra();
            let dir = ctx.vagrant_dir();
            let vm = ctx.config().vm.clone();
            let shell = infra
                .open_channel(ChannelRequest {
                    launch_command: &vm.connect_command,
                    dir: &dir,
                    open_timeout: Duration::from_secs(vm.open_timeout_secs),
                    command_timeout: Duration::from_secs(vm.command_timeout_secs),
                })
                .await?;
            ctx.set_shell(shell);
            Ok(())
        })
    }

    fn release<'a>(
        &'a self,
        ctx: &'a mut RegressionContext,
    ) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            match ctx.take_shell() {
                Some(mut shell) => shell.close().await,
                None => Ok(()),
            }
        })
    }
}

/// `cd` into the folder Vagrant mounts from the host.
pub struct ChangeToMountedDir;

impl Step<RegressionContext> for ChangeToMountedDir {
    fn name(&self) -> &str {
        "change to mounted dir"
    }

    fn role(&self) -> StepRole {
        StepRole::Setup
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            let command = format!("cd {}", ctx.config().vm.mounted_dir);
            ctx.execute_checked(&command).await?;
            Ok(())
        })
    }
}

/// Start the cluster, when the distribution is not already running as a
/// service after provisioning.
pub struct StartCluster;

impl Step<RegressionContext> for StartCluster {
    fn name(&self) -> &str {
        "start cluster"
    }

    fn role(&self) -> StepRole {
        StepRole::Setup
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            let Some(command) = ctx.env().start_command.clone() else {
                tracing::info!(env = %ctx.env().name, "cluster starts with the vm, nothing to do");
                return Ok(());
            };
            ctx.execute_checked(&command).await?;
            Ok(())
        })
    }
}

/// Poll the distribution's status command, then wait the settle delay.
pub struct WaitClusterReady;

impl Step<RegressionContext> for WaitClusterReady {
    fn name(&self) -> &str {
        "wait for cluster"
    }

    fn role(&self) -> StepRole {
        StepRole::Setup
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            let command = ctx.env().status_command.clone();
            let what = format!("{} cluster ready", ctx.env().name);
            let policy = ctx.cluster_policy();
            ctx.poll_command(&what, policy, &command, CommandOutput::success)
                .await?;

            let settle = ctx.env().settle_secs;
            if settle > 0 {
                tracing::debug!(
                    env = %ctx.env().name,
                    settle_secs = settle,
                    "letting cluster settle"
                );
                tokio::time::sleep(Duration::from_secs(settle)).await;
            }
            Ok(())
        })
    }
}

/// Launch the dashboard binary in the background inside the VM; released
/// by stopping the process before the shell closes.
pub struct StartDashboard;

impl Step<RegressionContext> for StartDashboard {
    fn name(&self) -> &str {
        "start dashboard"
    }

    fn role(&self) -> StepRole {
        StepRole::Setup
    }

    fn acquires(&self) -> bool {
        true
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            let command = ctx.config().dashboard.start_command();
            ctx.execute_checked(&command).await?;
            Ok(())
        })
    }

    fn release<'a>(
        &'a self,
        ctx: &'a mut RegressionContext,
    ) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            if !ctx.has_shell() {
                tracing::warn!(env = %ctx.env().name, "no vm shell, dashboard left to vm halt");
                return Ok(());
            }
            let command = ctx.config().dashboard.stop_command();
            let output = ctx.execute(&command).await?;
            // pkill은 일치하는 프로세스가 없으면 1을 반환 (이미 종료됨)
            if !output.success() {
                tracing::warn!(
                    command = %command,
                    exit_status = output.exit_status,
                    "dashboard was not running"
                );
            }
            Ok(())
        })
    }
}

/// Start a browser session; released by quitting it.
pub struct OpenBrowser;

impl Step<RegressionContext> for OpenBrowser {
    fn name(&self) -> &str {
        "open browser"
    }

    fn role(&self) -> StepRole {
        StepRole::Setup
    }

    fn acquires(&self) -> bool {
        true
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            let infra = ctx.infra();
            let config = Arc::clone(ctx.config());
            let browser = infra.open_browser(&config.browser).await?;
            let policy = ctx.ui_policy();
            ctx.set_ui(UiDriver::new(browser, policy));
            Ok(())
        })
    }

    fn release<'a>(
        &'a self,
        ctx: &'a mut RegressionContext,
    ) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            match ctx.take_ui() {
                Some(mut ui) => ui.quit().await,
                None => Ok(()),
            }
        })
    }
}

// ─── Actions ─────────────────────────────────────────────────────────

/// Navigate to the dashboard and wait for it to render.
pub struct OpenDashboard;

impl Step<RegressionContext> for OpenDashboard {
    fn name(&self) -> &str {
        "open dashboard"
    }

    fn role(&self) -> StepRole {
        StepRole::Action
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            let (ui, url) = dashboard(ctx)?;
            DashboardPage::new(ui, url).open().await
        })
    }
}

/// Deploy the ClickHouse operator into the environment's namespace.
pub struct DeployOperator;

impl Step<RegressionContext> for DeployOperator {
    fn name(&self) -> &str {
        "deploy operator"
    }

    fn role(&self) -> StepRole {
        StepRole::Action
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            let namespace = ctx.env().namespace.clone();
            let (ui, url) = dashboard(ctx)?;
            DashboardPage::new(ui, url).deploy_operator(&namespace).await
        })
    }
}

/// Deploy the configured CHI example.
pub struct DeployChi;

impl Step<RegressionContext> for DeployChi {
    fn name(&self) -> &str {
        "deploy chi"
    }

    fn role(&self) -> StepRole {
        StepRole::Action
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            let example = ctx.config().dashboard.chi_example.clone();
            let namespace = ctx.config().dashboard.chi_namespace.clone();
            let (ui, url) = dashboard(ctx)?;
            DashboardPage::new(ui, url)
                .deploy_chi(&example, &namespace)
                .await
        })
    }
}

/// Delete the deployed CHI through the dashboard.
pub struct DeleteChi;

impl Step<RegressionContext> for DeleteChi {
    fn name(&self) -> &str {
        "delete chi"
    }

    fn role(&self) -> StepRole {
        StepRole::Action
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            let name = ctx.config().dashboard.chi_name.clone();
            let (ui, url) = dashboard(ctx)?;
            DashboardPage::new(ui, url).delete_chi(&name).await
        })
    }
}

/// Delete the operator through the dashboard.
pub struct DeleteOperator;

impl Step<RegressionContext> for DeleteOperator {
    fn name(&self) -> &str {
        "delete operator"
    }

    fn role(&self) -> StepRole {
        StepRole::Action
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            let namespace = ctx.env().namespace.clone();
            let (ui, url) = dashboard(ctx)?;
            DashboardPage::new(ui, url).delete_operator(&namespace).await
        })
    }
}

// ─── Assertions ──────────────────────────────────────────────────────

/// kubectl shows a running operator pod.
pub struct VerifyOperator;

impl Step<RegressionContext> for VerifyOperator {
    fn name(&self) -> &str {
        "verify operator"
    }

    fn role(&self) -> StepRole {
        StepRole::Assertion
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            let namespace = ctx.env().namespace.clone();
            let command = ctx.env().kubectl(&format!("get pods --namespace {namespace}"));
            let policy = ctx.verify_policy();
            ctx.poll_command("operator running", policy, &command, operator_running)
                .await?;
            Ok(())
        })
    }
}

/// kubectl shows the CHI as completed.
pub struct VerifyChi;

impl Step<RegressionContext> for VerifyChi {
    fn name(&self) -> &str {
        "verify chi"
    }

    fn role(&self) -> StepRole {
        StepRole::Assertion
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            let name = ctx.config().dashboard.chi_name.clone();
            let namespace = ctx.config().dashboard.chi_namespace.clone();
            let command = ctx.env().kubectl(&format!("get chi --namespace {namespace}"));
            let what = format!("chi {name} completed");
            let policy = ctx.verify_policy();
            ctx.poll_command(&what, policy, &command, |out| chi_completed(out, &name))
                .await?;
            Ok(())
        })
    }
}

/// kubectl no longer lists the CHI.
pub struct VerifyChiRemoved;

impl Step<RegressionContext> for VerifyChiRemoved {
    fn name(&self) -> &str {
        "verify chi removed"
    }

    fn role(&self) -> StepRole {
        StepRole::Assertion
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            let name = ctx.config().dashboard.chi_name.clone();
            let namespace = ctx.config().dashboard.chi_namespace.clone();
            let command = ctx.env().kubectl(&format!("get chi --namespace {namespace}"));
            let what = format!("chi {name} removed");
            let policy = ctx.verify_policy();
            ctx.poll_command(&what, policy, &command, |out| chi_absent(out, &name))
                .await?;
            Ok(())
        })
    }
}

/// kubectl no longer lists an operator pod.
pub struct VerifyOperatorRemoved;

impl Step<RegressionContext> for VerifyOperatorRemoved {
    fn name(&self) -> &str {
        "verify operator removed"
    }

    fn role(&self) -> StepRole {
        StepRole::Assertion
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            let namespace = ctx.env().namespace.clone();
            let command = ctx.env().kubectl(&format!("get pods --namespace {namespace}"));
            let policy = ctx.verify_policy();
            ctx.poll_command("operator removed", policy, &command, operator_absent)
                .await?;
            Ok(())
        })
    }
}

// ─── Teardown ────────────────────────────────────────────────────────

/// Run the environment's cleanup command (e.g. `kind delete cluster`).
///
/// Without an open shell there is nothing to clean up inside the VM.
pub struct CleanupCluster;

impl Step<RegressionContext> for CleanupCluster {
    fn name(&self) -> &str {
        "cleanup cluster"
    }

    fn role(&self) -> StepRole {
        StepRole::Teardown
    }

    fn run<'a>(&'a self, ctx: &'a mut RegressionContext) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            let Some(command) = ctx.env().cleanup_command.clone() else {
                return Ok(());
            };
            if !ctx.has_shell() {
                tracing::warn!(
                    env = %ctx.env().name,
                    command = %command,
                    "vm shell is not open, skipping cleanup"
                );
                return Ok(());
            }
            ctx.execute_checked(&command).await?;
            Ok(())
        })
    }
}
