//! Scenario-scoped mutable state.
//!
//! One [`RegressionContext`] is created per environment and threaded through
//! every step of that environment's scenario. It owns the VM shell and the
//! UI driver while they are open; the acquiring steps put them in and their
//! releases take them out again.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use adash_core::config::AdashConfig;
use adash_core::environment::EnvironmentConfig;
use adash_core::error::{ActionError, AdashError};
use adash_core::wait::{WaitPolicy, wait_until};
use adash_shell::{CommandChannel, CommandOutput};
use adash_ui::UiDriver;

use crate::infra::Infrastructure;

/// Poll interval for cluster and kubectl checks inside the VM.
pub const CLUSTER_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// State shared by the steps of one scenario.
pub struct RegressionContext {
    config: Arc<AdashConfig>,
    env: EnvironmentConfig,
    infra: Arc<dyn Infrastructure>,
    shell: Option<Box<dyn CommandChannel>>,
    ui: Option<UiDriver>,
}

impl RegressionContext {
    /// Create a context for `env` with nothing acquired yet.
    pub fn new(
        config: Arc<AdashConfig>,
        env: EnvironmentConfig,
        infra: Arc<dyn Infrastructure>,
    ) -> Self {
        Self {
            config,
            env,
            infra,
            shell: None,
            ui: None,
        }
    }

    /// Suite configuration.
    pub fn config(&self) -> &Arc<AdashConfig> {
        &self.config
    }

    /// Environment under test.
    pub fn env(&self) -> &EnvironmentConfig {
        &self.env
    }

    /// Infrastructure handle, cloned so it can be used while the context
    /// is mutably borrowed.
    pub fn infra(&self) -> Arc<dyn Infrastructure> {
        Arc::clone(&self.infra)
    }

    /// Host directory holding this environment's Vagrantfile.
    pub fn vagrant_dir(&self) -> PathBuf {
        self.config.vm.root.join(&self.env.vagrant_dir)
    }

    /// Wait policy for UI interactions.
    pub fn ui_policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            self.config.browser.wait_timeout(),
            self.config.browser.poll_interval(),
        )
    }

    /// Wait policy for the cluster readiness check.
    pub fn cluster_policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_secs(self.config.vm.cluster_ready_timeout_secs),
            CLUSTER_POLL_INTERVAL,
        )
    }

    /// Wait policy for kubectl verification of dashboard actions.
    pub fn verify_policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_secs(self.config.dashboard.deploy_timeout_secs),
            CLUSTER_POLL_INTERVAL,
        )
    }

    // ─── VM shell ────────────────────────────────────────────────────

    /// Whether the VM shell is currently open.
    pub fn has_shell(&self) -> bool {
        self.shell.is_some()
    }

    /// Hand an opened channel to the scenario.
    pub fn set_shell(&mut self, shell: Box<dyn CommandChannel>) {
        self.shell = Some(shell);
    }

    /// Take the channel out of the context, if one is open.
    pub fn take_shell(&mut self) -> Option<Box<dyn CommandChannel>> {
        self.shell.take()
    }

    fn shell(&mut self) -> Result<&mut Box<dyn CommandChannel>, AdashError> {
        self.shell
            .as_mut()
            .ok_or_else(|| ActionError::Precondition("vm shell is not open".to_owned()).into())
    }

    /// Execute `command` in the VM shell.
    ///
    /// A non-zero exit status is returned as data.
    pub async fn execute(&mut self, command: &str) -> Result<CommandOutput, AdashError> {
        tracing::debug!(env = %self.env.name, command, "executing in vm");
        let output = self.shell()?.execute(command).await?;
        tracing::debug!(
            env = %self.env.name,
            command,
            exit_status = output.exit_status,
            "command finished"
        );
        Ok(output)
    }

    /// Execute `command` in the VM shell, failing on a non-zero exit status.
    pub async fn execute_checked(&mut self, command: &str) -> Result<CommandOutput, AdashError> {
        self.execute(command).await?.ensure_success(command)
    }

    /// Re-run `command` until `accept` holds for its output.
    ///
    /// # Errors
    ///
    /// [`AdashError::Timeout`] when `accept` never holds within `policy`;
    /// channel errors are propagated immediately.
    pub async fn poll_command<F>(
        &mut self,
        what: &str,
        policy: WaitPolicy,
        command: &str,
        accept: F,
    ) -> Result<CommandOutput, AdashError>
    where
        F: Fn(&CommandOutput) -> bool + Sync,
    {
        let shell = Mutex::new(self.shell.take().ok_or_else(|| {
            AdashError::from(ActionError::Precondition("vm shell is not open".to_owned()))
        })?);
        tracing::debug!(env = %self.env.name, command, what, "polling in vm");

        let result = wait_until(what, policy, || probe_command(&shell, command, &accept)).await;

        // 채널은 성공/실패와 무관하게 컨텍스트로 돌려놓는다
        self.shell = Some(shell.into_inner());
        result
    }

    // ─── UI driver ───────────────────────────────────────────────────

    /// Hand a UI driver to the scenario.
    pub fn set_ui(&mut self, ui: UiDriver) {
        self.ui = Some(ui);
    }

    /// Take the UI driver out of the context, if one is open.
    pub fn take_ui(&mut self) -> Option<UiDriver> {
        self.ui.take()
    }

    /// UI driver of the open browser session.
    pub fn ui(&self) -> Result<&UiDriver, AdashError> {
        self.ui
            .as_ref()
            .ok_or_else(|| ActionError::Precondition("browser is not open".to_owned()).into())
    }
}

async fn probe_command<F>(
    shell: &Mutex<Box<dyn CommandChannel>>,
    command: &str,
    accept: &F,
) -> Result<Option<CommandOutput>, AdashError>
where
    F: Fn(&CommandOutput) -> bool,
{
    let mut shell = shell.lock().await;
    let output = shell.execute(command).await?;
    tracing::trace!(command, exit_status = output.exit_status, "probe result");
    Ok(accept(&output).then_some(output))
}
