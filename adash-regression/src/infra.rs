//! Infrastructure factories used by the scenario steps.
//!
//! Every side effect that leaves the process (host commands such as
//! `vagrant up`, the persistent VM shell, the WebDriver session and tool
//! version probes) goes through [`Infrastructure`]. Production uses
//! [`LocalInfrastructure`]; the e2e tests substitute mocks.

use std::path::Path;
use std::time::Duration;

use adash_core::config::BrowserConfig;
use adash_core::error::AdashError;
use adash_core::scenario::BoxFuture;
use adash_shell::{CommandChannel, CommandOutput, HostCommand, ShellChannelBuilder};
use adash_ui::{Browser, BrowserSession};

/// Parameters for opening the persistent VM shell.
#[derive(Debug, Clone, Copy)]
pub struct ChannelRequest<'a> {
    /// Launch command, e.g. `vagrant ssh`.
    pub launch_command: &'a str,
    /// Working directory the launch command runs in.
    pub dir: &'a Path,
    /// Bound on the launch handshake.
    pub open_timeout: Duration,
    /// Bound on each command executed over the channel.
    pub command_timeout: Duration,
}

/// Source of host processes, VM shells and browser sessions.
pub trait Infrastructure: Send + Sync {
    /// Run a one-off command on the host in `dir`.
    ///
    /// A non-zero exit status is returned as data, not as an error.
    fn run_host<'a>(
        &'a self,
        command: &'a str,
        dir: &'a Path,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<CommandOutput, AdashError>>;

    /// Open a persistent shell channel into the VM.
    fn open_channel<'a>(
        &'a self,
        request: ChannelRequest<'a>,
    ) -> BoxFuture<'a, Result<Box<dyn CommandChannel>, AdashError>>;

    /// Start a browser session (local chromedriver or remote hub).
    fn open_browser<'a>(
        &'a self,
        config: &'a BrowserConfig,
    ) -> BoxFuture<'a, Result<Box<dyn Browser>, AdashError>>;

    /// Report `<program> --version`.
    fn tool_version<'a>(&'a self, program: &'a Path) -> BoxFuture<'a, Result<String, AdashError>>;
}

/// Infrastructure backed by real processes and HTTP.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalInfrastructure;

impl Infrastructure for LocalInfrastructure {
    fn run_host<'a>(
        &'a self,
        command: &'a str,
        dir: &'a Path,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<CommandOutput, AdashError>> {
        Box::pin(async move { HostCommand::new(command, dir, timeout).run().await })
    }

    fn open_channel<'a>(
        &'a self,
        request: ChannelRequest<'a>,
    ) -> BoxFuture<'a, Result<Box<dyn CommandChannel>, AdashError>> {
        Box::pin(async move {
            let channel = ShellChannelBuilder::new(request.launch_command)
                .current_dir(request.dir)
                .open_timeout(request.open_timeout)
                .command_timeout(request.command_timeout)
                .open()
                .await?;
            Ok(Box::new(channel) as Box<dyn CommandChannel>)
        })
    }

    fn open_browser<'a>(
        &'a self,
        config: &'a BrowserConfig,
    ) -> BoxFuture<'a, Result<Box<dyn Browser>, AdashError>> {
        Box::pin(async move {
            let session = BrowserSession::start(config).await?;
            Ok(Box::new(session) as Box<dyn Browser>)
        })
    }

    fn tool_version<'a>(&'a self, program: &'a Path) -> BoxFuture<'a, Result<String, AdashError>> {
        Box::pin(adash_shell::tool_version(program))
    }
}
