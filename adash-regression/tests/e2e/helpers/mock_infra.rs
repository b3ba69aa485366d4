//! Mock infrastructure for E2E scenarios.
//!
//! Hands out [`MockShell`] and [`MockBrowser`] instances that share one
//! [`Journal`], and records host commands as `host: <command> @ <dir>`
//! where `<dir>` is the Vagrant directory name.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use adash_core::config::BrowserConfig;
use adash_core::error::{AdashError, EnvironmentError};
use adash_core::scenario::BoxFuture;
use adash_regression::infra::{ChannelRequest, Infrastructure};
use adash_shell::{CommandChannel, CommandOutput};
use adash_ui::Browser;

use super::journal::Journal;
use super::mock_browser::MockBrowser;
use super::mock_shell::{MockShell, ShellScript};

/// Builder-style mock of every external collaborator.
#[derive(Default)]
pub struct MockInfrastructure {
    journal: Journal,
    scripts: Mutex<HashMap<String, ShellScript>>,
    failing_host: Vec<(String, String)>,
    failing_channel: Vec<String>,
    fail_browser: bool,
    fail_click_on: Option<String>,
    versions: HashMap<String, String>,
    host_timeouts: Mutex<Vec<(String, Duration)>>,
}

#[allow(dead_code)]
impl MockInfrastructure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// Host commands with the timeout they were given, in call order.
    pub fn host_timeouts(&self) -> Vec<(String, Duration)> {
        self.host_timeouts.lock().expect("timeouts lock").clone()
    }

    /// Use `script` for the shell opened in `vagrant_dir` instead of a
    /// healthy cluster.
    pub fn script(self, vagrant_dir: &str, script: ShellScript) -> Self {
        self.scripts
            .lock()
            .expect("scripts lock")
            .insert(vagrant_dir.to_owned(), script);
        self
    }

    /// Make `command` exit with status 1 when run in `vagrant_dir`.
    pub fn fail_host(mut self, vagrant_dir: &str, command: &str) -> Self {
        self.failing_host
            .push((vagrant_dir.to_owned(), command.to_owned()));
        self
    }

    /// Make opening the shell in `vagrant_dir` fail.
    pub fn fail_channel(mut self, vagrant_dir: &str) -> Self {
        self.failing_channel.push(vagrant_dir.to_owned());
        self
    }

    /// Make every browser session fail to start.
    pub fn fail_browser(mut self) -> Self {
        self.fail_browser = true;
        self
    }

    /// Make clicks on elements whose xpath contains `pattern` fail.
    pub fn fail_click_on(mut self, pattern: &str) -> Self {
        self.fail_click_on = Some(pattern.to_owned());
        self
    }

    /// Report `version` for `program --version`.
    pub fn version(mut self, program: &str, version: &str) -> Self {
        self.versions.insert(program.to_owned(), version.to_owned());
        self
    }
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Infrastructure for MockInfrastructure {
    fn run_host<'a>(
        &'a self,
        command: &'a str,
        dir: &'a Path,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<CommandOutput, AdashError>> {
        Box::pin(async move {
            let dir = dir_name(dir);
            self.journal.record(format!("host: {command} @ {dir}"));
            self.host_timeouts
                .lock()
                .expect("timeouts lock")
                .push((command.to_owned(), timeout));
            let fails = self
                .failing_host
                .iter()
                .any(|(d, c)| *d == dir && c == command);
            Ok(if fails {
                CommandOutput {
                    exit_status: 1,
                    output: format!("{command} failed"),
                }
            } else {
                CommandOutput {
                    exit_status: 0,
                    output: String::new(),
                }
            })
        })
    }

    fn open_channel<'a>(
        &'a self,
        request: ChannelRequest<'a>,
    ) -> BoxFuture<'a, Result<Box<dyn CommandChannel>, AdashError>> {
        Box::pin(async move {
            let dir = dir_name(request.dir);
            self.journal
                .record(format!("vm: open {} @ {dir}", request.launch_command));
            if self.failing_channel.contains(&dir) {
                return Err(EnvironmentError::ChannelOpen {
                    command: request.launch_command.to_owned(),
                    reason: "ssh: connect to host 127.0.0.1 port 2222: Connection refused"
                        .to_owned(),
                }
                .into());
            }
            let script = self
                .scripts
                .lock()
                .expect("scripts lock")
                .remove(&dir)
                .unwrap_or_else(ShellScript::healthy_cluster);
            Ok(Box::new(MockShell::new(self.journal.clone(), script)) as Box<dyn CommandChannel>)
        })
    }

    fn open_browser<'a>(
        &'a self,
        config: &'a BrowserConfig,
    ) -> BoxFuture<'a, Result<Box<dyn Browser>, AdashError>> {
        Box::pin(async move {
            self.journal.record(format!("ui: open {}", config.browser));
            if self.fail_browser {
                return Err(EnvironmentError::Browser(format!(
                    "could not reach {} within {}s",
                    config.hub_url, config.session_timeout_secs
                ))
                .into());
            }
            Ok(Box::new(MockBrowser::new(
                self.journal.clone(),
                self.fail_click_on.clone(),
            )) as Box<dyn Browser>)
        })
    }

    fn tool_version<'a>(&'a self, program: &'a Path) -> BoxFuture<'a, Result<String, AdashError>> {
        Box::pin(async move {
            let key = program.to_string_lossy().into_owned();
            self.versions.get(&key).cloned().ok_or_else(|| {
                EnvironmentError::Provision {
                    command: format!("{key} --version"),
                    reason: "No such file or directory".to_owned(),
                }
                .into()
            })
        })
    }
}
