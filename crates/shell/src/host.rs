//! 호스트 명령 실행
//!
//! `vagrant up`/`vagrant halt`처럼 호스트에서 한 번 실행하고 끝나는 명령을
//! 다룹니다. 작업 디렉토리는 명령마다 명시적으로 지정하며, 프로세스 전체의
//! 현재 디렉토리는 바꾸지 않습니다.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use adash_core::error::{AdashError, EnvironmentError, TimeoutError};

use crate::CommandOutput;

/// 호스트 명령
#[derive(Debug, Clone)]
pub struct HostCommand {
    command: String,
    current_dir: PathBuf,
    timeout: Duration,
}

impl HostCommand {
    /// `dir`에서 실행할 명령을 생성합니다.
    pub fn new(command: impl Into<String>, dir: impl AsRef<Path>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            current_dir: dir.as_ref().to_path_buf(),
            timeout,
        }
    }

    /// 명령 문자열
    pub fn command(&self) -> &str {
        &self.command
    }

    /// 작업 디렉토리
    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// `sh -c`로 실행하고 종료 코드와 출력을 반환합니다.
    ///
    /// # Errors
    ///
    /// - 프로세스를 띄우지 못하면 [`EnvironmentError::Provision`]
    /// - 제한 시간 초과 시 [`TimeoutError`] (프로세스는 종료됨)
    pub async fn run(&self) -> Result<CommandOutput, AdashError> {
        tracing::info!(
            command = %self.command,
            dir = %self.current_dir.display(),
            "running host command"
        );

        let child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .current_dir(&self.current_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EnvironmentError::Provision {
                command: self.command.clone(),
                reason: format!("spawn failed in {}: {e}", self.current_dir.display()),
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(AdashError::Io)?,
            Err(_) => {
                return Err(TimeoutError {
                    what: format!("host command `{}`", self.command),
                    timeout: self.timeout,
                    attempts: 1,
                }
                .into());
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }
        let exit_status = output.status.code().unwrap_or(-1);

        tracing::debug!(command = %self.command, exit_status, "host command finished");
        Ok(CommandOutput {
            exit_status,
            output: text.trim_end().to_owned(),
        })
    }

    /// 실행 후 0이 아닌 종료 코드를 [`EnvironmentError::Provision`]으로 변환합니다.
    pub async fn run_checked(&self) -> Result<CommandOutput, AdashError> {
        let out = self.run().await?;
        if out.success() {
            Ok(out)
        } else {
            Err(EnvironmentError::Provision {
                command: self.command.clone(),
                reason: format!("exit status {}: {}", out.exit_status, out.output),
            }
            .into())
        }
    }
}

/// `<program> --version` 출력을 반환합니다.
///
/// 사전 점검에서 WebDriver와 VirtualBox 버전을 기록하는 데 사용합니다.
pub async fn tool_version(program: impl AsRef<Path>) -> Result<String, AdashError> {
    let program = program.as_ref();
    let output = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| EnvironmentError::Provision {
            command: format!("{} --version", program.display()),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(EnvironmentError::Provision {
            command: format!("{} --version", program.display()),
            reason: format!("exit status {:?}", output.status.code()),
        }
        .into());
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}
