//! 지속 셸 채널: 하나의 셸 프로세스에 명령을 순차 실행
//!
//! [`ShellChannel`]은 실행 명령(예: `vagrant ssh`)을 파이프 stdio로 띄우고
//! 시나리오가 끝날 때까지 유지합니다. 모든 명령이 같은 셸 프로세스에서
//! 실행되므로 `cd`, `export`, `&`로 띄운 프로세스가 다음 명령까지 유지됩니다.
//!
//! # 프레이밍
//!
//! 각 명령은 다음 형태로 전송됩니다:
//!
//! ```text
//! { <command>
//! } 2>&1 < /dev/null; printf '\n%s %d\n' <marker> "$?"
//! ```
//!
//! `<marker>`는 명령마다 고유합니다. 마커 줄 이전까지 읽은 내용이 해당 명령의
//! 출력이므로 이전 명령의 출력이 섞이지 않습니다.
//! 단, `&`로 띄운 백그라운드 프로세스가 나중에 쓴 출력은 이후 명령의 출력에
//! 나타날 수 있습니다.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use adash_core::error::{AdashError, EnvironmentError, TimeoutError};
use adash_core::scenario::BoxFuture;

use crate::{CommandChannel, CommandOutput};

/// 명령별 기본 제한 시간
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// `close()`가 셸 종료를 기다리는 시간 (이후 강제 종료)
const CLOSE_GRACE: Duration = Duration::from_secs(10);

/// [`ShellChannel`] 빌더
pub struct ShellChannelBuilder {
    launch_command: String,
    current_dir: Option<PathBuf>,
    open_timeout: Duration,
    command_timeout: Duration,
}

impl ShellChannelBuilder {
    /// `launch_command`로 채널 빌더를 생성합니다.
    pub fn new(launch_command: impl Into<String>) -> Self {
        Self {
            launch_command: launch_command.into(),
            current_dir: None,
            open_timeout: Duration::from_secs(100),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// 실행 명령의 작업 디렉토리 (예: Vagrantfile이 있는 폴더)
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// 프로세스 기동과 핸드셰이크 제한 시간
    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    /// 개별 명령 제한 시간
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// 프로세스를 띄우고 핸드셰이크(`echo 1`)로 응답을 확인합니다.
    ///
    /// # Errors
    ///
    /// 기동 실패, 조기 종료, 제한 시간 내 무응답이면
    /// [`EnvironmentError::ChannelOpen`]을 반환합니다.
    pub async fn open(self) -> Result<ShellChannel, AdashError> {
        let launch = self.launch_command.clone();
        let open_error = |reason: String| -> AdashError {
            EnvironmentError::ChannelOpen {
                command: launch.clone(),
                reason,
            }
            .into()
        };

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(format!("exec {}", self.launch_command))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| open_error(format!("spawn failed: {e}")))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| open_error("stdin not captured".to_owned()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| open_error("stdout not captured".to_owned()))?;

        let mut channel = ShellChannel {
            launch_command: self.launch_command,
            child,
            stdin,
            reader: BufReader::new(stdout),
            command_timeout: self.command_timeout,
            state: ChannelState::Open,
        };

        tracing::debug!(launch = %channel.launch_command, "opening shell channel");
        match tokio::time::timeout(self.open_timeout, channel.exchange("echo 1")).await {
            Ok(Ok(handshake)) if handshake.exit_status == 0 => {
                tracing::info!(launch = %channel.launch_command, "shell channel open");
                Ok(channel)
            }
            Ok(Ok(handshake)) => Err(open_error(format!(
                "handshake exited with status {}",
                handshake.exit_status
            ))),
            Ok(Err(e)) => Err(open_error(e.to_string())),
            Err(_) => Err(open_error(format!(
                "no response within {:?}",
                self.open_timeout
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelState {
    Open,
    /// 명령 시간 초과나 읽기 실패로 스트림 위치를 알 수 없음
    Desynchronized,
    Closed,
}

/// 셸에 대한 지속 명령 채널
pub struct ShellChannel {
    launch_command: String,
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    command_timeout: Duration,
    state: ChannelState,
}

impl ShellChannel {
    /// `ShellChannelBuilder::new(launch).open_timeout(timeout).open()`의 축약형
    pub async fn open(launch_command: &str, timeout: Duration) -> Result<Self, AdashError> {
        ShellChannelBuilder::new(launch_command)
            .open_timeout(timeout)
            .open()
            .await
    }

    /// 채널 실행 명령
    pub fn launch_command(&self) -> &str {
        &self.launch_command
    }

    /// 명령을 받을 수 있는 상태인지 여부
    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }

    /// 명령을 실행하고 종료 코드와 출력(stdout + stderr)을 반환합니다.
    ///
    /// 0이 아닌 종료 코드는 에러가 아니라 값으로 반환합니다.
    ///
    /// # Errors
    ///
    /// - 명령 제한 시간 초과 시 [`TimeoutError`]. 이후 채널은 사용할 수 없습니다.
    /// - 출력 읽기 실패 시 [`AdashError::Io`]. 이후 채널은 사용할 수 없습니다.
    /// - 셸이 종료되었거나 이미 닫혔으면 [`EnvironmentError::ChannelClosed`].
    pub async fn execute(&mut self, command: &str) -> Result<CommandOutput, AdashError> {
        match self.state {
            ChannelState::Open => {}
            ChannelState::Desynchronized => {
                return Err(EnvironmentError::ChannelClosed(
                    "channel desynchronized after a failed command".to_owned(),
                )
                .into());
            }
            ChannelState::Closed => {
                return Err(EnvironmentError::ChannelClosed("channel already closed".to_owned()).into());
            }
        }

        tracing::debug!(command, "executing");
        match tokio::time::timeout(self.command_timeout, self.exchange(command)).await {
            Ok(result) => {
                if let Ok(out) = &result {
                    tracing::debug!(command, exit_status = out.exit_status, "command finished");
                }
                result
            }
            Err(_) => {
                self.state = ChannelState::Desynchronized;
                tracing::warn!(command, timeout = ?self.command_timeout, "command timed out");
                Err(TimeoutError {
                    what: format!("command `{command}`"),
                    timeout: self.command_timeout,
                    attempts: 1,
                }
                .into())
            }
        }
    }

    /// 셸에 `exit`을 보내고, 유예 시간 내 종료되지 않으면 강제 종료합니다.
    ///
    /// 이미 닫힌 채널에 대해서는 아무것도 하지 않습니다.
    pub async fn close(&mut self) -> Result<(), AdashError> {
        if self.state == ChannelState::Closed {
            return Ok(());
        }
        self.state = ChannelState::Closed;

        // exit 실패는 이미 종료된 셸을 의미
        let _ = self.stdin.write_all(b"exit\n").await;
        let _ = self.stdin.flush().await;

        match tokio::time::timeout(CLOSE_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::info!(launch = %self.launch_command, ?status, "shell channel closed");
                Ok(())
            }
            Ok(Err(e)) => Err(AdashError::Io(e)),
            Err(_) => {
                tracing::warn!(launch = %self.launch_command, "shell did not exit, killing");
                self.child.kill().await.map_err(AdashError::Io)
            }
        }
    }

    async fn exchange(&mut self, command: &str) -> Result<CommandOutput, AdashError> {
        let marker = format!("__ADASH_{}__", uuid::Uuid::new_v4().simple());
        let framed = format!(
            "{{ {command}\n}} 2>&1 < /dev/null; printf '\\n%s %d\\n' {marker} \"$?\"\n"
        );

        let closed = |e: std::io::Error| -> AdashError {
            EnvironmentError::ChannelClosed(format!("write failed: {e}")).into()
        };
        self.stdin.write_all(framed.as_bytes()).await.map_err(closed)?;
        self.stdin.flush().await.map_err(closed)?;

        let mut output = String::new();
        let mut raw = Vec::new();
        loop {
            raw.clear();
            let read = match self.reader.read_until(b'\n', &mut raw).await {
                Ok(read) => read,
                Err(e) => {
                    // 마커 위치를 잃었으므로 다음 명령이 잔여 출력을 읽지 않도록 차단
                    self.state = ChannelState::Desynchronized;
                    return Err(AdashError::Io(e));
                }
            };
            if read == 0 {
                self.state = ChannelState::Closed;
                return Err(EnvironmentError::ChannelClosed(format!(
                    "shell exited while running `{command}`"
                ))
                .into());
            }

            let line = decode_line(&raw);
            if let Some(status) = parse_marker(&line, &marker) {
                return Ok(CommandOutput {
                    exit_status: status,
                    output: finish_output(output),
                });
            }
            output.push_str(&line);
            output.push('\n');
        }
    }
}

impl CommandChannel for ShellChannel {
    fn execute<'a>(
        &'a mut self,
        command: &'a str,
    ) -> BoxFuture<'a, Result<CommandOutput, AdashError>> {
        Box::pin(ShellChannel::execute(self, command))
    }

    fn close(&mut self) -> BoxFuture<'_, Result<(), AdashError>> {
        Box::pin(ShellChannel::close(self))
    }
}

fn parse_marker(line: &str, marker: &str) -> Option<i32> {
    let rest = line.strip_prefix(marker)?.strip_prefix(' ')?;
    rest.trim().parse().ok()
}

/// 한 줄을 디코딩합니다. 잘못된 UTF-8은 대체 문자로 바꿉니다.
fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// 마커 앞에 삽입된 개행과 후행 공백 제거
fn finish_output(mut raw: String) -> String {
    let trimmed = raw.trim_end().len();
    raw.truncate(trimmed);
    raw
}
