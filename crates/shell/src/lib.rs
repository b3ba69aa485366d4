#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`channel`]: VM 안의 지속 셸 채널 ([`ShellChannel`])
//! - [`host`]: 호스트 명령 실행 (`vagrant up`/`halt`, 도구 버전 확인)

pub mod channel;
pub mod host;

pub use channel::{ShellChannel, ShellChannelBuilder};
pub use host::{HostCommand, tool_version};

use serde::{Deserialize, Serialize};

use adash_core::error::{ActionError, AdashError};
use adash_core::scenario::BoxFuture;

/// 명령 실행 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// 종료 코드
    pub exit_status: i32,
    /// stdout + stderr (후행 개행 제거)
    pub output: String,
}

impl CommandOutput {
    /// 종료 코드가 0인지 여부
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }

    /// 종료 코드가 0이 아니면 [`ActionError::CommandFailed`]로 변환합니다.
    pub fn ensure_success(self, command: &str) -> Result<Self, AdashError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ActionError::CommandFailed {
                command: command.to_owned(),
                status: self.exit_status,
                output: self.output,
            }
            .into())
        }
    }
}

/// 명령 채널 trait
///
/// 시나리오 step은 이 trait을 통해 명령을 실행하므로, 테스트에서는
/// 실제 VM 대신 모의 채널을 주입할 수 있습니다.
///
/// # 구현 요구사항
/// - 명령은 제출 순서대로 실행되어야 합니다.
/// - 각 결과에는 해당 명령의 출력과 종료 코드만 포함되어야 합니다.
/// - `close()`는 여러 번 호출해도 안전해야 합니다.
pub trait CommandChannel: Send {
    /// 명령을 실행합니다.
    fn execute<'a>(
        &'a mut self,
        command: &'a str,
    ) -> BoxFuture<'a, Result<CommandOutput, AdashError>>;

    /// 채널을 닫습니다.
    fn close(&mut self) -> BoxFuture<'_, Result<(), AdashError>>;
}

/// 명령을 실행하고 0이 아닌 종료 코드를 에러로 취급합니다.
pub async fn run_checked(
    channel: &mut dyn CommandChannel,
    command: &str,
) -> Result<CommandOutput, AdashError> {
    channel.execute(command).await?.ensure_success(command)
}
