//! 에러 타입: 시나리오 실행 중 발생하는 에러 분류
//!
//! - [`ActionError`]: 외부 명령 또는 UI 동작 실패
//! - [`TimeoutError`]: 제한 시간 내에 조건이 충족되지 않음
//! - [`EnvironmentError`]: VM 또는 셸 채널을 준비하지 못함
//! - [`ConfigError`]: 설정 파일/값 오류

use std::time::Duration;

/// adash 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum AdashError {
    /// 명령/UI 동작 실패
    #[error("action error: {0}")]
    Action(#[from] ActionError),

    /// 대기 시간 초과
    #[error("timeout: {0}")]
    Timeout(#[from] TimeoutError),

    /// 환경 준비 실패
    #[error("environment error: {0}")]
    Environment(#[from] EnvironmentError),

    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdashError {
    /// 에러 분류 이름을 반환합니다 (리포트 출력용).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Action(_) => "action",
            Self::Timeout(_) => "timeout",
            Self::Environment(_) => "environment",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
        }
    }
}

/// 외부 명령 또는 UI 동작 실패
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// 명령이 0이 아닌 종료 코드를 반환
    #[error("command `{command}` exited with status {status}: {output}")]
    CommandFailed {
        command: String,
        status: i32,
        output: String,
    },

    /// 명령 출력에 기대한 내용이 없음
    #[error("output of `{command}` does not contain `{expected}`")]
    UnexpectedOutput { command: String, expected: String },

    /// 셀렉터에 해당하는 요소가 없음
    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    /// WebDriver 요청 실패
    #[error("webdriver `{command}` failed: {reason}")]
    WebDriver { command: String, reason: String },

    /// 스텝 전제 조건 미충족 (예: 채널이 열리지 않은 상태)
    #[error("{0}")]
    Precondition(String),
}

/// 제한 시간 초과
#[derive(Debug, thiserror::Error)]
#[error("{what} not satisfied within {timeout:?} ({attempts} attempts)")]
pub struct TimeoutError {
    /// 기다린 조건 설명
    pub what: String,
    /// 설정된 제한 시간
    pub timeout: Duration,
    /// 조건을 확인한 횟수
    pub attempts: u32,
}

/// VM 또는 셸 채널 준비 실패
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    /// 채널을 열지 못함
    #[error("failed to open channel `{command}`: {reason}")]
    ChannelOpen { command: String, reason: String },

    /// 채널이 예기치 않게 닫힘
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// 호스트 측 프로비저닝 명령 실패
    #[error("provisioning `{command}` failed: {reason}")]
    Provision { command: String, reason: String },

    /// 브라우저 세션을 만들지 못함
    #[error("browser session failed: {0}")]
    Browser(String),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
