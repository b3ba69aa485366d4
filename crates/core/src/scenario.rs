//! 시나리오 실행기: 스텝 순차 실행과 보장된 정리
//!
//! [`Step`]은 컨텍스트를 받아 실행되는 이름 있는 동작 단위이고,
//! [`Scenario`]는 스텝의 순서 있는 목록입니다.
//!
//! # 실행 규칙
//! ```text
//! for step in steps:
//!     실패 이후라면 Teardown 역할이 아닌 스텝은 건너뜀
//!     acquires() == true 이면 실행 전에 release를 등록
//!     run(ctx)
//! 등록된 release를 등록 역순으로 모두 실행
//! ```
//!
//! - 리소스를 확보하는 스텝(`acquires() == true`)의 `release()`는 스텝이
//!   시작되기만 했다면 성공/실패와 관계없이 정확히 한 번 호출됩니다.
//!   따라서 `release()`는 부분적으로만 확보된 상태도 처리해야 합니다.
//! - Teardown 스텝이나 release의 실패는 로그로 남기고 결과에 기록하지만,
//!   원래 실패 원인을 덮어쓰지 않습니다.
//! - 이 계층은 재시도하지 않습니다. 재시도/폴링은 개별 스텝이 담당합니다.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::AdashError;

/// `Send` 가능한 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ─── StepRole ────────────────────────────────────────────────────────

/// 스텝 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepRole {
    /// 환경/리소스 준비 (Given)
    Setup,
    /// 대상 시스템에 대한 동작 (When)
    Action,
    /// 결과 검증 (Then)
    Assertion,
    /// 정리 (Finally): 앞선 스텝이 실패해도 실행됨
    Teardown,
}

impl StepRole {
    /// BDD 키워드
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Setup => "Given",
            Self::Action => "When",
            Self::Assertion => "Then",
            Self::Teardown => "Finally",
        }
    }
}

impl fmt::Display for StepRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Action => write!(f, "action"),
            Self::Assertion => write!(f, "assertion"),
            Self::Teardown => write!(f, "teardown"),
        }
    }
}

// ─── Step Trait ──────────────────────────────────────────────────────

/// 시나리오를 구성하는 스텝
///
/// `C`는 시나리오 범위의 컨텍스트 타입입니다. 스텝 간에 공유할 리소스
/// (셸 채널, 브라우저 세션 등)는 컨텍스트에 저장합니다.
///
/// # 구현 예시
/// ```ignore
/// struct OpenShell;
///
/// impl Step<MyContext> for OpenShell {
///     fn name(&self) -> &str { "open VM shell" }
///     fn role(&self) -> StepRole { StepRole::Setup }
///     fn acquires(&self) -> bool { true }
///
///     fn run<'a>(&'a self, ctx: &'a mut MyContext) -> BoxFuture<'a, Result<(), AdashError>> {
///         Box::pin(async move {
///             ctx.shell = Some(ShellChannel::open("vagrant ssh", timeout).await?);
///             Ok(())
///         })
///     }
///
///     fn release<'a>(&'a self, ctx: &'a mut MyContext) -> BoxFuture<'a, Result<(), AdashError>> {
///         Box::pin(async move {
///             if let Some(mut shell) = ctx.shell.take() {
///                 shell.close().await?;
///             }
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Step<C>: Send + Sync {
    /// 스텝 이름 (로그와 리포트에 사용)
    fn name(&self) -> &str;

    /// 스텝 역할
    fn role(&self) -> StepRole;

    /// 리소스를 확보하는 스텝인지 여부
    ///
    /// `true`이면 실행기가 스텝 시작 전에 `release()`를 등록합니다.
    fn acquires(&self) -> bool {
        false
    }

    /// 스텝을 실행합니다.
    fn run<'a>(&'a self, ctx: &'a mut C) -> BoxFuture<'a, Result<(), AdashError>>;

    /// 확보한 리소스를 해제합니다.
    ///
    /// 시나리오 종료 시 등록 역순으로 호출됩니다.
    fn release<'a>(&'a self, _ctx: &'a mut C) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async { Ok(()) })
    }
}

// ─── Scenario ────────────────────────────────────────────────────────

/// 스텝의 순서 있는 목록
pub struct Scenario<C> {
    name: String,
    steps: Vec<Box<dyn Step<C>>>,
}

impl<C> Scenario<C> {
    /// 빈 시나리오를 생성합니다.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// 스텝을 추가합니다 (builder).
    pub fn step(mut self, step: impl Step<C> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// boxed 스텝을 추가합니다.
    pub fn push(&mut self, step: Box<dyn Step<C>>) {
        self.steps.push(step);
    }

    /// 시나리오 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 스텝 수
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// 스텝이 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 스텝 이름 목록 (순서 유지)
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

// ─── Outcome ─────────────────────────────────────────────────────────

/// 개별 스텝 실행 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// 스텝 실행 기록
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub role: StepRole,
    pub status: StepStatus,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

/// 실패 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    /// 실패한 스텝 (release 실패는 `"release: <스텝 이름>"`)
    pub step: String,
    /// 에러 분류 (`action`, `timeout`, `environment`, ...)
    pub kind: String,
    /// 에러 메시지
    pub message: String,
}

impl StepFailure {
    fn new(step: &str, error: &AdashError) -> Self {
        Self {
            step: step.to_owned(),
            kind: error.kind().to_owned(),
            message: error.to_string(),
        }
    }
}

/// 시나리오 최종 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Passed,
    Failed,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "PASSED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// 시나리오 실행 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub scenario: String,
    pub status: OutcomeStatus,
    /// 시나리오를 실패시킨 원인 (첫 번째 실패)
    pub error: Option<StepFailure>,
    /// 스텝 실행 기록 (선언 순서)
    pub steps: Vec<StepRecord>,
    /// Teardown 스텝 및 release 실패 목록 (결과에는 영향 없음)
    pub teardown_errors: Vec<StepFailure>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl ScenarioOutcome {
    /// 통과 여부
    pub fn passed(&self) -> bool {
        self.status == OutcomeStatus::Passed
    }

    /// 실패 시 외부에서 생성한 결과 (시나리오 구성 자체가 실패한 경우 등)
    pub fn aborted(scenario: impl Into<String>, step: &str, error: &AdashError) -> Self {
        Self {
            scenario: scenario.into(),
            status: OutcomeStatus::Failed,
            error: Some(StepFailure::new(step, error)),
            steps: Vec::new(),
            teardown_errors: Vec::new(),
            duration: Duration::ZERO,
        }
    }
}

// ─── Executor ────────────────────────────────────────────────────────

/// 시나리오를 실행하고 결과를 반환합니다.
///
/// 스텝 에러는 전파하지 않고 [`ScenarioOutcome`]에 기록합니다.
pub async fn run_scenario<C: Send>(scenario: &Scenario<C>, ctx: &mut C) -> ScenarioOutcome {
    let started = Instant::now();
    let name = scenario.name();
    let mut records = Vec::with_capacity(scenario.len());
    let mut failure: Option<StepFailure> = None;
    let mut teardown_errors = Vec::new();
    let mut releases: Vec<usize> = Vec::new();

    tracing::info!(scenario = name, steps = scenario.len(), "scenario started");

    for (idx, step) in scenario.steps.iter().enumerate() {
        let role = step.role();

        if failure.is_some() && role != StepRole::Teardown {
            tracing::warn!(scenario = name, step = step.name(), "skipping step after failure");
            records.push(StepRecord {
                name: step.name().to_owned(),
                role,
                status: StepStatus::Skipped,
                duration: Duration::ZERO,
            });
            continue;
        }

        if step.acquires() {
            releases.push(idx);
        }

        tracing::info!(
            scenario = name,
            step = step.name(),
            keyword = role.keyword(),
            "step started"
        );
        let step_started = Instant::now();
        let result = step.run(ctx).await;
        let duration = step_started.elapsed();

        let status = match result {
            Ok(()) => {
                tracing::info!(
                    scenario = name,
                    step = step.name(),
                    duration_ms = duration.as_millis() as u64,
                    "step passed"
                );
                StepStatus::Passed
            }
            Err(e) if role == StepRole::Teardown => {
                tracing::error!(scenario = name, step = step.name(), error = %e, "teardown step failed");
                teardown_errors.push(StepFailure::new(step.name(), &e));
                StepStatus::Failed
            }
            Err(e) => {
                tracing::error!(scenario = name, step = step.name(), error = %e, "step failed");
                failure = Some(StepFailure::new(step.name(), &e));
                StepStatus::Failed
            }
        };

        records.push(StepRecord {
            name: step.name().to_owned(),
            role,
            status,
            duration,
        });
    }

    // 확보 역순으로 해제
    for idx in releases.into_iter().rev() {
        let step = &scenario.steps[idx];
        tracing::info!(scenario = name, step = step.name(), "releasing");
        if let Err(e) = step.release(ctx).await {
            tracing::error!(scenario = name, step = step.name(), error = %e, "release failed");
            teardown_errors.push(StepFailure::new(&format!("release: {}", step.name()), &e));
        }
    }

    let status = if failure.is_some() {
        OutcomeStatus::Failed
    } else {
        OutcomeStatus::Passed
    };
    let duration = started.elapsed();

    tracing::info!(
        scenario = name,
        status = %status,
        teardown_errors = teardown_errors.len(),
        duration_ms = duration.as_millis() as u64,
        "scenario finished"
    );

    ScenarioOutcome {
        scenario: name.to_owned(),
        status,
        error: failure,
        steps: records,
        teardown_errors,
        duration,
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
