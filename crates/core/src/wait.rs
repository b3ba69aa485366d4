//! 조건 대기: 고정 간격 폴링과 제한 시간
//!
//! 비동기로 렌더링되는 UI나 기동 중인 클러스터처럼 "언젠가 준비되는" 대상을
//! 고정 sleep 대신 폴링으로 기다립니다.
//!
//! # 타이밍
//! - 첫 확인은 즉시 수행합니다.
//! - 조건이 충족되면 다음 폴링에서 바로 반환합니다 (최대 한 간격 지연).
//! - 제한 시간이 지나면 마지막 sleep 이후 다시 확인하지 않고
//!   [`TimeoutError`]를 반환합니다.
//! - 한 번의 확인이 마감을 넘겨 진행 중이면 기다리지 않고 마감 시점에
//!   [`TimeoutError`]를 반환합니다.
//!
//! 예: `timeout = 2s`, `poll_interval = 1s`이면 t=0, t=1에서 두 번 확인하고
//! t=2에 실패합니다.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{AdashError, TimeoutError};

/// 기본 폴링 간격
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// 기본 제한 시간
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// 제한 시간을 더하면 `Instant` 범위를 넘을 때 사용하는 마감 (약 30년)
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// 대기 정책 (제한 시간 + 폴링 간격)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// 제한 시간
    pub timeout: Duration,
    /// 폴링 간격
    pub poll_interval: Duration,
}

impl WaitPolicy {
    /// 새 대기 정책을 생성합니다.
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// 폴링 간격은 유지하고 제한 시간만 바꿉니다.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

/// 조건이 충족될 때까지 폴링합니다.
///
/// `probe`는 준비되면 `Ok(Some(value))`, 아직이면 `Ok(None)`을 반환합니다.
/// `probe`가 반환한 에러는 즉시 전파합니다 (재시도하지 않음).
///
/// # Errors
///
/// 제한 시간 내에 `Some`이 반환되지 않으면 [`AdashError::Timeout`]을 반환합니다.
pub async fn wait_until<T, F, Fut>(
    what: &str,
    policy: WaitPolicy,
    mut probe: F,
) -> Result<T, AdashError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, AdashError>>,
{
    let deadline = deadline_after(Instant::now(), policy.timeout);
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        // 확인 자체가 마감을 넘기면 그 시점에 시간 초과로 처리
        let Ok(result) = tokio::time::timeout_at(deadline, probe()).await else {
            tracing::debug!(what, attempts, "probe still running at deadline");
            break;
        };
        if let Some(value) = result? {
            tracing::trace!(what, attempts, "condition satisfied");
            return Ok(value);
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        tracing::trace!(what, attempts, "condition not yet satisfied, polling again");
        let remaining = deadline - now;
        tokio::time::sleep(policy.poll_interval.min(remaining)).await;
        if Instant::now() >= deadline {
            break;
        }
    }

    tracing::debug!(what, attempts, timeout = ?policy.timeout, "wait timed out");
    Err(TimeoutError {
        what: what.to_owned(),
        timeout: policy.timeout,
        attempts,
    }
    .into())
}

/// `start + timeout`. 범위를 넘으면 [`FAR_FUTURE`]로 제한합니다.
fn deadline_after(start: Instant, timeout: Duration) -> Instant {
    start
        .checked_add(timeout)
        .unwrap_or_else(|| start + FAR_FUTURE)
}
