//! 스위트 리포트: 시나리오별 결과 집계

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scenario::ScenarioOutcome;

/// 회귀 스위트 실행 결과
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteReport {
    /// 실행 환경 속성 (도구 버전 등)
    pub attributes: BTreeMap<String, String>,
    /// 시나리오별 결과 (실행 순서)
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    /// 빈 리포트를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 속성을 기록합니다.
    pub fn attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// 시나리오 결과를 추가합니다.
    pub fn record(&mut self, outcome: ScenarioOutcome) {
        self.outcomes.push(outcome);
    }

    /// 통과한 시나리오 수
    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    /// 실패한 시나리오 수
    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.passed_count()
    }

    /// 모든 시나리오가 통과했는지 여부
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }
}
