#![doc = include_str!("../README.md")]

pub mod config;
pub mod environment;
pub mod error;
pub mod report;
pub mod scenario;
pub mod wait;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ActionError, AdashError, ConfigError, EnvironmentError, TimeoutError};

// 설정
pub use config::AdashConfig;
pub use environment::{DistributionKind, EnvironmentConfig};

// 시나리오
pub use scenario::{
    BoxFuture, OutcomeStatus, Scenario, ScenarioOutcome, Step, StepFailure, StepRole, StepStatus,
    run_scenario,
};

// 대기
pub use wait::{WaitPolicy, wait_until};

// 리포트
pub use report::SuiteReport;
