//! 설정 관리: adash.toml 파싱 및 런타임 설정
//!
//! [`AdashConfig`]는 회귀 테스트 실행에 필요한 모든 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`ADASH_BROWSER_HUB_URL=http://hub:4444/wd/hub` 형식)
//! 3. 설정 파일 (`adash.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), adash_core::error::AdashError> {
//! use adash_core::config::AdashConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = AdashConfig::load("adash.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = AdashConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::environment::{EnvironmentConfig, builtin_environments};
use crate::error::{AdashError, ConfigError};

/// 로컬 WebDriver 모드에서 지원하는 브라우저
pub const LOCAL_BROWSERS: &[&str] = &["chrome"];

/// 원격 허브에서 요청할 수 있는 브라우저
pub const KNOWN_BROWSERS: &[&str] = &["chrome", "firefox", "MicrosoftEdge", "safari"];

/// adash 회귀 테스트 통합 설정
///
/// `adash.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdashConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 브라우저 / WebDriver 설정
    #[serde(default)]
    pub browser: BrowserConfig,
    /// Vagrant VM 설정
    #[serde(default)]
    pub vm: VmConfig,
    /// 대시보드 실행 및 UI 대상 설정
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// 배포판 환경 테이블
    #[serde(default = "builtin_environments")]
    pub environments: Vec<EnvironmentConfig>,
}

impl Default for AdashConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            browser: BrowserConfig::default(),
            vm: VmConfig::default(),
            dashboard: DashboardConfig::default(),
            environments: builtin_environments(),
        }
    }
}

impl AdashConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, AdashError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값에서 시작하여 로드합니다.
    ///
    /// 설정 파일은 선택 사항이므로, 없는 경우 기본값 + 환경변수를 사용합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, AdashError> {
        let path = path.as_ref();
        let mut config = match Self::from_file(path).await {
            Ok(config) => config,
            Err(AdashError::Config(ConfigError::FileNotFound { .. })) => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, AdashError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AdashError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                AdashError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, AdashError> {
        toml::from_str(toml_str).map_err(|e| {
            AdashError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `ADASH_{SECTION}_{FIELD}`
    /// 예: `ADASH_BROWSER_LOCAL=true`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "ADASH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "ADASH_GENERAL_LOG_FORMAT");
        override_string(
            &mut self.general.report_format,
            "ADASH_GENERAL_REPORT_FORMAT",
        );

        // Browser
        override_string(&mut self.browser.browser, "ADASH_BROWSER_BROWSER");
        override_bool(&mut self.browser.local, "ADASH_BROWSER_LOCAL");
        override_path(
            &mut self.browser.webdriver_path,
            "ADASH_BROWSER_WEBDRIVER_PATH",
        );
        override_string(&mut self.browser.hub_url, "ADASH_BROWSER_HUB_URL");
        override_u64(
            &mut self.browser.global_wait_time,
            "ADASH_BROWSER_GLOBAL_WAIT_TIME",
        );
        override_u64(
            &mut self.browser.poll_interval_ms,
            "ADASH_BROWSER_POLL_INTERVAL_MS",
        );
        override_u64(
            &mut self.browser.session_timeout_secs,
            "ADASH_BROWSER_SESSION_TIMEOUT_SECS",
        );
        override_u16(
            &mut self.browser.chromedriver_port,
            "ADASH_BROWSER_CHROMEDRIVER_PORT",
        );

        // VM
        override_path(&mut self.vm.root, "ADASH_VM_ROOT");
        override_string(&mut self.vm.up_command, "ADASH_VM_UP_COMMAND");
        override_string(&mut self.vm.halt_command, "ADASH_VM_HALT_COMMAND");
        override_string(&mut self.vm.connect_command, "ADASH_VM_CONNECT_COMMAND");
        override_string(&mut self.vm.mounted_dir, "ADASH_VM_MOUNTED_DIR");
        override_u64(
            &mut self.vm.provision_timeout_secs,
            "ADASH_VM_PROVISION_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.vm.open_timeout_secs,
            "ADASH_VM_OPEN_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.vm.command_timeout_secs,
            "ADASH_VM_COMMAND_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.vm.cluster_ready_timeout_secs,
            "ADASH_VM_CLUSTER_READY_TIMEOUT_SECS",
        );

        // Dashboard
        override_string(&mut self.dashboard.binary, "ADASH_DASHBOARD_BINARY");
        override_string(&mut self.dashboard.bind_host, "ADASH_DASHBOARD_BIND_HOST");
        override_u16(&mut self.dashboard.bind_port, "ADASH_DASHBOARD_BIND_PORT");
        override_string(&mut self.dashboard.url, "ADASH_DASHBOARD_URL");
        override_string(&mut self.dashboard.chi_example, "ADASH_DASHBOARD_CHI_EXAMPLE");
        override_string(&mut self.dashboard.chi_name, "ADASH_DASHBOARD_CHI_NAME");
        override_string(
            &mut self.dashboard.chi_namespace,
            "ADASH_DASHBOARD_CHI_NAMESPACE",
        );
        override_u64(
            &mut self.dashboard.deploy_timeout_secs,
            "ADASH_DASHBOARD_DEPLOY_TIMEOUT_SECS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), AdashError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        // report_format 검증
        let valid_reports = ["text", "json"];
        if !valid_reports.contains(&self.general.report_format.as_str()) {
            return Err(invalid(
                "general.report_format",
                format!("must be one of: {}", valid_reports.join(", ")),
            ));
        }

        // 브라우저 검증: 로컬 드라이버는 chrome만 지원
        if self.browser.local {
            if !LOCAL_BROWSERS.contains(&self.browser.browser.as_str()) {
                return Err(invalid(
                    "browser.browser",
                    format!("local mode only supports: {}", LOCAL_BROWSERS.join(", ")),
                ));
            }
            if self.browser.webdriver_path.as_os_str().is_empty() {
                return Err(invalid(
                    "browser.webdriver_path",
                    "must not be empty in local mode".to_owned(),
                ));
            }
        } else if !KNOWN_BROWSERS.contains(&self.browser.browser.as_str()) {
            return Err(invalid(
                "browser.browser",
                format!("must be one of: {}", KNOWN_BROWSERS.join(", ")),
            ));
        }

        // 시간 값 검증
        let non_zero = [
            ("browser.global_wait_time", self.browser.global_wait_time),
            ("browser.poll_interval_ms", self.browser.poll_interval_ms),
            (
                "browser.session_timeout_secs",
                self.browser.session_timeout_secs,
            ),
            ("vm.provision_timeout_secs", self.vm.provision_timeout_secs),
            ("vm.open_timeout_secs", self.vm.open_timeout_secs),
            ("vm.command_timeout_secs", self.vm.command_timeout_secs),
            (
                "vm.cluster_ready_timeout_secs",
                self.vm.cluster_ready_timeout_secs,
            ),
            (
                "dashboard.deploy_timeout_secs",
                self.dashboard.deploy_timeout_secs,
            ),
        ];
        for (field, value) in non_zero {
            if value == 0 {
                return Err(invalid(field, "must be greater than 0".to_owned()));
            }
        }

        if self.dashboard.bind_port == 0 {
            return Err(invalid(
                "dashboard.bind_port",
                "must be greater than 0".to_owned(),
            ));
        }

        // 환경 테이블 검증
        let mut seen = HashSet::new();
        for env in &self.environments {
            if env.name.trim().is_empty() {
                return Err(invalid(
                    "environments.name",
                    "must not be empty".to_owned(),
                ));
            }
            if !seen.insert(env.name.as_str()) {
                return Err(invalid(
                    "environments.name",
                    format!("duplicate environment '{}'", env.name),
                ));
            }
            if env.status_command.trim().is_empty() {
                return Err(invalid(
                    "environments.status_command",
                    format!("must not be empty for '{}'", env.name),
                ));
            }
        }

        Ok(())
    }

    /// 활성화된 환경만 반환합니다 (테이블 순서 유지).
    pub fn enabled_environments(&self) -> impl Iterator<Item = &EnvironmentConfig> {
        self.environments.iter().filter(|e| e.enabled)
    }
}

fn invalid(field: &str, reason: String) -> AdashError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 결과 리포트 형식 (text, json)
    pub report_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
            report_format: "text".to_owned(),
        }
    }
}

/// 브라우저 / WebDriver 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// 브라우저 이름
    pub browser: String,
    /// 로컬 WebDriver 사용 여부 (false면 Selenium 허브 사용)
    pub local: bool,
    /// 로컬 WebDriver 실행 파일 경로
    pub webdriver_path: PathBuf,
    /// Selenium 허브 주소
    pub hub_url: String,
    /// 전역 암묵적 대기 시간 및 요소 대기 기본 제한 시간 (초)
    pub global_wait_time: u64,
    /// 요소 상태 폴링 간격 (밀리초)
    pub poll_interval_ms: u64,
    /// 허브 세션 생성 재시도 제한 시간 (초)
    pub session_timeout_secs: u64,
    /// 로컬 chromedriver 포트
    pub chromedriver_port: u16,
    /// 브라우저 다운로드 디렉토리
    pub download_dir: PathBuf,
}

impl BrowserConfig {
    /// 요소 대기 기본 제한 시간
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.global_wait_time)
    }

    /// 폴링 간격
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            browser: "chrome".to_owned(),
            local: false,
            webdriver_path: PathBuf::from("/snap/bin/chromium.chromedriver"),
            hub_url: "http://127.0.0.1:4444/wd/hub".to_owned(),
            global_wait_time: 30,
            poll_interval_ms: 1000,
            session_timeout_secs: 300,
            chromedriver_port: 9515,
            download_dir: PathBuf::from("download"),
        }
    }
}

/// Vagrant VM 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// 배포판별 Vagrant 디렉토리가 위치한 루트
    pub root: PathBuf,
    /// VM 기동 명령 (호스트에서 실행)
    pub up_command: String,
    /// VM 정지 명령 (호스트에서 실행)
    pub halt_command: String,
    /// VM 셸 접속 명령
    pub connect_command: String,
    /// VM 안에서 호스트 디렉토리가 마운트되는 경로
    pub mounted_dir: String,
    /// `up_command`/`halt_command` 제한 시간 (초)
    pub provision_timeout_secs: u64,
    /// 셸 채널 열기 제한 시간 (초)
    pub open_timeout_secs: u64,
    /// 개별 명령 제한 시간 (초)
    pub command_timeout_secs: u64,
    /// 클러스터 준비 대기 제한 시간 (초)
    pub cluster_ready_timeout_secs: u64,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            up_command: "vagrant up".to_owned(),
            halt_command: "vagrant halt".to_owned(),
            connect_command: "vagrant ssh".to_owned(),
            mounted_dir: "/vagrant".to_owned(),
            provision_timeout_secs: 1800,
            open_timeout_secs: 1000,
            command_timeout_secs: 600,
            cluster_ready_timeout_secs: 300,
        }
    }
}

/// 대시보드 실행 및 UI 대상 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// VM 안에서 실행할 대시보드 바이너리
    pub binary: String,
    /// 바인드 호스트
    pub bind_host: String,
    /// 바인드 포트
    pub bind_port: u16,
    /// 호스트 브라우저에서 접속할 주소
    pub url: String,
    /// 배포할 CHI 예제 파일 이름
    pub chi_example: String,
    /// 예제가 생성하는 CHI 이름
    pub chi_name: String,
    /// CHI를 배포할 네임스페이스
    pub chi_namespace: String,
    /// 배포/삭제 결과 확인 제한 시간 (초)
    pub deploy_timeout_secs: u64,
}

impl DashboardConfig {
    /// VM 안에서 대시보드를 백그라운드로 시작하는 명령
    pub fn start_command(&self) -> String {
        format!(
            "{} --bindhost {} -bindport {} -notoken &",
            self.binary, self.bind_host, self.bind_port
        )
    }

    /// [`start_command`](Self::start_command)로 띄운 대시보드를 종료하는 명령
    ///
    /// 같은 셸의 다른 백그라운드 작업(예: k3s server)과 구분하기 위해
    /// 작업 번호 대신 명령줄로 프로세스를 찾습니다.
    pub fn stop_command(&self) -> String {
        format!(
            "pkill -f '{} --bindhost {} -bindport {}'",
            self.binary, self.bind_host, self.bind_port
        )
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            binary: "./adash-linux-x86_64".to_owned(),
            bind_host: "0.0.0.0".to_owned(),
            bind_port: 8081,
            url: "http://localhost:8081".to_owned(),
            chi_example: "01-simple-layout-01-1shard-1repl.yaml".to_owned(),
            chi_name: "simple-01".to_owned(),
            chi_namespace: "default".to_owned(),
            deploy_timeout_secs: 300,
        }
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_path(target: &mut PathBuf, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = PathBuf::from(val);
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
