//! 로컬 chromedriver 프로세스 관리
//!
//! `--webdriver` 경로의 chromedriver를 지정 포트로 띄우고, `/status`가
//! 준비 상태를 보고할 때까지 폴링합니다. 프로세스는 drop 시 종료됩니다.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};

use adash_core::error::{AdashError, EnvironmentError};
use adash_core::wait::{WaitPolicy, wait_until};

use crate::webdriver::WebDriverClient;

/// 실행 중인 chromedriver
#[derive(Debug)]
pub struct ChromeDriverProcess {
    path: PathBuf,
    port: u16,
    child: Option<Child>,
}

impl ChromeDriverProcess {
    /// chromedriver를 시작하고 준비될 때까지 기다립니다.
    ///
    /// # Errors
    ///
    /// 실행 파일을 띄울 수 없으면 [`EnvironmentError::Browser`],
    /// 제한 시간 내 준비되지 않으면 [`TimeoutError`](adash_core::error::TimeoutError)를 반환합니다.
    pub async fn start(path: impl AsRef<Path>, port: u16, policy: WaitPolicy) -> Result<Self, AdashError> {
        let path = path.as_ref().to_path_buf();
        tracing::info!(path = %path.display(), port, "starting chromedriver");

        let child = Command::new(&path)
            .arg(format!("--port={port}"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EnvironmentError::Browser(format!(
                    "failed to start webdriver {}: {e}",
                    path.display()
                ))
            })?;

        let process = Self {
            path,
            port,
            child: Some(child),
        };

        let base_url = process.base_url();
        wait_until("chromedriver ready", policy, || {
            let base_url = base_url.clone();
            async move {
                Ok::<_, AdashError>(WebDriverClient::is_ready(&base_url).await.then_some(()))
            }
        })
        .await?;

        tracing::info!(port, "chromedriver ready");
        Ok(process)
    }

    /// WebDriver 서버 주소
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// 실행 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 프로세스를 종료합니다. 이미 종료했으면 아무것도 하지 않습니다.
    pub async fn stop(&mut self) -> Result<(), AdashError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        child.kill().await.map_err(AdashError::Io)?;
        tracing::info!(port = self.port, "chromedriver stopped");
        Ok(())
    }
}
