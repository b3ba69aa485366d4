//! 브라우저 세션 생성
//!
//! - 로컬 모드: chromedriver를 직접 띄우고 chrome 세션을 생성합니다 (chrome 전용).
//! - 원격 모드: Selenium 허브에 1초 간격으로 세션 생성을 재시도합니다.
//!
//! 세션 생성 후 암묵적 대기를 0으로 설정합니다. 요소 대기는 [`crate::UiDriver`]가
//! `global_wait_time` 기준으로 폴링하므로, 서버 측 대기가 있으면 없는 요소를
//! 찾을 때마다 한 번의 확인이 그만큼 지연됩니다.

use std::time::Duration;

use adash_core::config::{BrowserConfig, LOCAL_BROWSERS};
use adash_core::error::{AdashError, EnvironmentError};
use adash_core::scenario::BoxFuture;
use adash_core::wait::{WaitPolicy, wait_until};

use crate::browser::{Browser, ElementRef};
use crate::chromedriver::ChromeDriverProcess;
use crate::selector::Selector;
use crate::webdriver::{Capabilities, WebDriverClient};

/// 허브 세션 생성 재시도 간격
const HUB_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// 브라우저 세션 (WebDriver 세션 + 로컬 드라이버 프로세스)
#[derive(Debug)]
pub struct BrowserSession {
    client: WebDriverClient,
    driver: Option<ChromeDriverProcess>,
}

impl BrowserSession {
    /// 설정에 따라 로컬 또는 원격 세션을 시작합니다.
    ///
    /// # Errors
    ///
    /// - 로컬 모드에서 chrome 이외 브라우저 요청 시 [`EnvironmentError::Browser`]
    /// - 원격 허브가 `session_timeout_secs` 내 세션을 만들지 못하면 [`EnvironmentError::Browser`]
    pub async fn start(config: &BrowserConfig) -> Result<Self, AdashError> {
        let session = if config.local {
            Self::start_local(config).await?
        } else {
            Self::start_remote(config).await?
        };

        session.client.set_implicit_wait(Duration::ZERO).await?;
        tracing::info!(
            wait_secs = config.global_wait_time,
            "implicit wait disabled, elements are polled explicitly"
        );
        Ok(session)
    }

    async fn start_local(config: &BrowserConfig) -> Result<Self, AdashError> {
        if !LOCAL_BROWSERS.contains(&config.browser.as_str()) {
            return Err(EnvironmentError::Browser(format!(
                "local webdriver only supports {}, got '{}'",
                LOCAL_BROWSERS.join(", "),
                config.browser
            ))
            .into());
        }

        let download_dir = std::path::absolute(&config.download_dir)
            .unwrap_or_else(|_| config.download_dir.clone());
        let driver = ChromeDriverProcess::start(
            &config.webdriver_path,
            config.chromedriver_port,
            WaitPolicy::new(config.wait_timeout(), config.poll_interval()),
        )
        .await?;

        // 세션 생성 실패 시 driver는 drop되며 프로세스도 종료됨
        let client =
            WebDriverClient::new_session(&driver.base_url(), &Capabilities::local_chrome(download_dir))
                .await?;

        Ok(Self {
            client,
            driver: Some(driver),
        })
    }

    async fn start_remote(config: &BrowserConfig) -> Result<Self, AdashError> {
        let capabilities = Capabilities::remote(&config.browser);
        let hub_url = config.hub_url.as_str();
        let caps = &capabilities;
        let policy = WaitPolicy::new(
            Duration::from_secs(config.session_timeout_secs),
            HUB_RETRY_INTERVAL,
        );

        tracing::info!(hub = hub_url, browser = %config.browser, "connecting to selenium hub");
        let client = wait_until("selenium hub session", policy, move || async move {
            match WebDriverClient::new_session(hub_url, caps).await {
                Ok(client) => Ok::<_, AdashError>(Some(client)),
                Err(e) => {
                    tracing::debug!(hub = hub_url, error = %e, "hub not ready, retrying");
                    Ok(None)
                }
            }
        })
        .await
        .map_err(|e| match e {
            AdashError::Timeout(timeout) => EnvironmentError::Browser(format!(
                "no session from hub {hub_url}: {timeout}"
            ))
            .into(),
            other => other,
        })?;

        Ok(Self {
            client,
            driver: None,
        })
    }

    /// WebDriver 클라이언트
    pub fn client(&self) -> &WebDriverClient {
        &self.client
    }

    /// 세션을 삭제하고 로컬 드라이버를 종료합니다.
    ///
    /// 세션 삭제가 실패해도 드라이버 종료는 시도하며, 첫 번째 에러를 반환합니다.
    pub async fn close(&mut self) -> Result<(), AdashError> {
        let session_result = self.client.delete_session().await;
        if let Err(e) = &session_result {
            tracing::warn!(error = %e, "failed to delete webdriver session");
        }

        let driver_result = match self.driver.as_mut() {
            Some(driver) => driver.stop().await,
            None => Ok(()),
        };

        session_result.and(driver_result)
    }
}

impl Browser for BrowserSession {
    fn navigate<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(self.client.navigate(url))
    }

    fn find_element<'a>(
        &'a self,
        selector: &'a Selector,
    ) -> BoxFuture<'a, Result<Option<ElementRef>, AdashError>> {
        Box::pin(self.client.find_element(selector))
    }

    fn is_displayed<'a>(
        &'a self,
        element: &'a ElementRef,
    ) -> BoxFuture<'a, Result<bool, AdashError>> {
        Box::pin(self.client.is_displayed(element))
    }

    fn is_enabled<'a>(&'a self, element: &'a ElementRef) -> BoxFuture<'a, Result<bool, AdashError>> {
        Box::pin(self.client.is_enabled(element))
    }

    fn click<'a>(&'a self, element: &'a ElementRef) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(self.client.click(element))
    }

    fn send_keys<'a>(
        &'a self,
        element: &'a ElementRef,
        text: &'a str,
    ) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(self.client.send_keys(element, text))
    }

    fn text<'a>(&'a self, element: &'a ElementRef) -> BoxFuture<'a, Result<String, AdashError>> {
        Box::pin(self.client.text(element))
    }

    fn quit(&mut self) -> BoxFuture<'_, Result<(), AdashError>> {
        Box::pin(self.close())
    }
}
