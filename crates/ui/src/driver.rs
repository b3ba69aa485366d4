//! UI 드라이버: 폴링 대기가 포함된 요소 조작
//!
//! 비동기로 렌더링되는 대시보드를 다루기 위해 모든 조작은
//! [`wait_until`]로 요소 상태를 확인한 뒤 수행합니다.

use std::time::Duration;

use adash_core::error::{ActionError, AdashError};
use adash_core::wait::{WaitPolicy, wait_until};

use crate::browser::{Browser, ElementRef};
use crate::selector::Selector;

/// 요소 대기 조건
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    /// 화면에 표시됨
    Visible,
    /// 표시되고 활성화됨
    Clickable,
}

/// UI 드라이버
pub struct UiDriver {
    browser: Box<dyn Browser>,
    policy: WaitPolicy,
}

impl UiDriver {
    /// 브라우저와 기본 대기 정책으로 드라이버를 생성합니다.
    pub fn new(browser: Box<dyn Browser>, policy: WaitPolicy) -> Self {
        Self { browser, policy }
    }

    /// 기본 대기 정책
    pub fn policy(&self) -> WaitPolicy {
        self.policy
    }

    /// URL을 엽니다.
    pub async fn open(&self, url: &str) -> Result<(), AdashError> {
        tracing::info!(url, "opening page");
        self.browser.navigate(url).await
    }

    /// 요소를 즉시 찾습니다 (대기 없음).
    ///
    /// # Errors
    ///
    /// 요소가 없으면 [`ActionError::ElementNotFound`]를 반환합니다.
    pub async fn find_element(&self, selector: &Selector) -> Result<ElementRef, AdashError> {
        self.browser.find_element(selector).await?.ok_or_else(|| {
            ActionError::ElementNotFound {
                selector: selector.to_string(),
            }
            .into()
        })
    }

    /// 요소가 표시될 때까지 기다립니다. `timeout`이 없으면 기본 정책을 사용합니다.
    pub async fn wait_until_visible(
        &self,
        selector: &Selector,
        timeout: Option<Duration>,
    ) -> Result<ElementRef, AdashError> {
        self.wait_for(selector, Readiness::Visible, timeout).await
    }

    /// 요소가 표시되고 활성화될 때까지 기다립니다.
    ///
    /// # Errors
    ///
    /// 제한 시간 내 조건이 충족되지 않으면 [`AdashError::Timeout`]을 반환합니다.
    pub async fn wait_until_clickable(
        &self,
        selector: &Selector,
        timeout: Option<Duration>,
    ) -> Result<ElementRef, AdashError> {
        self.wait_for(selector, Readiness::Clickable, timeout).await
    }

    /// 요소가 사라질 때까지 기다립니다.
    pub async fn wait_until_absent(
        &self,
        selector: &Selector,
        timeout: Option<Duration>,
    ) -> Result<(), AdashError> {
        let policy = self.policy_for(timeout);
        let what = format!("element {selector} absent");
        let this = self;
        wait_until(&what, policy, move || async move {
            this.probe(selector, Readiness::Visible)
                .await
                .map(|found| if found.is_some() { None } else { Some(()) })
        })
        .await
    }

    /// 클릭 가능해질 때까지 기다린 뒤 클릭합니다.
    pub async fn click(&self, selector: &Selector) -> Result<(), AdashError> {
        let element = self.wait_until_clickable(selector, None).await?;
        tracing::debug!(selector = %selector, "click");
        self.browser.click(&element).await
    }

    /// 클릭 가능해질 때까지 기다린 뒤 텍스트를 입력합니다.
    pub async fn type_text(&self, selector: &Selector, text: &str) -> Result<(), AdashError> {
        let element = self.wait_until_clickable(selector, None).await?;
        tracing::debug!(selector = %selector, "send keys");
        self.browser.send_keys(&element, text).await
    }

    /// 표시될 때까지 기다린 뒤 텍스트를 읽습니다.
    pub async fn text_of(&self, selector: &Selector) -> Result<String, AdashError> {
        let element = self.wait_until_visible(selector, None).await?;
        self.browser.text(&element).await
    }

    /// 브라우저 세션을 종료합니다.
    pub async fn quit(&mut self) -> Result<(), AdashError> {
        self.browser.quit().await
    }

    async fn wait_for(
        &self,
        selector: &Selector,
        readiness: Readiness,
        timeout: Option<Duration>,
    ) -> Result<ElementRef, AdashError> {
        let policy = self.policy_for(timeout);
        let what = match readiness {
            Readiness::Visible => format!("element {selector} visible"),
            Readiness::Clickable => format!("element {selector} clickable"),
        };
        let this = self;
        wait_until(&what, policy, move || this.probe(selector, readiness)).await
    }

    /// 요소 상태를 한 번 확인합니다.
    ///
    /// 요소가 없거나 폴링 사이에 교체된 경우(stale)는 "아직 아님"으로 취급합니다.
    async fn probe(
        &self,
        selector: &Selector,
        readiness: Readiness,
    ) -> Result<Option<ElementRef>, AdashError> {
        let Some(element) = self.browser.find_element(selector).await? else {
            tracing::trace!(selector = %selector, "element not present");
            return Ok(None);
        };

        match self.is_ready(&element, readiness).await {
            Ok(true) => Ok(Some(element)),
            Ok(false) => Ok(None),
            Err(AdashError::Action(ActionError::ElementNotFound { .. })) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn is_ready(&self, element: &ElementRef, readiness: Readiness) -> Result<bool, AdashError> {
        if !self.browser.is_displayed(element).await? {
            return Ok(false);
        }
        match readiness {
            Readiness::Visible => Ok(true),
            Readiness::Clickable => self.browser.is_enabled(element).await,
        }
    }

    fn policy_for(&self, timeout: Option<Duration>) -> WaitPolicy {
        match timeout {
            Some(timeout) => self.policy.with_timeout(timeout),
            None => self.policy,
        }
    }
}
