//! W3C WebDriver HTTP 클라이언트
//!
//! chromedriver 또는 Selenium 허브와 JSON over HTTP로 통신합니다.
//! 구 JSON Wire 프로토콜 응답(`sessionId`가 최상위, `ELEMENT` 키)도 함께 처리합니다.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};

use adash_core::error::{ActionError, AdashError};
use adash_core::scenario::BoxFuture;

use crate::browser::{Browser, ElementRef};
use crate::selector::Selector;

/// W3C 요소 참조 키
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// 구 JSON Wire 프로토콜 요소 참조 키
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// HTTP 요청 제한 시간 (암묵적 대기보다 길어야 함)
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// 로컬 chrome 기본 인자
pub const LOCAL_CHROME_ARGS: &[&str] = &["--incognito", "disable-infobars", "start-maximized"];

/// 세션 생성 시 요청하는 브라우저 기능
#[derive(Debug, Clone, PartialEq)]
pub struct Capabilities {
    browser_name: String,
    chrome_args: Vec<String>,
    download_dir: Option<PathBuf>,
}

impl Capabilities {
    /// 원격 허브용 기능 (브라우저 이름만 지정)
    pub fn remote(browser: impl Into<String>) -> Self {
        Self {
            browser_name: browser.into(),
            chrome_args: Vec::new(),
            download_dir: None,
        }
    }

    /// 로컬 chrome용 기능 (시크릿 모드, 최대화, 다운로드 디렉토리)
    pub fn local_chrome(download_dir: impl AsRef<Path>) -> Self {
        Self {
            browser_name: "chrome".to_owned(),
            chrome_args: LOCAL_CHROME_ARGS.iter().map(|a| (*a).to_owned()).collect(),
            download_dir: Some(download_dir.as_ref().to_path_buf()),
        }
    }

    /// 브라우저 이름
    pub fn browser_name(&self) -> &str {
        &self.browser_name
    }

    /// `POST /session` 요청 본문을 생성합니다.
    pub fn to_request(&self) -> Value {
        let mut always_match = json!({ "browserName": self.browser_name });
        if !self.chrome_args.is_empty() || self.download_dir.is_some() {
            let mut options = json!({ "args": self.chrome_args });
            if let Some(dir) = &self.download_dir {
                options["prefs"] = json!({
                    "download.default_directory": dir.display().to_string()
                });
            }
            always_match["goog:chromeOptions"] = options;
        }

        json!({
            "capabilities": { "alwaysMatch": always_match },
            "desiredCapabilities": {
                "browserName": self.browser_name,
                "javascriptEnabled": true,
            },
        })
    }
}

/// WebDriver 응답 봉투
#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    value: Value,
    #[serde(rename = "sessionId", default)]
    session_id: Option<String>,
}

/// W3C WebDriver 클라이언트
///
/// 세션 하나를 소유하며, [`Browser::quit`] 호출 시 세션을 삭제합니다.
#[derive(Debug)]
pub struct WebDriverClient {
    http: reqwest::Client,
    base_url: String,
    session_id: Option<String>,
}

impl WebDriverClient {
    /// 새 세션을 생성합니다.
    ///
    /// # Errors
    ///
    /// 서버에 연결할 수 없거나 세션 생성이 거부되면 [`ActionError::WebDriver`]를 반환합니다.
    pub async fn new_session(base_url: &str, capabilities: &Capabilities) -> Result<Self, AdashError> {
        let mut client = Self {
            http: build_http_client()?,
            base_url: base_url.trim_end_matches('/').to_owned(),
            session_id: None,
        };

        let response = client
            .call(
                Method::POST,
                "/session",
                Some(capabilities.to_request()),
                "new session",
            )
            .await?;

        let session_id = response
            .value
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .or(response.session_id)
            .ok_or_else(|| ActionError::WebDriver {
                command: "new session".to_owned(),
                reason: "response has no sessionId".to_owned(),
            })?;

        tracing::info!(
            base_url = %client.base_url,
            session_id = %session_id,
            browser = capabilities.browser_name(),
            "webdriver session created"
        );
        client.session_id = Some(session_id);
        Ok(client)
    }

    /// 서버가 새 세션을 받을 준비가 되었는지 확인합니다 (`GET /status`).
    pub async fn is_ready(base_url: &str) -> bool {
        let Ok(http) = build_http_client() else {
            return false;
        };
        let url = format!("{}/status", base_url.trim_end_matches('/'));
        let Ok(response) = http.get(&url).send().await else {
            return false;
        };
        let Ok(body) = response.json::<WireResponse>().await else {
            return false;
        };
        body.value
            .get("ready")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// 현재 세션 id
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// 서버 주소
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 암묵적 대기 시간을 설정합니다.
    pub async fn set_implicit_wait(&self, wait: Duration) -> Result<(), AdashError> {
        let path = self.session_path("/timeouts")?;
        let ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
        self.call(Method::POST, &path, Some(json!({ "implicit": ms })), "set timeouts")
            .await?;
        Ok(())
    }

    /// 세션을 삭제합니다. 세션이 없으면 아무것도 하지 않습니다.
    pub async fn delete_session(&mut self) -> Result<(), AdashError> {
        let Some(session_id) = self.session_id.take() else {
            return Ok(());
        };
        let path = format!("/session/{session_id}");
        self.call(Method::DELETE, &path, None, "delete session").await?;
        tracing::info!(session_id = %session_id, "webdriver session deleted");
        Ok(())
    }

    /// 페이지를 이동합니다.
    pub async fn navigate(&self, url: &str) -> Result<(), AdashError> {
        let path = self.session_path("/url")?;
        self.call(Method::POST, &path, Some(json!({ "url": url })), "navigate")
            .await?;
        Ok(())
    }

    /// 첫 번째 일치 요소를 찾습니다. 없으면 `None`.
    pub async fn find_element(&self, selector: &Selector) -> Result<Option<ElementRef>, AdashError> {
        let path = self.session_path("/element")?;
        let (using, value) = selector.strategy();
        let body = json!({ "using": using, "value": value });

        match self.call(Method::POST, &path, Some(body), "find element").await {
            Ok(response) => parse_element(&response.value).map(Some).ok_or_else(|| {
                ActionError::WebDriver {
                    command: "find element".to_owned(),
                    reason: format!("malformed element reference for {selector}"),
                }
                .into()
            }),
            Err(AdashError::Action(ActionError::ElementNotFound { .. })) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 요소 표시 여부
    pub async fn is_displayed(&self, element: &ElementRef) -> Result<bool, AdashError> {
        self.element_bool(element, "displayed").await
    }

    /// 요소 활성화 여부
    pub async fn is_enabled(&self, element: &ElementRef) -> Result<bool, AdashError> {
        self.element_bool(element, "enabled").await
    }

    /// 요소를 클릭합니다.
    pub async fn click(&self, element: &ElementRef) -> Result<(), AdashError> {
        let path = self.session_path(&format!("/element/{}/click", element.id()))?;
        self.call(Method::POST, &path, Some(json!({})), "element click")
            .await?;
        Ok(())
    }

    /// 요소에 텍스트를 입력합니다.
    pub async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), AdashError> {
        let path = self.session_path(&format!("/element/{}/value", element.id()))?;
        self.call(
            Method::POST,
            &path,
            Some(json!({ "text": text })),
            "element send keys",
        )
        .await?;
        Ok(())
    }

    /// 요소의 표시 텍스트
    pub async fn text(&self, element: &ElementRef) -> Result<String, AdashError> {
        let path = self.session_path(&format!("/element/{}/text", element.id()))?;
        let response = self.call(Method::GET, &path, None, "element text").await?;
        Ok(response.value.as_str().unwrap_or_default().to_owned())
    }

    async fn element_bool(&self, element: &ElementRef, property: &str) -> Result<bool, AdashError> {
        let path = self.session_path(&format!("/element/{}/{property}", element.id()))?;
        let command = format!("element {property}");
        let response = self.call(Method::GET, &path, None, &command).await?;
        response.value.as_bool().ok_or_else(|| {
            ActionError::WebDriver {
                command,
                reason: format!("expected boolean, got {}", response.value),
            }
            .into()
        })
    }

    fn session_path(&self, suffix: &str) -> Result<String, AdashError> {
        let session_id = self.session_id.as_deref().ok_or_else(|| {
            ActionError::Precondition("webdriver session is not active".to_owned())
        })?;
        Ok(format!("/session/{session_id}{suffix}"))
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        command: &str,
    ) -> Result<WireResponse, AdashError> {
        let url = format!("{}{path}", self.base_url);
        tracing::trace!(%method, url = %url, command, "webdriver request");

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| ActionError::WebDriver {
            command: command.to_owned(),
            reason: e.to_string(),
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|e| ActionError::WebDriver {
            command: command.to_owned(),
            reason: e.to_string(),
        })?;

        let parsed: WireResponse = if text.trim().is_empty() {
            WireResponse {
                value: Value::Null,
                session_id: None,
            }
        } else {
            serde_json::from_str(&text).map_err(|e| ActionError::WebDriver {
                command: command.to_owned(),
                reason: format!("invalid response (HTTP {status}): {e}"),
            })?
        };

        if let Some(error) = parsed.value.get("error").and_then(Value::as_str) {
            let message = parsed
                .value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default();
            return Err(map_wire_error(command, error, message));
        }
        if !status.is_success() {
            return Err(ActionError::WebDriver {
                command: command.to_owned(),
                reason: format!("HTTP {status}"),
            }
            .into());
        }
        Ok(parsed)
    }
}

impl Browser for WebDriverClient {
    fn navigate<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(WebDriverClient::navigate(self, url))
    }

    fn find_element<'a>(
        &'a self,
        selector: &'a Selector,
    ) -> BoxFuture<'a, Result<Option<ElementRef>, AdashError>> {
        Box::pin(WebDriverClient::find_element(self, selector))
    }

    fn is_displayed<'a>(
        &'a self,
        element: &'a ElementRef,
    ) -> BoxFuture<'a, Result<bool, AdashError>> {
        Box::pin(WebDriverClient::is_displayed(self, element))
    }

    fn is_enabled<'a>(&'a self, element: &'a ElementRef) -> BoxFuture<'a, Result<bool, AdashError>> {
        Box::pin(WebDriverClient::is_enabled(self, element))
    }

    fn click<'a>(&'a self, element: &'a ElementRef) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(WebDriverClient::click(self, element))
    }

    fn send_keys<'a>(
        &'a self,
        element: &'a ElementRef,
        text: &'a str,
    ) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(WebDriverClient::send_keys(self, element, text))
    }

    fn text<'a>(&'a self, element: &'a ElementRef) -> BoxFuture<'a, Result<String, AdashError>> {
        Box::pin(WebDriverClient::text(self, element))
    }

    fn quit(&mut self) -> BoxFuture<'_, Result<(), AdashError>> {
        Box::pin(self.delete_session())
    }
}

fn build_http_client() -> Result<reqwest::Client, AdashError> {
    reqwest::Client::builder()
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| {
            ActionError::WebDriver {
                command: "http client".to_owned(),
                reason: e.to_string(),
            }
            .into()
        })
}

fn parse_element(value: &Value) -> Option<ElementRef> {
    value
        .get(ELEMENT_KEY)
        .or_else(|| value.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(|id| ElementRef(id.to_owned()))
}

/// W3C 에러 코드를 에러 분류로 변환합니다.
fn map_wire_error(command: &str, error: &str, message: &str) -> AdashError {
    match error {
        "no such element" | "stale element reference" => ActionError::ElementNotFound {
            selector: format!("{command}: {message}"),
        }
        .into(),
        _ => ActionError::WebDriver {
            command: command.to_owned(),
            reason: format!("{error}: {message}"),
        }
        .into(),
    }
}
