#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`selector`]: CSS/XPath/id 셀렉터와 W3C 위치 전략 변환
//! - [`browser`]: 브라우저 동작 trait ([`Browser`])
//! - [`webdriver`]: W3C WebDriver HTTP 클라이언트
//! - [`chromedriver`]: 로컬 chromedriver 프로세스
//! - [`session`]: 로컬/원격 세션 생성 ([`BrowserSession`])
//! - [`driver`]: 폴링 대기가 포함된 요소 조작 ([`UiDriver`])
//! - [`dashboard`]: Altinity Dashboard 페이지 흐름

pub mod browser;
pub mod chromedriver;
pub mod dashboard;
pub mod driver;
pub mod selector;
pub mod session;
pub mod webdriver;

pub use browser::{Browser, ElementRef};
pub use dashboard::DashboardPage;
pub use driver::UiDriver;
pub use selector::Selector;
pub use session::BrowserSession;
pub use webdriver::{Capabilities, WebDriverClient};
