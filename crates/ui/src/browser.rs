//! 브라우저 추상화
//!
//! [`Browser`] trait은 UI 스텝이 사용하는 최소한의 WebDriver 동작을 정의합니다.
//! 실제 구현은 [`WebDriverClient`](crate::webdriver::WebDriverClient)이며,
//! 테스트에서는 모의 브라우저로 대체합니다.

use serde::{Deserialize, Serialize};

use adash_core::error::AdashError;
use adash_core::scenario::BoxFuture;

use crate::selector::Selector;

/// WebDriver 요소 참조
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef(pub String);

impl ElementRef {
    /// 요소 id 문자열
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// 브라우저 동작 trait
///
/// `find_element`는 요소가 없을 때 에러 대신 `None`을 반환합니다.
/// 폴링 대기가 "아직 없음"과 "실패"를 구분하기 위함입니다.
pub trait Browser: Send + Sync {
    /// URL로 이동합니다.
    fn navigate<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<(), AdashError>>;

    /// 셀렉터에 맞는 첫 번째 요소를 찾습니다.
    fn find_element<'a>(
        &'a self,
        selector: &'a Selector,
    ) -> BoxFuture<'a, Result<Option<ElementRef>, AdashError>>;

    /// 요소가 화면에 표시되는지 확인합니다.
    fn is_displayed<'a>(&'a self, element: &'a ElementRef)
    -> BoxFuture<'a, Result<bool, AdashError>>;

    /// 요소가 활성화되어 있는지 확인합니다.
    fn is_enabled<'a>(&'a self, element: &'a ElementRef) -> BoxFuture<'a, Result<bool, AdashError>>;

    /// 요소를 클릭합니다.
    fn click<'a>(&'a self, element: &'a ElementRef) -> BoxFuture<'a, Result<(), AdashError>>;

    /// 요소에 텍스트를 입력합니다.
    fn send_keys<'a>(
        &'a self,
        element: &'a ElementRef,
        text: &'a str,
    ) -> BoxFuture<'a, Result<(), AdashError>>;

    /// 요소의 표시 텍스트를 반환합니다.
    fn text<'a>(&'a self, element: &'a ElementRef) -> BoxFuture<'a, Result<String, AdashError>>;

    /// 세션을 종료합니다. 여러 번 호출해도 안전해야 합니다.
    fn quit(&mut self) -> BoxFuture<'_, Result<(), AdashError>>;
}
