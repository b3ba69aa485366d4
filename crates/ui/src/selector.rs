//! 요소 셀렉터
//!
//! W3C WebDriver의 위치 전략(`css selector`, `xpath`, `link text`)으로 변환됩니다.
//! id 셀렉터는 W3C에 별도 전략이 없으므로 `[id="..."]` CSS로 변환합니다.

use std::borrow::Cow;
use std::fmt;

/// 요소 셀렉터
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// CSS 셀렉터
    Css(String),
    /// XPath 표현식
    XPath(String),
    /// 요소 id
    Id(String),
    /// 링크 텍스트 (정확히 일치)
    LinkText(String),
}

impl Selector {
    /// CSS 셀렉터를 생성합니다.
    pub fn css(value: impl Into<String>) -> Self {
        Self::Css(value.into())
    }

    /// XPath 셀렉터를 생성합니다.
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::XPath(value.into())
    }

    /// id 셀렉터를 생성합니다.
    pub fn id(value: impl Into<String>) -> Self {
        Self::Id(value.into())
    }

    /// 링크 텍스트 셀렉터를 생성합니다.
    pub fn link_text(value: impl Into<String>) -> Self {
        Self::LinkText(value.into())
    }

    /// 문자열에서 셀렉터를 추론합니다.
    ///
    /// `/` 또는 `(`로 시작하면 XPath, 그 외에는 CSS로 취급합니다.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim_start();
        if trimmed.starts_with('/') || trimmed.starts_with('(') {
            Self::XPath(raw.to_owned())
        } else {
            Self::Css(raw.to_owned())
        }
    }

    /// W3C 위치 전략과 값을 반환합니다.
    pub fn strategy(&self) -> (&'static str, Cow<'_, str>) {
        match self {
            Self::Css(v) => ("css selector", Cow::Borrowed(v)),
            Self::XPath(v) => ("xpath", Cow::Borrowed(v)),
            Self::Id(v) => ("css selector", Cow::Owned(format!("[id=\"{v}\"]"))),
            Self::LinkText(v) => ("link text", Cow::Borrowed(v)),
        }
    }
}

impl From<&str> for Selector {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(v) => write!(f, "css={v}"),
            Self::XPath(v) => write!(f, "xpath={v}"),
            Self::Id(v) => write!(f, "id={v}"),
            Self::LinkText(v) => write!(f, "link={v}"),
        }
    }
}
