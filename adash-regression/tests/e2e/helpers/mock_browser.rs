//! Mock browser for the dashboard UI flow.
//!
//! Every element is present, displayed and enabled, except the modal box,
//! which is always gone, so modal submissions complete immediately.
//! Interactions are recorded as `ui: <action> <xpath>`.

use adash_core::error::{ActionError, AdashError};
use adash_core::scenario::BoxFuture;
use adash_ui::dashboard::xpath;
use adash_ui::{Browser, ElementRef, Selector};

use super::journal::Journal;

pub struct MockBrowser {
    journal: Journal,
    /// Clicking an element whose xpath contains this text fails.
    fail_click_on: Option<String>,
}

impl MockBrowser {
    pub fn new(journal: Journal, fail_click_on: Option<String>) -> Self {
        Self {
            journal,
            fail_click_on,
        }
    }
}

impl Browser for MockBrowser {
    fn navigate<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            self.journal.record(format!("ui: navigate {url}"));
            Ok(())
        })
    }

    fn find_element<'a>(
        &'a self,
        selector: &'a Selector,
    ) -> BoxFuture<'a, Result<Option<ElementRef>, AdashError>> {
        Box::pin(async move {
            let key = selector.strategy().1.into_owned();
            Ok((key != xpath::MODAL).then(|| ElementRef(key)))
        })
    }

    fn is_displayed<'a>(&'a self, _element: &'a ElementRef) -> BoxFuture<'a, Result<bool, AdashError>> {
        Box::pin(async { Ok(true) })
    }

    fn is_enabled<'a>(&'a self, _element: &'a ElementRef) -> BoxFuture<'a, Result<bool, AdashError>> {
        Box::pin(async { Ok(true) })
    }

    fn click<'a>(&'a self, element: &'a ElementRef) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            if let Some(pattern) = &self.fail_click_on {
                if element.id().contains(pattern.as_str()) {
                    return Err(ActionError::WebDriver {
                        command: "element click".to_owned(),
                        reason: "element click intercepted".to_owned(),
                    }
                    .into());
                }
            }
            self.journal.record(format!("ui: click {}", element.id()));
            Ok(())
        })
    }

    fn send_keys<'a>(
        &'a self,
        element: &'a ElementRef,
        text: &'a str,
    ) -> BoxFuture<'a, Result<(), AdashError>> {
        Box::pin(async move {
            self.journal
                .record(format!("ui: keys {} {text}", element.id()));
            Ok(())
        })
    }

    fn text<'a>(&'a self, _element: &'a ElementRef) -> BoxFuture<'a, Result<String, AdashError>> {
        Box::pin(async { Ok(String::new()) })
    }

    fn quit(&mut self) -> BoxFuture<'_, Result<(), AdashError>> {
        Box::pin(async move {
            // 호출마다 기록하여 중복 해제를 잡아낸다
            self.journal.record("ui: quit");
            Ok(())
        })
    }
}
