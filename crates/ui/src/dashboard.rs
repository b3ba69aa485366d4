//! Altinity Dashboard 페이지 흐름
//!
//! PatternFly 기반 UI의 탭, `+` 버튼, 모달, 컨텍스트 셀렉터, 행 액션
//! 드롭다운을 XPath로 조작합니다.
//!
//! # 흐름
//! ```text
//! open ─▶ ClickHouse Operators ─▶ + ─▶ namespace 선택 ─▶ Deploy
//!      └▶ ClickHouse Installations ─▶ + ─▶ 예제 선택 ─▶ namespace 선택 ─▶ Deploy
//! 삭제: 행 ⋮ ─▶ Delete ─▶ 확인 모달 Delete
//! ```

use adash_core::error::AdashError;

use crate::driver::UiDriver;
use crate::selector::Selector;

/// 대시보드 XPath 셀렉터
pub mod xpath {
    /// 열린 모달 상자
    pub const MODAL: &str = "//div[contains(@class,'pf-c-modal-box')]";

    /// 왼쪽 내비게이션 링크
    pub fn nav_link(label: &str) -> String {
        format!("//a[contains(normalize-space(),'{label}')]")
    }

    /// 페이지 상단의 `+` 버튼
    pub const ADD_BUTTON: &str = "//button[normalize-space()='+']";

    /// 모달 하단 버튼
    pub fn modal_button(label: &str) -> String {
        format!("{MODAL}//button[normalize-space()='{label}']")
    }

    /// CHI 예제 선택기 토글
    pub const EXAMPLE_TOGGLE: &str = "//div[contains(@class,'wide-context-selector')]\
        //button[contains(@class,'pf-c-context-selector__toggle')]";

    /// 모달 안의 마지막 컨텍스트 셀렉터 토글 (namespace 선택기)
    pub const NAMESPACE_TOGGLE: &str =
        "(//div[contains(@class,'pf-c-modal-box')]//button[contains(@class,'pf-c-context-selector__toggle')])[last()]";

    /// 열린 컨텍스트 셀렉터 메뉴 항목
    pub fn menu_item(value: &str) -> String {
        format!(
            "//button[contains(@class,'pf-c-context-selector__menu-list-item') \
             and normalize-space()='{value}']"
        )
    }

    /// 특정 셀 값을 가진 테이블 행
    pub fn table_row(cell: &str) -> String {
        format!("//tr[td[normalize-space()='{cell}']]")
    }

    /// 행 액션 드롭다운 토글
    pub fn row_actions_toggle(cell: &str) -> String {
        format!(
            "{}//button[contains(@class,'pf-c-dropdown__toggle')]",
            table_row(cell)
        )
    }

    /// 열린 드롭다운 메뉴 항목
    pub fn dropdown_item(label: &str) -> String {
        format!(
            "//*[contains(@class,'pf-c-dropdown__menu-item') and normalize-space()='{label}']"
        )
    }
}

/// 내비게이션 탭 이름
pub const OPERATORS_TAB: &str = "ClickHouse Operators";
/// 내비게이션 탭 이름
pub const INSTALLATIONS_TAB: &str = "ClickHouse Installations";

/// 대시보드 페이지
pub struct DashboardPage<'a> {
    ui: &'a UiDriver,
    url: &'a str,
}

impl<'a> DashboardPage<'a> {
    pub fn new(ui: &'a UiDriver, url: &'a str) -> Self {
        Self { ui, url }
    }

    /// 대시보드를 열고 내비게이션이 렌더링될 때까지 기다립니다.
    pub async fn open(&self) -> Result<(), AdashError> {
        self.ui.open(self.url).await?;
        self.ui
            .wait_until_visible(&Selector::xpath(xpath::nav_link(OPERATORS_TAB)), None)
            .await?;
        Ok(())
    }

    /// ClickHouse Operators 탭으로 이동합니다.
    pub async fn go_to_operators(&self) -> Result<(), AdashError> {
        self.ui
            .click(&Selector::xpath(xpath::nav_link(OPERATORS_TAB)))
            .await
    }

    /// ClickHouse Installations 탭으로 이동합니다.
    pub async fn go_to_installations(&self) -> Result<(), AdashError> {
        self.ui
            .click(&Selector::xpath(xpath::nav_link(INSTALLATIONS_TAB)))
            .await
    }

    /// 지정 namespace에 ClickHouse Operator를 배포합니다.
    pub async fn deploy_operator(&self, namespace: &str) -> Result<(), AdashError> {
        tracing::info!(namespace, "deploying clickhouse operator via dashboard");
        self.go_to_operators().await?;
        self.ui.click(&Selector::xpath(xpath::ADD_BUTTON)).await?;
        self.select(xpath::NAMESPACE_TOGGLE, namespace).await?;
        self.submit_modal("Deploy").await
    }

    /// 미리 정의된 예제로 CHI를 배포합니다.
    pub async fn deploy_chi(&self, example: &str, namespace: &str) -> Result<(), AdashError> {
        tracing::info!(example, namespace, "deploying clickhouse installation via dashboard");
        self.go_to_installations().await?;
        self.ui.click(&Selector::xpath(xpath::ADD_BUTTON)).await?;
        // 예제를 고르면 편집기 빈 화면이 사라지므로 namespace는 그 다음에 선택
        self.select(xpath::EXAMPLE_TOGGLE, example).await?;
        self.select(xpath::NAMESPACE_TOGGLE, namespace).await?;
        self.submit_modal("Deploy").await
    }

    /// 이름으로 CHI를 삭제합니다.
    pub async fn delete_chi(&self, name: &str) -> Result<(), AdashError> {
        tracing::info!(chi = name, "deleting clickhouse installation via dashboard");
        self.go_to_installations().await?;
        self.delete_row(name).await
    }

    /// namespace의 ClickHouse Operator를 삭제합니다.
    pub async fn delete_operator(&self, namespace: &str) -> Result<(), AdashError> {
        tracing::info!(namespace, "deleting clickhouse operator via dashboard");
        self.go_to_operators().await?;
        self.delete_row(namespace).await
    }

    /// 현재 탭의 테이블에 `cell` 값을 가진 행이 나타날 때까지 기다립니다.
    pub async fn wait_for_row(&self, cell: &str) -> Result<(), AdashError> {
        self.ui
            .wait_until_visible(&Selector::xpath(xpath::table_row(cell)), None)
            .await?;
        Ok(())
    }

    async fn select(&self, toggle: &str, value: &str) -> Result<(), AdashError> {
        self.ui.click(&Selector::xpath(toggle)).await?;
        self.ui
            .click(&Selector::xpath(xpath::menu_item(value)))
            .await
    }

    async fn submit_modal(&self, label: &str) -> Result<(), AdashError> {
        self.ui
            .click(&Selector::xpath(xpath::modal_button(label)))
            .await?;
        self.ui
            .wait_until_absent(&Selector::xpath(xpath::MODAL), None)
            .await
    }

    async fn delete_row(&self, cell: &str) -> Result<(), AdashError> {
        self.ui
            .click(&Selector::xpath(xpath::row_actions_toggle(cell)))
            .await?;
        self.ui
            .click(&Selector::xpath(xpath::dropdown_item("Delete")))
            .await?;
        self.submit_modal("Delete").await
    }
}
