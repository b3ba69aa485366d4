//! Dashboard UI flow: the fixed locate-wait-click sequence, interleaved
//! with kubectl verification inside the VM.

use std::sync::Arc;

use crate::helpers::config::*;
use crate::helpers::mock_infra::*;
use crate::helpers::mock_shell::*;

use adash_core::scenario::StepStatus;
use adash_regression::suite::RegressionSuite;
use adash_ui::dashboard::{INSTALLATIONS_TAB, OPERATORS_TAB, xpath};

fn click(xpath: &str) -> String {
    format!("ui: click {xpath}")
}

/// Deploy operator, verify, deploy CHI, verify, delete both, verify.
#[tokio::test(start_paused = true)]
async fn test_e2e_full_dashboard_flow() {
    let config = TestConfigBuilder::new().only(&["k3s"]).build();
    let infra = MockInfrastructure::new();
    let journal = infra.journal();

    let report = RegressionSuite::new(config, Arc::new(infra)).run().await;
    assert!(report.all_passed(), "failure: {:?}", report.outcomes[0].error);

    let operators_tab = click(&xpath::nav_link(OPERATORS_TAB));
    let installations_tab = click(&xpath::nav_link(INSTALLATIONS_TAB));
    let add = click(xpath::ADD_BUTTON);
    let namespace_toggle = click(xpath::NAMESPACE_TOGGLE);
    let deploy = click(&xpath::modal_button("Deploy"));
    let delete_confirm = click(&xpath::modal_button("Delete"));
    let delete_item = click(&xpath::dropdown_item("Delete"));
    let expected = [
        "ui: navigate http://localhost:8081".to_owned(),
        // operator
        operators_tab.clone(),
        add.clone(),
        namespace_toggle.clone(),
        click(&xpath::menu_item("kube-system")),
        deploy.clone(),
        "vm: sudo k3s kubectl get pods --namespace kube-system".to_owned(),
        // CHI: 예제 먼저, namespace는 그 다음
        installations_tab.clone(),
        add,
        click(xpath::EXAMPLE_TOGGLE),
        click(&xpath::menu_item("01-simple-layout-01-1shard-1repl.yaml")),
        namespace_toggle,
        click(&xpath::menu_item("default")),
        deploy,
        "vm: sudo k3s kubectl get chi --namespace default".to_owned(),
        // 삭제
        installations_tab,
        click(&xpath::row_actions_toggle("simple-01")),
        delete_item.clone(),
        delete_confirm.clone(),
        "vm: sudo k3s kubectl get chi --namespace default".to_owned(),
        operators_tab,
        click(&xpath::row_actions_toggle("kube-system")),
        delete_item,
        delete_confirm,
        "vm: sudo k3s kubectl get pods --namespace kube-system".to_owned(),
    ];
    let expected: Vec<&str> = expected.iter().map(String::as_str).collect();
    journal.assert_in_order(&expected);
}

/// The CHI never completes: verification times out, deletion is skipped,
/// teardown still runs.
#[tokio::test(start_paused = true)]
async fn test_e2e_chi_never_completes() {
    let config = TestConfigBuilder::new().only(&["k3s"]).build();
    let script = ShellScript::new()
        .reply("get pods", 0, PODS_RUNNING)
        .reply("get chi", 0, CHI_IN_PROGRESS);
    let infra = MockInfrastructure::new().script("K3sOnVagrant", script);
    let journal = infra.journal();

    let report = RegressionSuite::new(config, Arc::new(infra)).run().await;

    let outcome = &report.outcomes[0];
    let cause = outcome.error.as_ref().expect("verification fails");
    assert_eq!(cause.step, "verify chi");
    assert_eq!(cause.kind, "timeout");
    assert!(cause.message.contains("chi simple-01 completed"));

    let delete_chi = outcome
        .steps
        .iter()
        .find(|s| s.name == "delete chi")
        .expect("step is recorded");
    assert_eq!(delete_chi.status, StepStatus::Skipped);
    assert!(!journal.contains(&click(&xpath::row_actions_toggle("simple-01"))));

    assert_eq!(journal.count("ui: quit"), 1);
    assert_eq!(journal.count("vm: close"), 1);
    assert_eq!(journal.count("host: vagrant halt @ K3sOnVagrant"), 1);
}

/// The operator pod never goes away after deletion.
#[tokio::test(start_paused = true)]
async fn test_e2e_operator_not_removed() {
    let config = TestConfigBuilder::new().only(&["microk8s"]).build();
    let script = ShellScript::new()
        .reply("get pods", 0, PODS_RUNNING)
        .reply("get chi", 0, CHI_COMPLETED)
        .reply("get chi", 0, NO_CHI);
    let infra = MockInfrastructure::new().script("microK8SOnVagrant", script);

    let report = RegressionSuite::new(config, Arc::new(infra)).run().await;

    let cause = report.outcomes[0].error.as_ref().expect("removal fails");
    assert_eq!(cause.step, "verify operator removed");
    assert_eq!(cause.kind, "timeout");
    let passed: Vec<&str> = report.outcomes[0]
        .steps
        .iter()
        .filter(|s| s.status == StepStatus::Passed)
        .map(|s| s.name.as_str())
        .collect();
    assert!(passed.contains(&"delete operator"));
    assert!(passed.contains(&"cleanup cluster"));
}

/// The operator namespace is per-environment data.
#[tokio::test(start_paused = true)]
async fn test_e2e_custom_operator_namespace() {
    let config = TestConfigBuilder::new()
        .only(&["k3s"])
        .edit_env("k3s", |env| env.namespace = "clickhouse-system".to_owned())
        .build();
    let infra = MockInfrastructure::new();
    let journal = infra.journal();

    let report = RegressionSuite::new(config, Arc::new(infra)).run().await;

    assert!(report.all_passed(), "failure: {:?}", report.outcomes[0].error);
    let select = click(&xpath::menu_item("clickhouse-system"));
    let row = click(&xpath::row_actions_toggle("clickhouse-system"));
    journal.assert_in_order(&[
        select.as_str(),
        "vm: sudo k3s kubectl get pods --namespace clickhouse-system",
        row.as_str(),
    ]);
    assert!(!journal.contains(&click(&xpath::menu_item("kube-system"))));
}

/// A custom CHI name and namespace flow through the UI and kubectl.
#[tokio::test(start_paused = true)]
async fn test_e2e_custom_chi_target() {
    let config = TestConfigBuilder::new()
        .only(&["k0s"])
        .chi("repl-05", "analytics")
        .build();
    let script = ShellScript::new()
        .reply("get pods", 0, PODS_RUNNING)
        .reply("get pods", 0, PODS_WITHOUT_OPERATOR)
        .reply(
            "get chi",
            0,
            "NAME      CLUSTERS   HOSTS   STATUS      AGE\nrepl-05   1          2       Completed   1m",
        )
        .reply("get chi", 0, "No resources found in analytics namespace.");
    let infra = MockInfrastructure::new().script("K0sOnVagrant", script);
    let journal = infra.journal();

    let report = RegressionSuite::new(config, Arc::new(infra)).run().await;

    assert!(report.all_passed(), "failure: {:?}", report.outcomes[0].error);
    let select = click(&xpath::menu_item("analytics"));
    let row = click(&xpath::row_actions_toggle("repl-05"));
    journal.assert_in_order(&[
        select.as_str(),
        "vm: sudo k0s kubectl get chi --namespace analytics",
        row.as_str(),
    ]);
}
