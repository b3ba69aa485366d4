//! Guaranteed teardown: every acquired resource is released exactly once,
//! in reverse order of acquisition, and the first failure stays the
//! reported cause.

use std::sync::Arc;

use crate::helpers::config::*;
use crate::helpers::mock_infra::*;
use crate::helpers::mock_shell::ShellScript;

use adash_core::scenario::StepStatus;
use adash_regression::suite::RegressionSuite;
use adash_ui::dashboard::xpath;

const KIND_DIR: &str = "KindOnVagrant";
const STOP_DASHBOARD: &str = "vm: pkill -f './adash-linux-x86_64 --bindhost 0.0.0.0 -bindport 8081'";

/// Passing kind scenario: cleanup, then browser, dashboard, shell and VM
/// released in reverse order.
#[tokio::test(start_paused = true)]
async fn test_e2e_passing_scenario_releases_in_reverse_order() {
    let config = TestConfigBuilder::new().only(&["kind"]).build();
    let infra = MockInfrastructure::new();
    let journal = infra.journal();

    let report = RegressionSuite::new(config, Arc::new(infra)).run().await;

    let outcome = &report.outcomes[0];
    assert!(outcome.passed(), "unexpected failure: {:?}", outcome.error);
    assert!(outcome.teardown_errors.is_empty());

    journal.assert_in_order(&[
        "host: vagrant up @ KindOnVagrant",
        "vm: open vagrant ssh @ KindOnVagrant",
        "vm: cd /vagrant",
        "vm: kind create cluster",
        "vm: kubectl cluster-info --context kind-kind",
        "vm: ./adash-linux-x86_64 --bindhost 0.0.0.0 -bindport 8081 -notoken &",
        "ui: open chrome",
        "ui: navigate http://localhost:8081",
        "vm: kind delete cluster",
        "ui: quit",
        STOP_DASHBOARD,
        "vm: close",
        "host: vagrant halt @ KindOnVagrant",
    ]);
    assert_eq!(journal.count(STOP_DASHBOARD), 1);
    assert_eq!(
        journal.entries().last().map(String::as_str),
        Some("host: vagrant halt @ KindOnVagrant"),
        "vagrant halt is the last thing that happens"
    );
}

/// A UI failure mid-scenario skips the remaining actions but still runs
/// cleanup and every release once.
#[tokio::test(start_paused = true)]
async fn test_e2e_step_failure_still_releases_everything_once() {
    let config = TestConfigBuilder::new().only(&["kind"]).build();
    let infra = MockInfrastructure::new().fail_click_on(xpath::ADD_BUTTON);
    let journal = infra.journal();

    let report = RegressionSuite::new(config, Arc::new(infra)).run().await;

    let outcome = &report.outcomes[0];
    assert!(!outcome.passed());
    let cause = outcome.error.as_ref().expect("failure is recorded");
    assert_eq!(cause.step, "deploy operator");
    assert_eq!(cause.kind, "action");

    let status_of = |name: &str| {
        outcome
            .steps
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.status)
            .expect("step is recorded")
    };
    assert_eq!(status_of("verify operator"), StepStatus::Skipped);
    assert_eq!(status_of("delete operator"), StepStatus::Skipped);
    assert_eq!(status_of("cleanup cluster"), StepStatus::Passed);

    assert_eq!(journal.count("vm: kind delete cluster"), 1);
    assert_eq!(journal.count("ui: quit"), 1);
    assert_eq!(journal.count(STOP_DASHBOARD), 1);
    assert_eq!(journal.count("vm: close"), 1);
    assert_eq!(journal.count("host: vagrant halt @ KindOnVagrant"), 1);
    assert_eq!(journal.count_prefix("vm: kubectl get pods"), 0);
    journal.assert_in_order(&[
        "vm: kind delete cluster",
        "ui: quit",
        STOP_DASHBOARD,
        "vm: close",
        "host: vagrant halt @ KindOnVagrant",
    ]);
}

/// The shell never opens: no cluster commands, no browser, no cleanup,
/// but the VM is still halted.
#[tokio::test(start_paused = true)]
async fn test_e2e_channel_open_failure_halts_vm() {
    let config = TestConfigBuilder::new().only(&["kind"]).build();
    let infra = MockInfrastructure::new().fail_channel(KIND_DIR);
    let journal = infra.journal();

    let report = RegressionSuite::new(config, Arc::new(infra)).run().await;

    let outcome = &report.outcomes[0];
    let cause = outcome.error.as_ref().expect("failure is recorded");
    assert_eq!(cause.step, "open vm shell");
    assert_eq!(cause.kind, "environment");
    assert!(
        outcome.teardown_errors.is_empty(),
        "cleanup without a shell is skipped, not failed: {:?}",
        outcome.teardown_errors
    );

    assert!(!journal.contains("vm: kind delete cluster"));
    assert_eq!(journal.count_prefix("ui: "), 0);
    assert_eq!(journal.count_prefix("vm: pkill"), 0);
    assert_eq!(journal.count("vm: close"), 0);
    assert_eq!(journal.count("host: vagrant halt @ KindOnVagrant"), 1);
}

/// `vagrant up` itself fails: its release was registered first, so halt
/// still runs.
#[tokio::test(start_paused = true)]
async fn test_e2e_provision_failure_still_halts() {
    let config = TestConfigBuilder::new().only(&["kind"]).build();
    let infra = MockInfrastructure::new().fail_host(KIND_DIR, "vagrant up");
    let journal = infra.journal();

    let report = RegressionSuite::new(config, Arc::new(infra)).run().await;

    let cause = report.outcomes[0].error.as_ref().expect("failure is recorded");
    assert_eq!(cause.step, "provision vm");
    assert_eq!(cause.kind, "environment");
    assert!(cause.message.contains("vagrant up"));

    assert_eq!(
        journal.entries(),
        vec![
            "host: vagrant up @ KindOnVagrant".to_owned(),
            "host: vagrant halt @ KindOnVagrant".to_owned(),
        ]
    );
}

/// A failing release is recorded as a teardown error without replacing
/// the original cause, and later releases still run.
#[tokio::test(start_paused = true)]
async fn test_e2e_failing_release_does_not_mask_cause() {
    let config = TestConfigBuilder::new().only(&["kind"]).build();
    let infra = MockInfrastructure::new()
        .fail_browser()
        .fail_host(KIND_DIR, "vagrant halt");
    let journal = infra.journal();

    let report = RegressionSuite::new(config, Arc::new(infra)).run().await;

    let outcome = &report.outcomes[0];
    let cause = outcome.error.as_ref().expect("failure is recorded");
    assert_eq!(cause.step, "open browser");
    assert_eq!(cause.kind, "environment");

    assert_eq!(outcome.teardown_errors.len(), 1);
    assert_eq!(outcome.teardown_errors[0].step, "release: provision vm");

    // 브라우저는 열리지 않았으므로 quit 없음, 대시보드 종료 후 셸은 닫힘
    assert_eq!(journal.count("ui: quit"), 0);
    journal.assert_in_order(&[STOP_DASHBOARD, "vm: close"]);
    assert_eq!(journal.count(STOP_DASHBOARD), 1);
    assert_eq!(journal.count("vm: close"), 1);
    assert_eq!(journal.count("vm: kind delete cluster"), 1);
}

/// A failing release alone does not fail a scenario whose steps passed.
#[tokio::test(start_paused = true)]
async fn test_e2e_teardown_error_keeps_pass_status() {
    let config = TestConfigBuilder::new().only(&["kind"]).build();
    let infra = MockInfrastructure::new().fail_host(KIND_DIR, "vagrant halt");

    let report = RegressionSuite::new(config, Arc::new(infra)).run().await;

    let outcome = &report.outcomes[0];
    assert!(outcome.passed());
    assert_eq!(outcome.teardown_errors.len(), 1);
    assert!(report.all_passed());
}

/// The dashboard never started: its stop still runs once on the open shell
/// and a non-matching pkill is not a teardown error.
#[tokio::test(start_paused = true)]
async fn test_e2e_dashboard_stop_tolerates_missing_process() {
    let config = TestConfigBuilder::new().only(&["kind"]).build();
    let infra = MockInfrastructure::new().script(
        KIND_DIR,
        ShellScript::healthy_cluster()
            .reply("-notoken &", 127, "adash-linux-x86_64: not found")
            .reply("pkill -f", 1, ""),
    );
    let journal = infra.journal();

    let report = RegressionSuite::new(config, Arc::new(infra)).run().await;

    let outcome = &report.outcomes[0];
    let cause = outcome.error.as_ref().expect("failure is recorded");
    assert_eq!(cause.step, "start dashboard");
    assert!(outcome.teardown_errors.is_empty(), "{:?}", outcome.teardown_errors);

    assert_eq!(journal.count(STOP_DASHBOARD), 1);
    journal.assert_in_order(&[
        "vm: kind delete cluster",
        STOP_DASHBOARD,
        "vm: close",
        "host: vagrant halt @ KindOnVagrant",
    ]);
}
