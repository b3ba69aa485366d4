//! Test configuration builder for E2E tests.
//!
//! Provides [`TestConfigBuilder`] for creating `AdashConfig` instances with
//! a chosen subset of environments and short timeouts.

use adash_core::config::AdashConfig;
use adash_core::environment::EnvironmentConfig;

/// Builder for constructing test-friendly `AdashConfig` instances.
///
/// By default, all five builtin environments are enabled and waits are
/// shortened so failing polls time out quickly on the paused test clock.
#[allow(dead_code)]
pub struct TestConfigBuilder {
    config: AdashConfig,
}

#[allow(dead_code)]
impl TestConfigBuilder {
    pub fn new() -> Self {
        let mut config = AdashConfig::default();
        config.vm.root = "/vagrant-root".into();
        config.browser.global_wait_time = 5;
        config.vm.cluster_ready_timeout_secs = 60;
        config.dashboard.deploy_timeout_secs = 30;
        Self { config }
    }

    /// Keep only the named builtin environments, in table order.
    pub fn only(mut self, names: &[&str]) -> Self {
        self.config
            .environments
            .retain(|env| names.contains(&env.name.as_str()));
        self
    }

    /// Disable the named environment.
    pub fn disable(mut self, name: &str) -> Self {
        for env in &mut self.config.environments {
            if env.name == name {
                env.enabled = false;
            }
        }
        self
    }

    /// Edit one environment entry in place.
    pub fn edit_env(mut self, name: &str, edit: impl FnOnce(&mut EnvironmentConfig)) -> Self {
        if let Some(env) = self
            .config
            .environments
            .iter_mut()
            .find(|env| env.name == name)
        {
            edit(env);
        }
        self
    }

    pub fn chi(mut self, name: &str, namespace: &str) -> Self {
        self.config.dashboard.chi_name = name.to_owned();
        self.config.dashboard.chi_namespace = namespace.to_owned();
        self
    }

    pub fn webdriver_path(mut self, path: &str) -> Self {
        self.config.browser.webdriver_path = path.into();
        self
    }

    pub fn build(self) -> AdashConfig {
        self.config
            .validate()
            .expect("test config should be valid");
        self.config
    }
}
