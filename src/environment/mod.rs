pub mod config;
pub mod history;
pub mod mock;
pub mod model;

use std::sync::Arc;

pub use config::SearchConfig;
pub use history::{Location, LocationChange, MemoryHistory, NavigationHost};
pub use model::{HttpResourceApi, ResourceApi};

/// Everything a reducer may talk to besides its own state
#[derive(Clone)]
pub struct Environment {
    pub api: Arc<dyn ResourceApi>,
    pub navigation: Arc<dyn NavigationHost>,
    pub config: SearchConfig,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("config", &self.config)
            .finish()
    }
}

impl Environment {
    pub fn new(
        api: Arc<dyn ResourceApi>,
        navigation: Arc<dyn NavigationHost>,
        config: SearchConfig,
    ) -> Self {
        Self {
            api,
            navigation,
            config,
        }
    }

    /// Talks to the portal configured in `config`
    pub fn http(config: SearchConfig, navigation: Arc<dyn NavigationHost>) -> Self {
        let api = HttpResourceApi::new(&config.base_url, config.endpoints.clone());
        Self::new(Arc::new(api), navigation, config)
    }
}
