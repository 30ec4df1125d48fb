use std::sync::Arc;

use crate::config::Config;
use crate::repository::WalletStore;
use crate::services::WalletEngine;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: WalletEngine,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn WalletStore>) -> Self {
        let config = Arc::new(config);
        Self {
            engine: WalletEngine::new(store, config.clone()),
            config,
        }
    }
}
