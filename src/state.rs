use std::sync::Arc;

use crate::backend::BackendClient;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn BackendClient>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(backend: Arc<dyn BackendClient>, config: AppConfig) -> Self {
        Self {
            backend,
            config: Arc::new(config),
        }
    }
}
