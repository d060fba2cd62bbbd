use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::services::plugin::PluginBackend;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub backend: Arc<dyn PluginBackend>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config, backend: Arc<dyn PluginBackend>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            backend,
        }
    }
}
