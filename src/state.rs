use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Datastore;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Datastore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: Arc<dyn Datastore>, config: AppConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}
