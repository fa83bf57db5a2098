use crate::config::settings::AppConfig;
use crate::modules::video::service::JobProcessor;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub processor: Arc<JobProcessor>,
}

impl AppState {
    pub fn new(config: AppConfig, processor: Arc<JobProcessor>) -> Self {
        Self { config, processor }
    }
}
