// Application state for HTTP handlers
use crate::application::config_service::ConfigService;

#[derive(Clone)]
pub struct AppState {
    pub config_service: ConfigService,
}
