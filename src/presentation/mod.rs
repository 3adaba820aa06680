// Presentation layer - HTTP handlers over the config service
pub mod app_state;
pub mod handlers;
