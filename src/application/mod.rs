// Application layer - Parse, generate and publish use cases
pub mod config_service;
pub mod config_store;
pub mod services_parser;
pub mod tab_derivation;
pub mod yaml_generator;
