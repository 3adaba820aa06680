//! Structured editor core for Homepage dashboard configs.
//!
//! Translates between the nested `services.yaml` / `settings.yaml` documents
//! and a flat canonical model (tabs, groups, services) that a UI can edit.
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
