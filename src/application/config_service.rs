// Config service - Use cases for loading, previewing and publishing the dashboard config
use crate::application::config_store::ConfigStore;
use crate::application::services_parser::{parse, HierarchyParser};
use crate::application::tab_derivation::{derive_tabs, reconcile_tabs};
use crate::application::yaml_generator::{generate_services, generate_settings};
use crate::domain::dashboard::CanonicalModel;
use crate::domain::yaml_node::decode_mapping;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const SETTINGS_FILE: &str = "settings.yaml";
pub const SERVICES_FILE: &str = "services.yaml";
pub const BOOKMARKS_FILE: &str = "bookmarks.yaml";

/// Files the editor reads and may overwrite
pub const KNOWN_FILES: &[&str] = &[
    BOOKMARKS_FILE,
    SERVICES_FILE,
    SETTINGS_FILE,
    "widgets.yaml",
    "docker.yaml",
    "kubernetes.yaml",
    "proxmox.yaml",
    "custom.css",
    "custom.js",
];

const BOOKMARKS_STUB: &str =
    "# Bookmarks migrated to services.yaml by Homepage Config Helper\n[]\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishRequest {
    #[serde(default)]
    pub files: Option<Vec<ConfigFile>>,
    #[serde(default)]
    pub canonical: Option<CanonicalModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFiles {
    pub services_yaml: String,
    pub settings_yaml: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Refusing to write unknown config file: {0}")]
    UnknownFile(String),

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
    // One publish at a time per config directory
    publish_lock: Arc<Mutex<()>>,
}

impl ConfigService {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            publish_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Raw content of every known file, empty when missing
    pub async fn read_files(&self) -> Result<Vec<ConfigFile>, ServiceError> {
        let mut files = Vec::with_capacity(KNOWN_FILES.len());
        for filename in KNOWN_FILES {
            let content = self.store.read_file(filename).await?;
            files.push(ConfigFile {
                filename: filename.to_string(),
                content,
            });
        }
        Ok(files)
    }

    pub async fn load_canonical(&self) -> Result<CanonicalModel, ServiceError> {
        let settings = self.store.read_file(SETTINGS_FILE).await?;
        let services = self.store.read_file(SERVICES_FILE).await?;
        let bookmarks = self.store.read_file(BOOKMARKS_FILE).await?;
        Ok(build_canonical(&settings, &services, &bookmarks))
    }

    /// Generated text for a model, against the settings currently on disk
    pub async fn preview(&self, model: &CanonicalModel) -> Result<GeneratedFiles, ServiceError> {
        let previous_settings = self.store.read_file(SETTINGS_FILE).await?;
        Ok(GeneratedFiles {
            services_yaml: generate_services(model),
            settings_yaml: generate_settings(model, &previous_settings),
        })
    }

    /// Write raw files first, then the files generated from the canonical
    /// model. Returns the names written, in order.
    pub async fn publish(&self, request: PublishRequest) -> Result<Vec<String>, ServiceError> {
        let files = request.files.unwrap_or_default();
        if let Some(unknown) = files
            .iter()
            .find(|f| !KNOWN_FILES.contains(&f.filename.as_str()))
        {
            return Err(ServiceError::UnknownFile(unknown.filename.clone()));
        }

        let _guard = self.publish_lock.lock().await;
        let mut written = Vec::new();

        for file in &files {
            self.store
                .write_file_atomic(&file.filename, &file.content)
                .await?;
            written.push(file.filename.clone());
        }

        if let Some(model) = request.canonical {
            let services_yaml = generate_services(&model);
            let previous_settings = self.store.read_file(SETTINGS_FILE).await?;
            let settings_yaml = generate_settings(&model, &previous_settings);

            let mut generated = vec![
                (SERVICES_FILE, services_yaml.as_str()),
                (SETTINGS_FILE, settings_yaml.as_str()),
            ];
            let bookmarks = self.store.read_file(BOOKMARKS_FILE).await?;
            if bookmarks_migratable(&bookmarks) {
                generated.push((BOOKMARKS_FILE, BOOKMARKS_STUB));
            } else {
                tracing::warn!("bookmarks.yaml was not migrated, leaving it in place");
            }

            for (filename, content) in generated {
                self.store.write_file_atomic(filename, content).await?;
                written.push(filename.to_string());
            }
        }

        tracing::info!(files = ?written, "Published config");
        Ok(written)
    }
}

/// Build a fresh canonical model from raw file text. Bookmarks are parsed
/// with the services rules and appended after the services, unless that
/// would drop some of their entries.
pub fn build_canonical(
    settings_text: &str,
    services_text: &str,
    bookmarks_text: &str,
) -> CanonicalModel {
    let settings = decode_mapping(settings_text);

    let mut parser = HierarchyParser::new(&settings);
    parser.parse_source(services_text.into());
    if bookmarks_migratable(bookmarks_text) {
        parser.parse_source(bookmarks_text.into());
    } else {
        tracing::warn!("bookmarks.yaml has entries that are not services, not migrating it");
    }
    let parsed = parser.finish();

    let mut tabs = derive_tabs(&settings);
    reconcile_tabs(&mut tabs, &parsed.groups);

    CanonicalModel {
        settings,
        tabs,
        groups: parsed.groups,
        services: parsed.services,
    }
}

/// True when every bookmarks entry maps onto a group or a service, so
/// replacing the file with a stub loses nothing.
fn bookmarks_migratable(text: &str) -> bool {
    if text.trim().is_empty() {
        return true;
    }
    match serde_yaml::from_str::<Value>(text) {
        Ok(value) => parse(&value, &Mapping::new()).skipped == 0,
        Err(_) => false,
    }
}
