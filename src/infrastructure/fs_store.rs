// Filesystem config store with write-temp-then-rename and timestamped backups
use crate::application::config_store::ConfigStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FsConfigStore {
    config_dir: PathBuf,
}

impl FsConfigStore {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Only bare file names inside the config directory are addressable
    fn path_for(&self, filename: &str) -> Result<PathBuf> {
        let is_plain = !filename.is_empty()
            && Path::new(filename).file_name().and_then(|n| n.to_str()) == Some(filename);
        if !is_plain {
            anyhow::bail!("Invalid config file name: {}", filename);
        }
        Ok(self.config_dir.join(filename))
    }
}

/// `<file>.<YYYY-mm-dd_HHMMSSmmm>.bak` next to the original
pub fn backup_path(path: &Path, now: DateTime<Utc>) -> PathBuf {
    let stamp = now.format("%Y-%m-%d_%H%M%S%3f");
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.{}.bak", name, stamp))
}

#[async_trait]
impl ConfigStore for FsConfigStore {
    async fn read_file(&self, filename: &str) -> Result<String> {
        let path = self.path_for(filename)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn write_file_atomic(&self, filename: &str, content: &str) -> Result<()> {
        let path = self.path_for(filename)?;

        let exists = tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("Failed to check {}", path.display()))?;
        if exists {
            let backup = backup_path(&path, Utc::now());
            tokio::fs::copy(&path, &backup)
                .await
                .with_context(|| format!("Failed to back up {}", path.display()))?;
            tracing::debug!(backup = %backup.display(), "Backed up config file");
        }

        let temp = path.with_file_name(format!("{}.tmp", filename));
        tokio::fs::write(&temp, content)
            .await
            .with_context(|| format!("Failed to write {}", temp.display()))?;
        tokio::fs::rename(&temp, &path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        tracing::info!(file = %path.display(), bytes = content.len(), "Wrote config file");
        Ok(())
    }
}
