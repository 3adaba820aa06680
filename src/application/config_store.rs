// Storage trait for the homepage config directory
use async_trait::async_trait;

#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read a config file by name. A missing file reads as empty text.
    async fn read_file(&self, filename: &str) -> anyhow::Result<String>;

    /// Replace a config file so readers never observe a partial write
    async fn write_file_atomic(&self, filename: &str, content: &str) -> anyhow::Result<()>;
}
