use serde::Deserialize;
use std::path::PathBuf;

const CONFIG_FILE: &str = "config/helper";

#[derive(Debug, Deserialize, Clone)]
pub struct HelperConfig {
    /// Address the HTTP server listens on
    pub bind_addr: String,
    /// Directory holding settings.yaml, services.yaml and friends
    pub config_dir: PathBuf,
}

/// Defaults, then `config/helper.{toml,yaml,...}` if present, then `HELPER_*`
/// environment variables.
pub fn load_helper_config() -> anyhow::Result<HelperConfig> {
    load_helper_config_from(CONFIG_FILE)
}

pub fn load_helper_config_from(file_stem: &str) -> anyhow::Result<HelperConfig> {
    let settings = config::Config::builder()
        .set_default("bind_addr", "0.0.0.0:8080")?
        .set_default("config_dir", "../config")?
        .add_source(config::File::with_name(file_stem).required(false))
        .add_source(config::Environment::with_prefix("HELPER"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
