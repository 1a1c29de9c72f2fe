//! Startup checks run before any store is opened.

use crate::config::ServerConfig;

/// Refuse to start on a configuration that cannot work.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.storage.data_dir.trim().is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if config.events.topic.trim_matches('/').is_empty() {
        anyhow::bail!("Events topic is empty in configuration.");
    }
    if config.assetlibrary.max_list_limit == 0 {
        anyhow::bail!("assetlibrary.max_list_limit must be greater than zero.");
    }
    Ok(())
}
