//! Server-side configuration, read from a TOML file.
//!
//! ```toml
//! [storage]
//! data_dir = "/var/lib/cdf"
//!
//! [events]
//! topic = "cdf/assetlibrary/events"
//!
//! [assetlibrary]
//! max_list_limit = 500
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use assetlibrary::service::AssetLibraryConfig;

/// Directory searched for named contexts.
const CONTEXT_DIR: &str = "/etc/cdf";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub assetlibrary: AssetLibrarySection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the embedded database.
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Topic prefix for change events.
    #[serde(default = "default_topic")]
    pub topic: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { topic: default_topic() }
    }
}

fn default_topic() -> String {
    AssetLibraryConfig::default().events_topic
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetLibrarySection {
    #[serde(default = "default_max_list_limit")]
    pub max_list_limit: usize,
}

impl Default for AssetLibrarySection {
    fn default() -> Self {
        Self {
            max_list_limit: default_max_list_limit(),
        }
    }
}

fn default_max_list_limit() -> usize {
    AssetLibraryConfig::default().max_list_limit
}

impl ServerConfig {
    /// Resolve `-c` to a file. Anything that looks like a path is used as is;
    /// a bare name becomes `/etc/cdf/<name>.toml`.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            Path::new(CONTEXT_DIR).join(format!("{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn assetlibrary_config(&self) -> AssetLibraryConfig {
        AssetLibraryConfig {
            events_topic: self.events.topic.clone(),
            max_list_limit: self.assetlibrary.max_list_limit,
        }
    }
}
