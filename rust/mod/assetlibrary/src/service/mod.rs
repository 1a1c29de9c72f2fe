pub mod assembler;
pub mod device;
pub mod group;
pub mod inheritance;
pub mod policy;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::warn;

use crate::events::EventEmitter;
use crate::model::{ChangeEvent, EventType, ObjectType, ROOT_GROUP_PATH};
use crate::store::GraphStore;

/// Asset library service error type.
#[derive(Debug, Error)]
pub enum AssetLibraryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<cdf_kv::KVError> for AssetLibraryError {
    fn from(e: cdf_kv::KVError) -> Self {
        AssetLibraryError::Storage(e.to_string())
    }
}

impl From<AssetLibraryError> for cdf_core::ServiceError {
    fn from(e: AssetLibraryError) -> Self {
        match e {
            AssetLibraryError::NotFound(m) => cdf_core::ServiceError::NotFound(m),
            AssetLibraryError::Conflict(m) => cdf_core::ServiceError::Conflict(m),
            AssetLibraryError::Validation(m) => cdf_core::ServiceError::Validation(m),
            AssetLibraryError::Storage(m) => cdf_core::ServiceError::Storage(m),
            AssetLibraryError::Internal(m) => cdf_core::ServiceError::Internal(m),
        }
    }
}

/// Configuration for the asset library service.
#[derive(Debug, Clone)]
pub struct AssetLibraryConfig {
    /// Topic prefix change events are published under.
    pub events_topic: String,
    /// Upper bound applied to every list page size (default: 500).
    pub max_list_limit: usize,
}

impl Default for AssetLibraryConfig {
    fn default() -> Self {
        Self {
            events_topic: "cdf/assetlibrary/events".to_string(),
            max_list_limit: 500,
        }
    }
}

/// The asset library service. Holds the graph store, the event emitter and
/// configuration.
pub struct AssetLibraryService {
    pub(crate) store: Arc<dyn GraphStore>,
    pub(crate) events: Arc<dyn EventEmitter>,
    pub(crate) config: AssetLibraryConfig,
    /// Serializes mutations so existence and reference checks hold until the write.
    writes: Mutex<()>,
}

impl AssetLibraryService {
    pub fn new(
        store: Arc<dyn GraphStore>,
        events: Arc<dyn EventEmitter>,
        config: AssetLibraryConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            events,
            config,
            writes: Mutex::new(()),
        })
    }

    /// Held by every mutation from its first check to its last write.
    pub(crate) fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish a change event. Failures are logged, never returned: the
    /// mutation that triggered the event has already been committed.
    pub(crate) fn emit(
        &self,
        object_type: ObjectType,
        object_id: &str,
        event: EventType,
        payload: Option<serde_json::Value>,
    ) {
        let change = ChangeEvent {
            object_id: object_id.to_string(),
            object_type,
            event,
            payload,
        };
        let topic = change.topic(&self.config.events_topic);
        if let Err(e) = self.events.publish(&topic, &change) {
            warn!(%topic, error = %e, "failed to publish change event");
        }
    }

    /// Whether a group path names an existing group. The root always exists.
    pub(crate) fn group_exists(&self, path: &str) -> Result<bool, AssetLibraryError> {
        if path == ROOT_GROUP_PATH {
            return Ok(true);
        }
        Ok(self.store.get_group(path)?.is_some())
    }

    pub(crate) fn page_limit(&self, params: &cdf_core::ListParams) -> cdf_core::ListParams {
        cdf_core::ListParams {
            limit: params.limit.min(self.config.max_list_limit),
            offset: params.offset,
        }
    }
}

/// Identifiers are case-insensitive: trim and lower-case before any lookup.
pub(crate) fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Normalize a group path: lower-cased, absolute, no trailing slash.
/// A path made only of slashes is the root.
pub(crate) fn normalize_path(value: &str) -> Result<String, AssetLibraryError> {
    let path = normalize(value);
    if !path.starts_with('/') {
        return Err(AssetLibraryError::Validation(format!(
            "group path '{}' must start with '/'",
            value
        )));
    }
    match path.trim_end_matches('/') {
        "" => Ok(ROOT_GROUP_PATH.to_string()),
        trimmed => Ok(trimmed.to_string()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(" /Site1/Floor2/ ").unwrap(), "/site1/floor2");
        assert_eq!(normalize_path("/").unwrap(), "/");
        assert_eq!(normalize_path("//").unwrap(), "/");
        assert_eq!(normalize_path(" /// ").unwrap(), "/");
        assert!(matches!(
            normalize_path("site1"),
            Err(AssetLibraryError::Validation(_))
        ));
    }

    #[test]
    fn test_error_mapping() {
        let e: cdf_core::ServiceError = AssetLibraryError::NotFound("policy 'p1'".into()).into();
        assert_eq!(e.error_code(), "NOT_FOUND");
        let e: cdf_core::ServiceError = AssetLibraryError::Conflict("dup".into()).into();
        assert_eq!(e.error_code(), "ALREADY_EXISTS");
    }
}
