//! Asset library module: groups, devices and the policies they inherit.
//!
//! # Resources
//!
//! - **Group**: node of the group hierarchy, identified by its path (`/site1/floor2`)
//! - **Device**: thing that is a direct member of zero or more groups
//! - **Policy**: typed document that applies to a set of group paths
//!
//! A device inherits a policy when every group in the policy's `appliesTo`
//! is covered by one of the device's group hierarchies, each covering group
//! used at most once.
//!
//! # Usage
//!
//! ```ignore
//! use assetlibrary::{AssetLibraryModule, events::LogEmitter, service::AssetLibraryConfig};
//!
//! let module = AssetLibraryModule::new(kv, Arc::new(LogEmitter), AssetLibraryConfig::default());
//! let router = module.routes(); // Mount under /assetlibrary
//! ```

pub mod api;
pub mod events;
pub mod model;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::Router;

use cdf_core::Module;
use cdf_kv::KVStore;

use crate::events::EventEmitter;
use crate::service::{AssetLibraryConfig, AssetLibraryService};
use crate::store::KvGraphStore;

/// Asset library module implementing the Module trait.
pub struct AssetLibraryModule {
    service: Arc<AssetLibraryService>,
}

impl AssetLibraryModule {
    pub fn new(
        kv: Arc<dyn KVStore>,
        events: Arc<dyn EventEmitter>,
        config: AssetLibraryConfig,
    ) -> Self {
        let store = Arc::new(KvGraphStore::new(kv));
        Self {
            service: AssetLibraryService::new(store, events, config),
        }
    }

    /// Get a reference to the underlying service.
    pub fn service(&self) -> &Arc<AssetLibraryService> {
        &self.service
    }
}

impl Module for AssetLibraryModule {
    fn name(&self) -> &str {
        "assetlibrary"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
