mod devices;
mod groups;
mod policies;

use std::sync::Arc;

use axum::Router;

use crate::service::AssetLibraryService;

/// Shared application state.
pub type AppState = Arc<AssetLibraryService>;

/// Build the asset library API router.
///
/// Routes are relative; the caller nests them under `/assetlibrary`.
pub fn build_router(svc: Arc<AssetLibraryService>) -> Router {
    Router::new()
        .merge(policies::routes())
        .merge(groups::routes())
        .merge(devices::routes())
        .with_state(svc)
}
