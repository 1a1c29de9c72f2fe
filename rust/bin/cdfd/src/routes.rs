//! Route registration: module routes plus system endpoints.

use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

/// Build the complete router. Each module is mounted under `/{name}`.
pub fn build_router(module_routes: Vec<(&str, Router)>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    for (name, router) in module_routes {
        app = app.nest(&format!("/{}", name), router);
    }

    app
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "cdfd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
