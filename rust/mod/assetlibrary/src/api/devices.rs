use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};

use cdf_core::{ListParams, ListResult, ServiceError};

use crate::api::AppState;
use crate::api::groups::group_path;
use crate::model::{CreateDevice, Device};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/devices", get(list_devices).post(create_device))
        .route("/devices/{id}", get(get_device).delete(delete_device))
        .route(
            "/devices/{id}/groups/{*path}",
            put(attach_to_group).delete(detach_from_group),
        )
}

async fn list_devices(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<Device>>, ServiceError> {
    Ok(Json(svc.list_devices(&params)?))
}

async fn create_device(
    State(svc): State<AppState>,
    Json(input): Json<CreateDevice>,
) -> Result<(StatusCode, Json<Device>), ServiceError> {
    let device = svc.create_device(input)?;
    Ok((StatusCode::CREATED, Json(device)))
}

async fn get_device(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Device>, ServiceError> {
    Ok(Json(svc.get_device(&id)?))
}

async fn delete_device(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_device(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn attach_to_group(
    State(svc): State<AppState>,
    Path((id, path)): Path<(String, String)>,
) -> Result<Json<Device>, ServiceError> {
    Ok(Json(svc.attach_device_to_group(&id, &group_path(&path))?))
}

async fn detach_from_group(
    State(svc): State<AppState>,
    Path((id, path)): Path<(String, String)>,
) -> Result<Json<Device>, ServiceError> {
    Ok(Json(svc.detach_device_from_group(&id, &group_path(&path))?))
}
