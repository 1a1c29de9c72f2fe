use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use cdf_core::{ListParams, ListResult, ServiceError};

use crate::api::AppState;
use crate::model::{CreateGroup, Group};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/{*path}", get(get_group).delete(delete_group))
}

/// The wildcard capture drops the leading slash of the group path.
pub(crate) fn group_path(captured: &str) -> String {
    format!("/{}", captured.trim_start_matches('/'))
}

async fn list_groups(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<Group>>, ServiceError> {
    Ok(Json(svc.list_groups(&params)?))
}

async fn create_group(
    State(svc): State<AppState>,
    Json(input): Json<CreateGroup>,
) -> Result<(StatusCode, Json<Group>), ServiceError> {
    let group = svc.create_group(input)?;
    Ok((StatusCode::CREATED, Json(group)))
}

async fn get_group(
    State(svc): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<Group>, ServiceError> {
    Ok(Json(svc.get_group(&group_path(&path))?))
}

async fn delete_group(
    State(svc): State<AppState>,
    Path(path): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_group(&group_path(&path))?;
    Ok(StatusCode::NO_CONTENT)
}
