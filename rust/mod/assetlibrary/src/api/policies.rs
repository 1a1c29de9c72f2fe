use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use cdf_core::{ListParams, ListResult, ServiceError};

use crate::api::AppState;
use crate::model::{CreatePolicy, Policy, PolicyModel};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/policies", get(list_policies).post(create_policy))
        .route("/policies/inherited", get(list_inherited))
        .route(
            "/policies/{id}",
            get(get_policy).patch(update_policy).delete(delete_policy),
        )
}

#[derive(Debug, Deserialize)]
struct TypeFilter {
    #[serde(rename = "type")]
    policy_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InheritedQuery {
    device_id: Option<String>,
    /// Comma-separated group paths.
    group_paths: Option<String>,
    #[serde(rename = "type")]
    policy_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct InheritedResponse {
    results: Vec<PolicyModel>,
}

async fn list_policies(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<TypeFilter>,
) -> Result<Json<ListResult<Policy>>, ServiceError> {
    let result = svc.list_policies(filter.policy_type.as_deref(), &params)?;
    Ok(Json(result))
}

async fn create_policy(
    State(svc): State<AppState>,
    Json(input): Json<CreatePolicy>,
) -> Result<(StatusCode, Json<Policy>), ServiceError> {
    let policy = svc.create_policy(input)?;
    Ok((StatusCode::CREATED, Json(policy)))
}

async fn get_policy(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Policy>, ServiceError> {
    Ok(Json(svc.get_policy(&id)?))
}

async fn update_policy(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Policy>, ServiceError> {
    Ok(Json(svc.update_policy(&id, patch)?))
}

async fn delete_policy(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_policy(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Inherited policies for a device, or for an explicit set of group paths.
/// Answers 404 when no candidate is fully in scope.
async fn list_inherited(
    State(svc): State<AppState>,
    Query(query): Query<InheritedQuery>,
) -> Result<Json<InheritedResponse>, ServiceError> {
    let inherited = match (query.device_id, query.group_paths) {
        (Some(device_id), _) => {
            let policy_type = query.policy_type.unwrap_or_default();
            svc.list_inherited_by_device(&device_id, &policy_type)?
        }
        (None, Some(paths)) => {
            let paths: Vec<String> = paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            svc.list_inherited_by_group(&paths, query.policy_type.as_deref())?
        }
        (None, None) => {
            return Err(ServiceError::Validation(
                "either deviceId or groupPaths is required".into(),
            ));
        }
    };

    match inherited {
        Some(results) => Ok(Json(InheritedResponse { results })),
        None => Err(ServiceError::NotFound("no inherited policies found".into())),
    }
}
