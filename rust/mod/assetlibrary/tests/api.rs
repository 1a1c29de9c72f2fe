//! HTTP surface of the asset library, driven through the router in-process.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use assetlibrary::events::{ChannelEmitter, EventEmitter};
use assetlibrary::service::AssetLibraryConfig;
use assetlibrary::AssetLibraryModule;
use cdf_core::Module;
use cdf_kv::RedbStore;

struct Harness {
    router: Router,
    events: Arc<ChannelEmitter>,
    _dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let kv = Arc::new(RedbStore::open(&dir.path().join("assetlibrary.redb")).unwrap());
    let events = Arc::new(ChannelEmitter::new(64));
    let emitter: Arc<dyn EventEmitter> = events.clone();
    let module = AssetLibraryModule::new(kv, emitter, AssetLibraryConfig::default());
    Harness {
        router: module.routes(),
        events,
        _dir: dir,
    }
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let body = match body {
        Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
        None => Body::empty(),
    };
    let resp = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// /site1/floor2 and /fleet, devices d1 (both) and d2 (floor2 only),
/// p1 scoped to /site1 and p2 scoped to /site1 + /fleet.
async fn seed(router: &Router) {
    for body in [
        json!({"name": "site1"}),
        json!({"name": "floor2", "parentPath": "/site1"}),
        json!({"name": "fleet"}),
    ] {
        let (status, _) = call(router, "POST", "/groups", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    for body in [
        json!({"deviceId": "d1", "groups": ["/site1/floor2", "/fleet"]}),
        json!({"deviceId": "d2", "groups": ["/site1/floor2"]}),
        json!({"deviceId": "d3", "groups": ["/fleet"]}),
    ] {
        let (status, _) = call(router, "POST", "/devices", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    for body in [
        json!({"policyId": "p1", "type": "ProvisioningTemplate", "document": "{}", "appliesTo": ["/site1"]}),
        json!({"policyId": "p2", "type": "provisioningtemplate", "document": "{}", "appliesTo": ["/site1", "/fleet"]}),
    ] {
        let (status, _) = call(router, "POST", "/policies", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

fn policy_ids(body: &Value) -> Vec<&str> {
    body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["policyId"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_inherited_by_device() {
    let h = harness();
    seed(&h.router).await;

    let (status, body) = call(
        &h.router,
        "GET",
        "/policies/inherited?deviceId=D1&type=provisioningtemplate",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(policy_ids(&body), vec!["p1", "p2"]);
    assert_eq!(body["results"][1]["appliesTo"], json!(["/site1", "/fleet"]));

    let (status, body) = call(
        &h.router,
        "GET",
        "/policies/inherited?deviceId=d2&type=provisioningtemplate",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(policy_ids(&body), vec!["p1"]);

    // d3 reaches p2 through /fleet but nothing covers /site1.
    let (status, body) = call(
        &h.router,
        "GET",
        "/policies/inherited?deviceId=d3&type=provisioningtemplate",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_inherited_by_group_paths() {
    let h = harness();
    seed(&h.router).await;

    let (status, body) = call(
        &h.router,
        "GET",
        "/policies/inherited?groupPaths=/site1/floor2,/fleet",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(policy_ids(&body), vec!["p1", "p2"]);

    let (status, _) = call(
        &h.router,
        "GET",
        "/policies/inherited?groupPaths=/fleet&type=provisioningtemplate",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_inherited_requires_parameters() {
    let h = harness();
    seed(&h.router).await;

    let (status, body) = call(&h.router, "GET", "/policies/inherited", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, _) = call(&h.router, "GET", "/policies/inherited?deviceId=d1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &h.router,
        "GET",
        "/policies/inherited?deviceId=ghost&type=provisioningtemplate",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_policy_crud() {
    let h = harness();
    seed(&h.router).await;

    let (status, body) = call(&h.router, "GET", "/policies/P1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "provisioningtemplate");

    let (status, body) = call(
        &h.router,
        "PATCH",
        "/policies/p1",
        Some(json!({"description": "site wide"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "site wide");

    let (status, body) = call(&h.router, "GET", "/policies?type=provisioningtemplate&limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (status, body) = call(
        &h.router,
        "POST",
        "/policies",
        Some(json!({"policyId": "p1", "type": "t", "document": "d", "appliesTo": ["/site1"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_EXISTS");

    let (status, _) = call(&h.router, "DELETE", "/policies/p1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&h.router, "GET", "/policies/p1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_group_and_membership_routes() {
    let h = harness();
    seed(&h.router).await;

    let (status, body) = call(&h.router, "GET", "/groups/site1/floor2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["groupPath"], "/site1/floor2");
    assert_eq!(body["parentPath"], "/site1");

    let (status, body) = call(&h.router, "PUT", "/devices/d3/groups/site1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["groups"], json!(["/fleet", "/site1"]));

    // Now d3 covers both scope entries of p2.
    let (status, body) = call(
        &h.router,
        "GET",
        "/policies/inherited?deviceId=d3&type=provisioningtemplate",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(policy_ids(&body), vec!["p1", "p2"]);

    let (status, body) = call(&h.router, "DELETE", "/devices/d3/groups/fleet", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["groups"], json!(["/site1"]));

    let (status, body) = call(&h.router, "DELETE", "/groups/site1", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_EXISTS");

    let (status, _) = call(&h.router, "GET", "/groups/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mutations_publish_events() {
    let h = harness();
    let mut rx = h.events.subscribe();

    let (status, _) = call(&h.router, "POST", "/groups", Some(json!({"name": "site1"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(&h.router, "DELETE", "/groups/site1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let created = rx.try_recv().unwrap();
    assert_eq!(created.topic, "cdf/assetlibrary/events/groups/site1/create");
    let deleted = rx.try_recv().unwrap();
    assert_eq!(deleted.topic, "cdf/assetlibrary/events/groups/site1/delete");
    assert!(rx.try_recv().is_err());
}
