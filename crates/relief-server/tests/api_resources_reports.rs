mod common;

use axum::http::{Method, StatusCode};
use common::{create_disaster, send, test_state};
use relief_server::app;
use serde_json::json;

#[tokio::test]
async fn resource_requires_name_and_coordinates() {
    let (state, _dir) = test_state();
    let app = app(state);
    let id = create_disaster(&app, "netrunnerX", "Flood").await;
    let uri = format!("/disasters/{id}/resources");

    for body in [
        json!({"lat": 40.7, "lon": -74.0}),
        json!({"name": "Shelter", "lon": -74.0}),
        json!({"name": "Shelter", "lat": 40.7}),
    ] {
        let (status, err) = send(&app, Method::POST, &uri, Some("citizen1"), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "name, lat, and lon are required");
    }

    let (status, created) = send(
        &app,
        Method::POST,
        &uri,
        Some("citizen1"),
        Some(json!({
            "name": "Red Cross Shelter",
            "location_name": "Lower East Side",
            "type": "shelter",
            "lat": 40.7150,
            "lon": -73.9843,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["type"], "shelter");
    assert_eq!(created["disaster_id"], id.as_str());
    assert_eq!(created["owner"], "citizen1");

    let (status, list) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn resource_on_unknown_disaster_is_not_found() {
    let (state, _dir) = test_state();
    let app = app(state);

    let (status, _) = send(
        &app,
        Method::POST,
        "/disasters/missing/resources",
        Some("netrunnerX"),
        Some(json!({"name": "Water", "lat": 1.0, "lon": 2.0})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn resource_update_and_delete_follow_ownership() {
    let (state, _dir) = test_state();
    let app = app(state);
    let id = create_disaster(&app, "netrunnerX", "Flood").await;
    let (_, created) = send(
        &app,
        Method::POST,
        &format!("/disasters/{id}/resources"),
        Some("reliefAdmin"),
        Some(json!({"name": "Food Bank", "lat": 40.7, "lon": -74.0})),
    )
    .await;
    let uri = format!("/resources/{}", created["id"].as_str().unwrap());

    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some("citizen1"),
        Some(json!({"name": "Mine now"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        Some("reliefAdmin"),
        Some(json!({"name": "Food Bank (open 24h)"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Food Bank (open 24h)");
    assert_eq!(updated["audit_trail"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app, Method::DELETE, &uri, Some("netrunnerX"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &uri, Some("netrunnerX"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reports_are_triaged_and_listed_newest_first() {
    let (state, _dir) = test_state();
    let app = app(state);
    let id = create_disaster(&app, "netrunnerX", "Flood").await;
    let uri = format!("/disasters/{id}/reports");

    let (status, _) = send(&app, Method::POST, &uri, Some("citizen1"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, first) = send(
        &app,
        Method::POST,
        &uri,
        Some("citizen1"),
        Some(json!({"content": "Need SOS help now", "image_url": "https://img.example/ok.jpg"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["verification_status"], "priority");
    assert_eq!(first["author"], "citizen1");

    let (_, second) = send(
        &app,
        Method::POST,
        &uri,
        Some("citizen1"),
        Some(json!({"content": "Status update: all clear"})),
    )
    .await;
    assert_eq!(second["verification_status"], "pending");

    let (status, list) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["id"], second["id"]);
    assert_eq!(list[1]["id"], first["id"]);
}

#[tokio::test]
async fn report_edit_keeps_status_and_rejects_status_patch() {
    let (state, _dir) = test_state();
    let app = app(state);
    let id = create_disaster(&app, "netrunnerX", "Flood").await;
    let (_, report) = send(
        &app,
        Method::POST,
        &format!("/disasters/{id}/reports"),
        Some("citizen1"),
        Some(json!({"content": "Roads passable"})),
    )
    .await;
    let uri = format!("/reports/{}", report["id"].as_str().unwrap());

    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some("citizen1"),
        Some(json!({"verification_status": "priority"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        Some("citizen1"),
        Some(json!({"content": "URGENT: bridge out"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["content"], "URGENT: bridge out");
    assert_eq!(updated["verification_status"], "pending");

    let (status, _) = send(&app, Method::DELETE, &uri, Some("reliefAdmin"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::DELETE, &uri, Some("citizen1"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
