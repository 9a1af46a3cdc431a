mod common;

use axum::http::{Method, StatusCode};
use common::{create_disaster, send, test_state, RIVERDALE};
use relief_server::app;
use serde_json::json;

#[tokio::test]
async fn health_check_returns_ok() {
    let (state, _dir) = test_state();
    let app = app(state);

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn mutations_require_a_known_bearer() {
    let (state, _dir) = test_state();
    let app = app(state);
    let payload = json!({"title": "Flood", "description": "Flooding reported in Riverdale"});

    let (status, body) = send(&app, Method::POST, "/disasters", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::POST, "/disasters", Some("mallory"), Some(payload)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Reads need no credential at all.
    let (status, body) = send(&app, Method::GET, "/disasters", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn create_geocodes_the_description() {
    let (state, _dir) = test_state();
    let app = app(state);

    let id = create_disaster(&app, "reliefAdmin", "Flood").await;
    let (status, body) = send(&app, Method::GET, &format!("/disasters/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location_name"], "Riverdale");
    assert_eq!(body["coordinates"]["lat"], RIVERDALE.lat);
    assert_eq!(body["coordinates"]["lon"], RIVERDALE.lon);
    assert_eq!(body["owner"], "reliefAdmin");
    assert_eq!(body["tags"], json!(["flood"]));

    let trail = body["audit_trail"].as_array().unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0]["action"], "create");
    assert_eq!(trail[0]["actor"], "reliefAdmin");
}

#[tokio::test]
async fn ungeocodable_description_creates_nothing() {
    let (state, _dir) = test_state();
    let app = app(state);

    for description in ["Send help now", "Waves rising in Atlantis"] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/disasters",
            Some("netrunnerX"),
            Some(json!({"title": "Unknown", "description": description})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{description}");
        assert!(body["error"].is_string());
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/disasters",
        Some("netrunnerX"),
        Some(json!({"title": "Outage", "description": "Lines down in Nowhere"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY, "{body}");

    let (_, body) = send(&app, Method::GET, "/disasters", None, None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn missing_title_is_a_bad_request() {
    let (state, _dir) = test_state();
    let app = app(state);

    let (status, body) = send(
        &app,
        Method::POST,
        "/disasters",
        Some("netrunnerX"),
        Some(json!({"description": "Flooding reported in Riverdale"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing required field: title");
}

#[tokio::test]
async fn viewer_cannot_delete_someone_elses_disaster() {
    let (state, _dir) = test_state();
    let app = app(state);
    let id = create_disaster(&app, "netrunnerX", "Flood").await;

    let uri = format!("/disasters/{id}");
    let (status, _) = send(&app, Method::DELETE, &uri, Some("citizen1"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Unknown ids are reported as missing before ownership is considered.
    let (status, _) = send(&app, Method::DELETE, "/disasters/nope", Some("citizen1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["audit_trail"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn owner_updates_and_deletes() {
    let (state, _dir) = test_state();
    let app = app(state);
    let id = create_disaster(&app, "citizen1", "Flood").await;
    let uri = format!("/disasters/{id}");

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some("citizen1"),
        Some(json!({"description": "Water receding", "tags": ["flood", "recovery"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Water receding");
    assert_eq!(body["title"], "Flood");
    assert_eq!(body["owner"], "citizen1");
    assert_eq!(body["audit_trail"][1]["action"], "update");

    let (status, body) = send(&app, Method::DELETE, &uri, Some("citizen1"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_patch_fields_are_rejected() {
    let (state, _dir) = test_state();
    let app = app(state);
    let id = create_disaster(&app, "netrunnerX", "Flood").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/disasters/{id}"),
        Some("netrunnerX"),
        Some(json!({"owner": "citizen1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("owner"));
}

#[tokio::test]
async fn list_filters_by_tag() {
    let (state, _dir) = test_state();
    let app = app(state);
    let flood = create_disaster(&app, "netrunnerX", "Flood").await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/disasters",
        Some("netrunnerX"),
        Some(json!({
            "title": "Fire",
            "description": "Smoke spotted near Riverdale",
            "tags": ["wildfire"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, Method::GET, "/disasters?tag=flood", None, None).await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![flood.as_str()]);

    let (_, body) = send(&app, Method::GET, "/disasters", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["title"], "Fire");
}

#[tokio::test]
async fn delete_all_is_admin_only() {
    let (state, _dir) = test_state();
    let app = app(state);
    create_disaster(&app, "reliefAdmin", "Flood").await;
    create_disaster(&app, "citizen1", "Storm").await;

    let (status, _) = send(&app, Method::DELETE, "/disasters/all", Some("reliefAdmin"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::DELETE, "/disasters/all", Some("netrunnerX"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, Method::GET, "/disasters", None, None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn coordinates_follow_the_location_name() {
    let (state, _dir) = test_state();
    let app = app(state);
    let id = create_disaster(&app, "netrunnerX", "Flood").await;
    let uri = format!("/disasters/{id}");

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some("netrunnerX"),
        Some(json!({"location_name": "Brooklyn", "coordinates": {"lat": 0.0, "lon": 0.0}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("coordinates"));

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some("netrunnerX"),
        Some(json!({"location_name": "Atlantis"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location_name"], "Atlantis");
    assert!(body["coordinates"].is_null());

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some("netrunnerX"),
        Some(json!({"location_name": "Brooklyn"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location_name"], "Brooklyn");
    assert_eq!(body["coordinates"]["lat"], RIVERDALE.lat);

    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some("netrunnerX"),
        Some(json!({"location_name": "Nowhere"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let (_, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(body["location_name"], "Brooklyn");
    assert_eq!(body["audit_trail"].as_array().unwrap().len(), 3);
}
