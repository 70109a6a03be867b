//! End-to-end tests for the HTTP surface.
//!
//! Spawns the real router on a local listener backed by an in-memory
//! database and a mock HubSpot API, then drives it with a plain HTTP client.

use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::StatusCode;
use reqwest::redirect::Policy;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hubspot_actions::config::AppConfig;
use hubspot_actions::repositories::CredentialRepository;
use hubspot_actions::server::{AppState, create_app};

mod test_utils;
use test_utils::{insert_credential, setup_test_db, test_config};

/// Spawn the app on a random local port; returns its base URL and database.
async fn spawn_test_app(config: AppConfig) -> (String, DatabaseConnection) {
    let db = setup_test_db().await.unwrap();
    let state = AppState::new(Arc::new(config), db.clone());
    let app = create_app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), db)
}

#[tokio::test]
async fn health_endpoint_returns_plain_ok() {
    let mock_server = MockServer::start().await;
    let (url, _db) = spawn_test_app(test_config(&mock_server.uri())).await;

    let response = reqwest::get(format!("{url}/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn oauth_callback_without_code_is_a_400() {
    let mock_server = MockServer::start().await;
    let (url, _db) = spawn_test_app(test_config(&mock_server.uri())).await;

    let response = reqwest::get(format!("{url}/hubspot/oauth/callback")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("authorization code")
    );
}

#[tokio::test]
async fn oauth_callback_stores_credential_and_redirects_to_settings() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=install-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "installed-access",
            "refresh_token": "installed-refresh",
            "expires_in": 1800
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/oauth/v1/access-tokens/installed-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hub_id": 424242,
            "user_id": 9001,
            "app_id": 7001,
            "user": "owner@example.com"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (url, db) = spawn_test_app(test_config(&mock_server.uri())).await;

    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap();
    let response = client
        .get(format!("{url}/hubspot/oauth/callback?code=install-code"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.contains("/integrations-settings/424242/installed"));

    let repo = CredentialRepository::new(Arc::new(db.clone()));
    let stored = repo.find_by_hub_id("424242").await.unwrap().unwrap();
    assert_eq!(stored.access_token, "installed-access");
    assert_eq!(stored.refresh_token, "installed-refresh");
    assert_eq!(stored.user_email.as_deref(), Some("owner@example.com"));
}

#[tokio::test]
async fn fetch_objects_returns_merged_options() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/crm/v3/schemas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "objectTypeId": "2-3508",
                "name": "machines",
                "labels": {"singular": "Machine", "plural": "Machines"}
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (url, db) = spawn_test_app(test_config(&mock_server.uri())).await;
    insert_credential(
        &db,
        "424242",
        "valid-access",
        "valid-refresh",
        Utc::now() + Duration::hours(1),
    )
    .await
    .unwrap();

    let response = reqwest::Client::new()
        .post(format!("{url}/hubspot/fetchObjects"))
        .json(&json!({"origin": {"portalId": 424242}}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    let options = body["options"].as_array().unwrap();
    assert_eq!(options.len(), 5);
    assert_eq!(options[4]["label"], "Machine");
}

#[tokio::test]
async fn fetch_props_with_no_object_selected_returns_bare_empty_options() {
    let mock_server = MockServer::start().await;
    let (url, _db) = spawn_test_app(test_config(&mock_server.uri())).await;

    // No credential exists; the handler must answer before touching it.
    let response = reqwest::Client::new()
        .post(format!("{url}/hubspot/fetchProps"))
        .json(&json!({"origin": {"portalId": 424242}, "inputFields": {}}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["options"], json!([]));
    // fetchProps historically responds without a success flag
    assert!(body.get("success").is_none());
}

#[tokio::test]
async fn association_labels_route_keeps_its_historical_spelling() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/crm/v4/associations/0-1/companies/labels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"typeId": 57, "label": "Billing contact", "category": "USER_DEFINED"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (url, db) = spawn_test_app(test_config(&mock_server.uri())).await;
    insert_credential(
        &db,
        "424242",
        "valid-access",
        "valid-refresh",
        Utc::now() + Duration::hours(1),
    )
    .await
    .unwrap();

    // The route name carries the original deployment's typo; existing
    // callers were built against this exact path.
    let response = reqwest::Client::new()
        .post(format!("{url}/hubspot/fethcAssociationLabels"))
        .json(&json!({
            "origin": {"portalId": 424242},
            "objectTypeId": "0-1",
            "fields": {"objectInput": {"fieldValue": {"value": "companies"}}}
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["options"][0]["value"], "57");
    assert_eq!(body["options"][0]["label"], "Billing contact");
}

#[tokio::test]
async fn disassociate_with_missing_inputs_is_a_400() {
    let mock_server = MockServer::start().await;
    let (url, _db) = spawn_test_app(test_config(&mock_server.uri())).await;

    let response = reqwest::Client::new()
        .post(format!("{url}/hubspot/disassociate"))
        .json(&json!({
            "origin": {"portalId": 424242},
            "object": {"objectType": "contacts", "objectId": 101},
            "inputFields": {"selectionInput": "property"}
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("objectInput"));
}

#[tokio::test]
async fn disassociate_label_mode_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/crm/v4/objects/contacts/101/associations/companies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"toObjectId": 1, "associationTypes": [{"typeId": 57}]},
                {"toObjectId": 2, "associationTypes": [{"typeId": 3}]}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    for type_id in [3, 57] {
        Mock::given(method("DELETE"))
            .and(path(format!(
                "/crm/v3/objects/contacts/101/associations/companies/1/{type_id}"
            )))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let (url, db) = spawn_test_app(test_config(&mock_server.uri())).await;
    insert_credential(
        &db,
        "424242",
        "valid-access",
        "valid-refresh",
        Utc::now() + Duration::hours(1),
    )
    .await
    .unwrap();

    let response = reqwest::Client::new()
        .post(format!("{url}/hubspot/disassociate"))
        .json(&json!({
            "origin": {"portalId": 424242},
            "object": {"objectType": "contacts", "objectId": 101},
            "inputFields": {
                "objectInput": "companies",
                "selectionInput": "associationLabel",
                "optionsInput": "57"
            }
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("1 disassociated"));
    assert!(message.contains("1 skipped"));
}

#[tokio::test]
async fn unknown_hub_surfaces_as_500_with_error_envelope() {
    let mock_server = MockServer::start().await;
    let (url, _db) = spawn_test_app(test_config(&mock_server.uri())).await;

    let response = reqwest::Client::new()
        .post(format!("{url}/hubspot/fetchObjects"))
        .json(&json!({"origin": {"portalId": 999999}}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("999999"));
}
