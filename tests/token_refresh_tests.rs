//! Integration tests for the token lifecycle manager.
//!
//! Exercises the read-through cache behavior against a mock OAuth endpoint:
//! valid tokens are served without network traffic, expired tokens trigger
//! exactly one persisted refresh, and concurrent callers share one refresh.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hubspot_actions::error::AppError;
use hubspot_actions::hubspot::HubSpotClient;
use hubspot_actions::repositories::CredentialRepository;
use hubspot_actions::token_refresh::TokenRefreshService;

mod test_utils;
use test_utils::{insert_credential, setup_test_db, test_config};

fn service(db: &DatabaseConnection, api_base: &str) -> TokenRefreshService {
    let repo = CredentialRepository::new(Arc::new(db.clone()));
    let client = HubSpotClient::new(&test_config(api_base));
    TokenRefreshService::new(repo, client)
}

#[tokio::test]
async fn valid_token_is_returned_without_network_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let db = setup_test_db().await.unwrap();
    insert_credential(
        &db,
        "424242",
        "stored-access",
        "stored-refresh",
        Utc::now() + Duration::hours(1),
    )
    .await
    .unwrap();

    let tokens = service(&db, &mock_server.uri());
    let access_token = tokens.ensure_valid_access_token("424242").await.unwrap();

    assert_eq!(access_token, "stored-access");
}

#[tokio::test]
async fn expired_token_triggers_exactly_one_persisted_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new-access",
            "refresh_token": "new-refresh",
            "expires_in": 1800
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let db = setup_test_db().await.unwrap();
    insert_credential(
        &db,
        "424242",
        "old-access",
        "old-refresh",
        Utc::now() - Duration::minutes(5),
    )
    .await
    .unwrap();

    let before = Utc::now();
    let tokens = service(&db, &mock_server.uri());
    let access_token = tokens.ensure_valid_access_token("424242").await.unwrap();
    assert_eq!(access_token, "new-access");

    // The rotated pair and the recomputed expiry must be persisted.
    let repo = CredentialRepository::new(Arc::new(db.clone()));
    let stored = repo.find_by_hub_id("424242").await.unwrap().unwrap();
    assert_eq!(stored.access_token, "new-access");
    assert_eq!(stored.refresh_token, "new-refresh");

    let expire = stored.expire_time.with_timezone(&Utc);
    assert!(expire >= before + Duration::seconds(1790));
    assert!(expire <= Utc::now() + Duration::seconds(1810));
}

#[tokio::test]
async fn refresh_failure_propagates_and_leaves_credential_untouched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"status": "BAD_REFRESH_TOKEN"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let db = setup_test_db().await.unwrap();
    insert_credential(
        &db,
        "424242",
        "old-access",
        "old-refresh",
        Utc::now() - Duration::minutes(5),
    )
    .await
    .unwrap();

    let tokens = service(&db, &mock_server.uri());
    let err = tokens.ensure_valid_access_token("424242").await.unwrap_err();
    assert!(matches!(err, AppError::RemoteApi { status: 400, .. }));

    let repo = CredentialRepository::new(Arc::new(db.clone()));
    let stored = repo.find_by_hub_id("424242").await.unwrap().unwrap();
    assert_eq!(stored.access_token, "old-access");
    assert_eq!(stored.refresh_token, "old-refresh");
}

#[tokio::test]
async fn unknown_hub_fails_with_account_not_found() {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await.unwrap();

    let tokens = service(&db, &mock_server.uri());
    let err = tokens.ensure_valid_access_token("999999").await.unwrap_err();

    match err {
        AppError::AccountNotFound { hub_id } => assert_eq!(hub_id, "999999"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_callers_share_a_single_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new-access",
            "refresh_token": "new-refresh",
            "expires_in": 1800
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let db = setup_test_db().await.unwrap();
    insert_credential(
        &db,
        "424242",
        "old-access",
        "old-refresh",
        Utc::now() - Duration::minutes(5),
    )
    .await
    .unwrap();

    let tokens = Arc::new(service(&db, &mock_server.uri()));

    let first = {
        let tokens = tokens.clone();
        tokio::spawn(async move { tokens.ensure_valid_access_token("424242").await })
    };
    let second = {
        let tokens = tokens.clone();
        tokio::spawn(async move { tokens.ensure_valid_access_token("424242").await })
    };

    let (first, second) = tokio::join!(first, second);
    assert_eq!(first.unwrap().unwrap(), "new-access");
    assert_eq!(second.unwrap().unwrap(), "new-access");
}
