//! Test utilities shared by the integration suites.
//!
//! Provides an in-memory SQLite database with migrations applied, a test
//! configuration pointing the HubSpot client at a mock server, and fixture
//! helpers for credentials.

use anyhow::Result;
use chrono::{DateTime, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;

use hubspot_actions::config::AppConfig;
use hubspot_actions::models::credential;
use hubspot_actions::repositories::credential::NewCredential;
use hubspot_actions::repositories::CredentialRepository;

/// Sets up an in-memory SQLite database with all migrations applied.
#[allow(dead_code)]
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Test configuration pointing the HubSpot client at the given base URL.
#[allow(dead_code)]
pub fn test_config(api_base: &str) -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        api_base: api_base.to_string(),
        client_id: Some("test-client-id".to_string()),
        client_secret: Some("test-client-secret".to_string()),
        redirect_uri: Some("http://127.0.0.1/hubspot/oauth/callback".to_string()),
        ..AppConfig::default()
    }
}

/// Inserts a credential fixture for a hub.
#[allow(dead_code)]
pub async fn insert_credential(
    db: &DatabaseConnection,
    hub_id: &str,
    access_token: &str,
    refresh_token: &str,
    expire_time: DateTime<Utc>,
) -> Result<credential::Model> {
    let repo = CredentialRepository::new(Arc::new(db.clone()));
    let model = repo
        .create(NewCredential {
            hub_id: hub_id.to_string(),
            user_id: Some("9001".to_string()),
            app_id: Some("7001".to_string()),
            user_email: Some("owner@example.com".to_string()),
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expire_time,
        })
        .await?;
    Ok(model)
}
