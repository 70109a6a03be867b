//! Credential repository for database operations
//!
//! Encapsulates SeaORM operations for the credentials table: find-by-hub,
//! create, token update, and upsert. Upserts are last-write-wins; the store
//! tolerates concurrent writers for the same hub.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::models::credential::{self, Entity as Credential};

/// Field set written on create and upsert.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub hub_id: String,
    pub user_id: Option<String>,
    pub app_id: Option<String>,
    pub user_email: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
    pub expire_time: DateTime<Utc>,
}

/// Repository for credential database operations
#[derive(Debug, Clone)]
pub struct CredentialRepository {
    db: Arc<DatabaseConnection>,
}

impl CredentialRepository {
    /// Creates a new CredentialRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds the credential stored for a hub, if any
    pub async fn find_by_hub_id(&self, hub_id: &str) -> Result<Option<credential::Model>, DbErr> {
        Credential::find()
            .filter(credential::Column::HubId.eq(hub_id))
            .one(&*self.db)
            .await
    }

    /// Creates a new credential record
    pub async fn create(&self, new: NewCredential) -> Result<credential::Model, DbErr> {
        let id = Uuid::new_v4();
        let now: DateTimeWithTimeZone = Utc::now().into();

        let active = credential::ActiveModel {
            id: Set(id),
            hub_id: Set(new.hub_id),
            user_id: Set(new.user_id),
            app_id: Set(new.app_id),
            user_email: Set(new.user_email),
            access_token: Set(new.access_token),
            refresh_token: Set(new.refresh_token),
            expire_time: Set(new.expire_time.into()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        active.insert(&*self.db).await?;

        // SQLite does not return the inserted row; fetch it by id instead
        Credential::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("credential {}", id)))
    }

    /// Replaces the token pair and expiry for a hub after a refresh
    pub async fn update_tokens(
        &self,
        hub_id: &str,
        access_token: &str,
        refresh_token: &str,
        expire_time: DateTime<Utc>,
    ) -> Result<credential::Model, DbErr> {
        let existing = self
            .find_by_hub_id(hub_id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("credential for hub {}", hub_id)))?;

        let mut model: credential::ActiveModel = existing.into();
        model.access_token = Set(access_token.to_string());
        model.refresh_token = Set(refresh_token.to_string());
        model.expire_time = Set(expire_time.into());
        model.updated_at = Set(Utc::now().into());

        model.update(&*self.db).await
    }

    /// Creates or replaces the credential for a hub (last write wins)
    pub async fn upsert(&self, new: NewCredential) -> Result<credential::Model, DbErr> {
        match self.find_by_hub_id(&new.hub_id).await? {
            Some(existing) => {
                let mut model: credential::ActiveModel = existing.into();
                model.user_id = Set(new.user_id);
                model.app_id = Set(new.app_id);
                model.user_email = Set(new.user_email);
                model.access_token = Set(new.access_token);
                model.refresh_token = Set(new.refresh_token);
                model.expire_time = Set(new.expire_time.into());
                model.updated_at = Set(Utc::now().into());
                model.update(&*self.db).await
            }
            None => self.create(new).await,
        }
    }
}
