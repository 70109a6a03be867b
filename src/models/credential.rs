//! Credential entity model
//!
//! SeaORM entity for the credentials table, which stores one OAuth token
//! pair per HubSpot account (hub).

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Credential entity holding the token pair issued to one hub
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "credentials")]
pub struct Model {
    /// Unique identifier for the credential (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// HubSpot portal id; unique lookup key for every authenticated call
    #[sea_orm(unique)]
    pub hub_id: String,

    /// Id of the installing user (optional metadata)
    pub user_id: Option<String>,

    /// App id reported by the token metadata endpoint
    pub app_id: Option<String>,

    /// Display identity (email) of the installing user
    pub user_email: Option<String>,

    /// Short-lived access token
    pub access_token: String,

    /// Long-lived refresh token; rotates on every refresh
    pub refresh_token: String,

    /// Absolute expiry of the current access token
    pub expire_time: DateTimeWithTimeZone,

    /// Timestamp when the credential was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the credential was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
