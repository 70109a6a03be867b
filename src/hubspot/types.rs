//! Wire types for the HubSpot OAuth and CRM APIs.
//!
//! OAuth endpoints speak snake_case; the CRM v3/v4 endpoints speak camelCase.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response from the OAuth token endpoint (both grant types).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
}

/// Metadata reported for an access token, used to key the credential by hub.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    pub hub_id: u64,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub app_id: Option<u64>,
    /// Email of the installing user
    #[serde(default)]
    pub user: Option<String>,
}

/// A `{value, label}` dropdown option as consumed by workflow action fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OptionItem {
    pub value: String,
    pub label: String,
}

impl OptionItem {
    pub fn new<V: Into<String>, L: Into<String>>(value: V, label: L) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Plain list payload returned by the schema and property endpoints.
#[derive(Debug, Deserialize)]
pub struct ApiList<T> {
    pub results: Vec<T>,
}

/// One custom object schema from `/crm/v3/schemas`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSchema {
    pub object_type_id: String,
    pub name: String,
    #[serde(default)]
    pub labels: SchemaLabels,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaLabels {
    #[serde(default)]
    pub singular: Option<String>,
    #[serde(default)]
    pub plural: Option<String>,
}

/// One property definition from `/crm/v3/properties/{objectType}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    pub label: String,
}

/// One association type (label) between two object types.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationType {
    pub type_id: i64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// One association edge from a source record to a target record, with the
/// set of labels currently linking them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationEdge {
    pub to_object_id: u64,
    #[serde(default)]
    pub association_types: Vec<AssociationType>,
}

/// Paged payload returned by the v4 association listing.
#[derive(Debug, Deserialize)]
pub struct AssociationPage {
    pub results: Vec<AssociationEdge>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<PagingNext>,
}

#[derive(Debug, Deserialize)]
pub struct PagingNext {
    pub after: String,
}

/// One CRM record with its requested property values.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordDetail {
    pub id: String,
    #[serde(default)]
    pub properties: HashMap<String, Option<String>>,
}
