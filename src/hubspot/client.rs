//! HubSpot REST client
//!
//! Thin request wrappers over the OAuth v1 and CRM v3/v4 endpoints. Every
//! CRM call requires an access token resolved by the token lifecycle
//! manager; non-2xx responses surface as [`HubSpotError::Api`] carrying the
//! upstream status and body.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::AppConfig;
use crate::hubspot::types::{
    ApiList, AssociationEdge, AssociationPage, AssociationType, ObjectSchema, OptionItem,
    PropertyDefinition, RecordDetail, TokenInfo, TokenResponse,
};

/// Fixed page size for association listings.
const ASSOCIATION_PAGE_LIMIT: u32 = 500;

/// The four built-in CRM object types merged ahead of custom schemas.
const BUILT_IN_OBJECT_TYPES: [(&str, &str); 4] = [
    ("contacts", "Contacts"),
    ("companies", "Companies"),
    ("deals", "Deals"),
    ("tickets", "Tickets"),
];

/// HubSpot client specific errors
#[derive(Debug, Error)]
pub enum HubSpotError {
    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Typed client over the HubSpot REST API.
#[derive(Debug, Clone)]
pub struct HubSpotClient {
    http: reqwest::Client,
    api_base: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    developer_api_key: Option<String>,
    app_id: Option<String>,
}

impl HubSpotClient {
    /// Create a client from application configuration.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone().unwrap_or_default(),
            client_secret: config.client_secret.clone().unwrap_or_default(),
            redirect_uri: config.redirect_uri.clone().unwrap_or_default(),
            developer_api_key: config.developer_api_key.clone(),
            app_id: config.app_id.clone(),
        }
    }

    /// Exchange an OAuth authorization code for a token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, HubSpotError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("code", code),
        ];

        let response = self
            .http
            .post(format!("{}/oauth/v1/token", self.api_base))
            .form(&params)
            .send()
            .await?;

        json_or_api_error(response).await
    }

    /// Exchange a refresh token for a fresh token pair.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, HubSpotError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .http
            .post(format!("{}/oauth/v1/token", self.api_base))
            .form(&params)
            .send()
            .await?;

        json_or_api_error(response).await
    }

    /// Fetch the hub/user/app metadata attached to an access token.
    pub async fn token_info(&self, access_token: &str) -> Result<TokenInfo, HubSpotError> {
        let response = self
            .http
            .get(format!(
                "{}/oauth/v1/access-tokens/{}",
                self.api_base, access_token
            ))
            .send()
            .await?;

        json_or_api_error(response).await
    }

    /// List selectable object types: the four built-ins merged with every
    /// custom object schema, normalized to `{value, label}` options.
    pub async fn list_object_types(
        &self,
        access_token: &str,
    ) -> Result<Vec<OptionItem>, HubSpotError> {
        let response = self
            .http
            .get(format!("{}/crm/v3/schemas", self.api_base))
            .bearer_auth(access_token)
            .send()
            .await?;

        let schemas: ApiList<ObjectSchema> = json_or_api_error(response).await?;

        let mut options: Vec<OptionItem> = BUILT_IN_OBJECT_TYPES
            .iter()
            .map(|(value, label)| OptionItem::new(*value, *label))
            .collect();
        options.extend(schemas.results.into_iter().map(|schema| {
            let label = schema.labels.singular.unwrap_or_else(|| schema.name.clone());
            OptionItem::new(schema.object_type_id, label)
        }));

        Ok(options)
    }

    /// List properties of an object type as `{value, label}` options.
    ///
    /// An empty `object_type` yields an empty list without a network call;
    /// the workflow UI probes with empty selections while the user is still
    /// filling in earlier fields.
    pub async fn list_properties(
        &self,
        access_token: &str,
        object_type: &str,
    ) -> Result<Vec<OptionItem>, HubSpotError> {
        if object_type.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .http
            .get(format!(
                "{}/crm/v3/properties/{}",
                self.api_base, object_type
            ))
            .bearer_auth(access_token)
            .send()
            .await?;

        let properties: ApiList<PropertyDefinition> = json_or_api_error(response).await?;

        Ok(properties
            .results
            .into_iter()
            .map(|property| OptionItem::new(property.name, property.label))
            .collect())
    }

    /// List association labels defined between two object types.
    ///
    /// An empty `to_type` yields an empty list without a network call.
    pub async fn list_association_labels(
        &self,
        access_token: &str,
        from_type: &str,
        to_type: &str,
    ) -> Result<Vec<OptionItem>, HubSpotError> {
        if to_type.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .http
            .get(format!(
                "{}/crm/v4/associations/{}/{}/labels",
                self.api_base, from_type, to_type
            ))
            .bearer_auth(access_token)
            .send()
            .await?;

        let labels: ApiList<AssociationType> = json_or_api_error(response).await?;

        Ok(labels
            .results
            .into_iter()
            .map(|association_type| {
                let label = association_type
                    .label
                    .unwrap_or_else(|| "Unlabeled".to_string());
                OptionItem::new(association_type.type_id.to_string(), label)
            })
            .collect())
    }

    /// List every association edge from a source record to the target object
    /// type, following continuation cursors until the listing is exhausted.
    pub async fn list_associated_records(
        &self,
        access_token: &str,
        from_type: &str,
        from_id: u64,
        to_type: &str,
    ) -> Result<Vec<AssociationEdge>, HubSpotError> {
        let mut edges = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut url = Url::parse(&format!(
                "{}/crm/v4/objects/{}/{}/associations/{}",
                self.api_base, from_type, from_id, to_type
            ))?;
            url.query_pairs_mut()
                .append_pair("limit", &ASSOCIATION_PAGE_LIMIT.to_string());
            if let Some(cursor) = &after {
                url.query_pairs_mut().append_pair("after", cursor);
            }

            let response = self.http.get(url).bearer_auth(access_token).send().await?;
            let page: AssociationPage = json_or_api_error(response).await?;

            edges.extend(page.results);

            match page.paging.and_then(|paging| paging.next) {
                Some(next) => after = Some(next.after),
                None => break,
            }
        }

        debug!(
            from_type,
            from_id,
            to_type,
            edges = edges.len(),
            "Listed associated records"
        );

        Ok(edges)
    }

    /// Fetch the current value of one property on a record, excluding
    /// archived records. `None` when the record does not carry the property.
    pub async fn record_property(
        &self,
        access_token: &str,
        object_type: &str,
        object_id: u64,
        property: &str,
    ) -> Result<Option<String>, HubSpotError> {
        let mut url = Url::parse(&format!(
            "{}/crm/v3/objects/{}/{}",
            self.api_base, object_type, object_id
        ))?;
        url.query_pairs_mut()
            .append_pair("properties", property)
            .append_pair("archived", "false");

        let response = self.http.get(url).bearer_auth(access_token).send().await?;
        let detail: RecordDetail = json_or_api_error(response).await?;

        Ok(detail.properties.get(property).cloned().flatten())
    }

    /// Delete the association edges between two specific records for each of
    /// the given association type ids. Individual failures (already-absent
    /// edges, permission errors) are logged and swallowed so the remaining
    /// type ids are still processed. Returns the number of edges removed.
    pub async fn delete_association(
        &self,
        access_token: &str,
        from_type: &str,
        from_id: u64,
        to_type: &str,
        to_id: u64,
        type_ids: &[i64],
    ) -> usize {
        let mut removed = 0;

        for type_id in type_ids {
            let result = self
                .delete_association_type(access_token, from_type, from_id, to_type, to_id, *type_id)
                .await;

            match result {
                Ok(()) => removed += 1,
                Err(err) => {
                    warn!(
                        from_type,
                        from_id,
                        to_type,
                        to_id,
                        type_id,
                        error = %err,
                        "Failed to delete association edge; continuing"
                    );
                }
            }
        }

        removed
    }

    async fn delete_association_type(
        &self,
        access_token: &str,
        from_type: &str,
        from_id: u64,
        to_type: &str,
        to_id: u64,
        type_id: i64,
    ) -> Result<(), HubSpotError> {
        let response = self
            .http
            .delete(format!(
                "{}/crm/v3/objects/{}/{}/associations/{}/{}/{}",
                self.api_base, from_type, from_id, to_type, to_id, type_id
            ))
            .bearer_auth(access_token)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(HubSpotError::Api { status, body })
        }
    }

    /// Register the workflow action definition with the automation API,
    /// authenticated with the developer API key.
    pub async fn create_workflow_action(
        &self,
        definition: &serde_json::Value,
    ) -> Result<serde_json::Value, HubSpotError> {
        let (app_id, api_key) = self.developer_credentials()?;

        let response = self
            .http
            .post(format!("{}/automation/v4/actions/{}", self.api_base, app_id))
            .query(&[("hapikey", api_key)])
            .json(definition)
            .send()
            .await?;

        let created = json_or_api_error(response).await?;
        info!(app_id, "Registered workflow action definition");
        Ok(created)
    }

    /// Update an existing workflow action definition.
    pub async fn update_workflow_action(
        &self,
        definition_id: &str,
        definition: &serde_json::Value,
    ) -> Result<serde_json::Value, HubSpotError> {
        let (app_id, api_key) = self.developer_credentials()?;

        let response = self
            .http
            .patch(format!(
                "{}/automation/v4/actions/{}/{}",
                self.api_base, app_id, definition_id
            ))
            .query(&[("hapikey", api_key)])
            .json(definition)
            .send()
            .await?;

        let updated = json_or_api_error(response).await?;
        info!(app_id, definition_id, "Updated workflow action definition");
        Ok(updated)
    }

    fn developer_credentials(&self) -> Result<(&str, &str), HubSpotError> {
        let app_id = self.app_id.as_deref().ok_or_else(|| {
            HubSpotError::Config("app id is not configured; set HUBSPOT_APP_ID".to_string())
        })?;
        let api_key = self.developer_api_key.as_deref().ok_or_else(|| {
            HubSpotError::Config(
                "developer API key is not configured; set HUBSPOT_DEVELOPER_API_KEY".to_string(),
            )
        })?;
        Ok((app_id, api_key))
    }
}

async fn json_or_api_error<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, HubSpotError> {
    if response.status().is_success() {
        Ok(response.json().await?)
    } else {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(HubSpotError::Api { status, body })
    }
}
