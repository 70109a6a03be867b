//! # Workflow Action Wire Types
//!
//! Request and response payloads exchanged with HubSpot's custom workflow
//! action engine. Field names follow HubSpot's camelCase wire format; the
//! `origin.portalId` discriminator arrives as a number in real callbacks but
//! as a string from some test harnesses, so both are accepted.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::hubspot::OptionItem;

/// `origin.portalId` as sent by HubSpot (numeric) or test tooling (string).
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PortalId {
    Number(u64),
    Text(String),
}

impl PortalId {
    /// The hub id string used to key the credential store.
    pub fn as_hub_id(&self) -> String {
        match self {
            PortalId::Number(id) => id.to_string(),
            PortalId::Text(id) => id.trim().to_string(),
        }
    }
}

/// Callback origin metadata common to every workflow action request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    pub portal_id: PortalId,
}

/// A `{value}` wrapper used by options-fetch payloads.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FieldValue {
    #[serde(default)]
    pub value: String,
}

/// A `{fieldValue: {value}}` wrapper used by field-dependent options fetches.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WrappedFieldValue {
    pub field_value: FieldValue,
}

/// Body of `POST /hubspot/fetchObjects`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FetchObjectsRequest {
    #[serde(default)]
    pub origin: Option<Origin>,
}

/// Body of `POST /hubspot/fetchProps`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FetchPropertiesRequest {
    #[serde(default)]
    pub origin: Option<Origin>,
    #[serde(default)]
    pub input_fields: Option<PropertiesInputFields>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertiesInputFields {
    #[serde(default)]
    pub object_input: Option<FieldValue>,
}

/// Body of `POST /hubspot/fetchOptions` and
/// `POST /hubspot/fethcAssociationLabels`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FetchOptionsRequest {
    #[serde(default)]
    pub origin: Option<Origin>,
    /// Object type of the workflow's enrolled (source) records
    #[serde(default)]
    pub object_type_id: Option<String>,
    #[serde(default)]
    pub fields: Option<OptionsFields>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptionsFields {
    #[serde(default)]
    pub object_input: Option<WrappedFieldValue>,
    #[serde(default)]
    pub selection_input: Option<WrappedFieldValue>,
}

/// Body of `POST /hubspot/disassociate`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisassociateRequest {
    #[serde(default)]
    pub origin: Option<Origin>,
    /// The enrolled record the workflow is acting on
    #[serde(default)]
    pub object: Option<WorkflowObject>,
    #[serde(default)]
    pub input_fields: Option<DisassociateInputFields>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowObject {
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub object_id: Option<u64>,
}

/// User-configured action inputs; values arrive already resolved as strings.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisassociateInputFields {
    #[serde(default)]
    pub object_input: Option<String>,
    #[serde(default)]
    pub selection_input: Option<String>,
    #[serde(default)]
    pub options_input: Option<String>,
    #[serde(default)]
    pub option_value: Option<String>,
}

/// Body of `PATCH /hubspot/updateCustomWorkflowAction`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActionRequest {
    #[serde(default)]
    pub definition_id: Option<String>,
}

/// Dropdown options plus the success flag most callbacks expect.
#[derive(Debug, Serialize, ToSchema)]
pub struct OptionsResponse {
    pub success: bool,
    pub options: Vec<OptionItem>,
}

impl OptionsResponse {
    pub fn new(options: Vec<OptionItem>) -> Self {
        Self {
            success: true,
            options,
        }
    }
}

/// Bare options list; `fetchProps` historically responds without `success`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PropertyOptionsResponse {
    pub options: Vec<OptionItem>,
}

/// Terminal `{success, message}` response of the disassociate callback.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}
