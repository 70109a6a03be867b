//! # Workflow Action Definition Handlers
//!
//! Registration endpoints that push the disassociate action definition to
//! HubSpot's automation API. These are operator endpoints, run once per
//! app (and again whenever the definition changes), not callbacks.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::error::AppError;
use crate::handlers::types::UpdateActionRequest;
use crate::server::AppState;

/// Register the disassociate workflow action definition
#[utoipa::path(
    post,
    path = "/hubspot/createCustomWorkflowAction",
    responses(
        (status = 200, description = "Definition created; upstream response echoed", body = Value),
        (status = 500, description = "Registration failed", body = crate::error::ErrorBody)
    ),
    tag = "actions"
)]
pub async fn create_custom_workflow_action(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let definition = action_definition(&state.config)?;
    let created = state.hubspot.create_workflow_action(&definition).await?;
    Ok(Json(created))
}

/// Update an existing workflow action definition
#[utoipa::path(
    patch,
    path = "/hubspot/updateCustomWorkflowAction",
    request_body = UpdateActionRequest,
    responses(
        (status = 200, description = "Definition updated; upstream response echoed", body = Value),
        (status = 400, description = "Missing definition id", body = crate::error::ErrorBody),
        (status = 500, description = "Update failed", body = crate::error::ErrorBody)
    ),
    tag = "actions"
)]
pub async fn update_custom_workflow_action(
    State(state): State<AppState>,
    Json(request): Json<UpdateActionRequest>,
) -> Result<Json<Value>, AppError> {
    let definition_id = request
        .definition_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::validation("definitionId is required"))?;

    let definition = action_definition(&state.config)?;
    let updated = state
        .hubspot
        .update_workflow_action(&definition_id, &definition)
        .await?;
    Ok(Json(updated))
}

/// The static action definition sent to the automation API. Option URLs
/// point back at this service, so the public base URL must be configured.
fn action_definition(config: &crate::config::AppConfig) -> Result<Value, AppError> {
    let base_url = config
        .action_base_url
        .as_deref()
        .map(|base| base.trim_end_matches('/'))
        .ok_or_else(|| {
            AppError::validation("action base URL is not configured; set HUBSPOT_ACTION_BASE_URL")
        })?;

    Ok(json!({
        "actionUrl": format!("{base_url}/hubspot/disassociate"),
        "inputFields": [
            {
                "typeDefinition": {
                    "name": "objectInput",
                    "type": "enumeration",
                    "fieldType": "select",
                    "optionsUrl": format!("{base_url}/hubspot/fetchObjects"),
                },
                "supportedValueTypes": ["STATIC_VALUE"],
                "isRequired": true,
            },
            {
                "typeDefinition": {
                    "name": "selectionInput",
                    "type": "enumeration",
                    "fieldType": "select",
                    "options": [
                        {"value": "associationLabel", "label": "Association Label"},
                        {"value": "property", "label": "Property"},
                    ],
                },
                "supportedValueTypes": ["STATIC_VALUE"],
                "isRequired": true,
            },
            {
                "typeDefinition": {
                    "name": "optionsInput",
                    "type": "enumeration",
                    "fieldType": "select",
                    "optionsUrl": format!("{base_url}/hubspot/fetchOptions"),
                },
                "supportedValueTypes": ["STATIC_VALUE"],
                "isRequired": true,
            },
            {
                "typeDefinition": {
                    "name": "optionValue",
                    "type": "string",
                    "fieldType": "text",
                },
                "supportedValueTypes": ["STATIC_VALUE"],
                "isRequired": false,
            },
        ],
        "labels": {
            "en": {
                "actionName": "Remove Association",
                "actionDescription": "Removes the association between two objects. The source object is defined by the workflow type.",
                "actionCardContent": "Remove the association between objects",
                "inputFieldLabels": {
                    "objectInput": "Object to disassociate",
                    "selectionInput": "Disassociate on the basis of",
                    "optionsInput": "Select property/association label",
                    "optionValue": "Enter the property value",
                },
                "inputFieldDescriptions": {
                    "objectInput": "The object type to disassociate from the enrolled record",
                    "selectionInput": "The basis of disassociation: a property match or an association label",
                    "optionsInput": "The property or association label that selects which records to disassociate",
                    "optionValue": "Records are disassociated when the selected property matches this value (property mode only)",
                },
            },
        },
        "published": "true",
    }))
}
