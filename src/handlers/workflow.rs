//! # Workflow Action Handlers
//!
//! Callbacks invoked by HubSpot while a customer configures or executes the
//! disassociate workflow action: option enumeration for the action's input
//! fields, and the disassociate execution itself.

use axum::{Json, extract::State};
use tracing::debug;

use crate::disassociation::{DisassociationRequest, SelectionCriterion};
use crate::error::AppError;
use crate::handlers::types::{
    ActionResponse, DisassociateRequest, FetchObjectsRequest, FetchOptionsRequest,
    FetchPropertiesRequest, OptionsResponse, Origin, PropertyOptionsResponse,
};
use crate::server::AppState;

/// Selection modes offered by the action's `selectionInput` dropdown.
const SELECTION_PROPERTY: &str = "property";
const SELECTION_ASSOCIATION_LABEL: &str = "associationLabel";

fn hub_id_of(origin: &Option<Origin>) -> Result<String, AppError> {
    origin
        .as_ref()
        .map(|origin| origin.portal_id.as_hub_id())
        .filter(|hub_id| !hub_id.is_empty())
        .ok_or_else(|| AppError::validation("origin.portalId is required"))
}

/// List selectable CRM object types
#[utoipa::path(
    post,
    path = "/hubspot/fetchObjects",
    request_body = FetchObjectsRequest,
    responses(
        (status = 200, description = "Built-in and custom object types", body = OptionsResponse),
        (status = 400, description = "Missing portal id", body = crate::error::ErrorBody),
        (status = 500, description = "Credential or provider failure", body = crate::error::ErrorBody)
    ),
    tag = "workflow"
)]
pub async fn fetch_objects(
    State(state): State<AppState>,
    Json(request): Json<FetchObjectsRequest>,
) -> Result<Json<OptionsResponse>, AppError> {
    let hub_id = hub_id_of(&request.origin)?;
    let access_token = state.tokens.ensure_valid_access_token(&hub_id).await?;

    let options = state.hubspot.list_object_types(&access_token).await?;
    Ok(Json(OptionsResponse::new(options)))
}

/// List properties of the selected object type
#[utoipa::path(
    post,
    path = "/hubspot/fetchProps",
    request_body = FetchPropertiesRequest,
    responses(
        (status = 200, description = "Property options for the selected object type", body = PropertyOptionsResponse),
        (status = 400, description = "Missing portal id", body = crate::error::ErrorBody),
        (status = 500, description = "Credential or provider failure", body = crate::error::ErrorBody)
    ),
    tag = "workflow"
)]
pub async fn fetch_properties(
    State(state): State<AppState>,
    Json(request): Json<FetchPropertiesRequest>,
) -> Result<Json<PropertyOptionsResponse>, AppError> {
    let hub_id = hub_id_of(&request.origin)?;

    let object_type = request
        .input_fields
        .and_then(|fields| fields.object_input)
        .map(|input| input.value)
        .unwrap_or_default();

    // The UI probes before the object type is chosen; answer without
    // touching the token or the provider.
    if object_type.is_empty() {
        return Ok(Json(PropertyOptionsResponse {
            options: Vec::new(),
        }));
    }

    let access_token = state.tokens.ensure_valid_access_token(&hub_id).await?;
    let options = state
        .hubspot
        .list_properties(&access_token, &object_type)
        .await?;

    Ok(Json(PropertyOptionsResponse { options }))
}

/// List options for the criterion dropdown, depending on the selection mode
#[utoipa::path(
    post,
    path = "/hubspot/fetchOptions",
    request_body = FetchOptionsRequest,
    responses(
        (status = 200, description = "Property or association label options", body = OptionsResponse),
        (status = 400, description = "Missing portal id or unsupported selection mode", body = crate::error::ErrorBody),
        (status = 500, description = "Credential or provider failure", body = crate::error::ErrorBody)
    ),
    tag = "workflow"
)]
pub async fn fetch_options(
    State(state): State<AppState>,
    Json(request): Json<FetchOptionsRequest>,
) -> Result<Json<OptionsResponse>, AppError> {
    let hub_id = hub_id_of(&request.origin)?;

    let (object_input, selection) = match request.fields {
        Some(fields) => (
            fields
                .object_input
                .map(|input| input.field_value.value)
                .unwrap_or_default(),
            fields
                .selection_input
                .map(|input| input.field_value.value)
                .unwrap_or_default(),
        ),
        None => (String::new(), String::new()),
    };

    if object_input.is_empty() {
        debug!(hub_id, "No target object selected yet; returning no options");
        return Ok(Json(OptionsResponse::new(Vec::new())));
    }

    let access_token = state.tokens.ensure_valid_access_token(&hub_id).await?;

    let options = match selection.as_str() {
        SELECTION_ASSOCIATION_LABEL => {
            let from_type = request.object_type_id.unwrap_or_default();
            state
                .hubspot
                .list_association_labels(&access_token, &from_type, &object_input)
                .await?
        }
        SELECTION_PROPERTY | "" => {
            state
                .hubspot
                .list_properties(&access_token, &object_input)
                .await?
        }
        other => {
            return Err(AppError::validation(format!(
                "unsupported selectionInput '{other}'"
            )));
        }
    };

    Ok(Json(OptionsResponse::new(options)))
}

/// List association labels between the workflow object and the selected type
#[utoipa::path(
    post,
    path = "/hubspot/fethcAssociationLabels",
    request_body = FetchOptionsRequest,
    responses(
        (status = 200, description = "Association label options", body = OptionsResponse),
        (status = 400, description = "Missing portal id", body = crate::error::ErrorBody),
        (status = 500, description = "Credential or provider failure", body = crate::error::ErrorBody)
    ),
    tag = "workflow"
)]
pub async fn fetch_association_labels(
    State(state): State<AppState>,
    Json(request): Json<FetchOptionsRequest>,
) -> Result<Json<OptionsResponse>, AppError> {
    let hub_id = hub_id_of(&request.origin)?;

    let to_type = request
        .fields
        .and_then(|fields| fields.object_input)
        .map(|input| input.field_value.value)
        .unwrap_or_default();

    if to_type.is_empty() {
        return Ok(Json(OptionsResponse::new(Vec::new())));
    }

    let from_type = request.object_type_id.unwrap_or_default();
    let access_token = state.tokens.ensure_valid_access_token(&hub_id).await?;

    let options = state
        .hubspot
        .list_association_labels(&access_token, &from_type, &to_type)
        .await?;

    Ok(Json(OptionsResponse::new(options)))
}

/// Execute the disassociate action for one enrolled record
#[utoipa::path(
    post,
    path = "/hubspot/disassociate",
    request_body = DisassociateRequest,
    responses(
        (status = 200, description = "Batch processed; counts in the message", body = ActionResponse),
        (status = 400, description = "Missing required input fields", body = crate::error::ErrorBody),
        (status = 500, description = "Credential or provider failure", body = crate::error::ErrorBody)
    ),
    tag = "workflow"
)]
pub async fn disassociate(
    State(state): State<AppState>,
    Json(request): Json<DisassociateRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let request = into_disassociation_request(request)?;
    let outcome = state.disassociation.disassociate(&request).await?;

    let message = if outcome.targets == 0 {
        format!(
            "no {} records associated with {} {}; nothing to do",
            request.to_object_type, request.from_object_type, request.from_object_id
        )
    } else {
        format!(
            "processed {} associated record(s): {} disassociated, {} skipped",
            outcome.targets, outcome.deleted, outcome.skipped
        )
    };

    Ok(Json(ActionResponse {
        success: true,
        message,
    }))
}

/// Map the raw callback payload to a validated [`DisassociationRequest`].
/// Every missing field is a client error, reported before any network call.
fn into_disassociation_request(
    request: DisassociateRequest,
) -> Result<DisassociationRequest, AppError> {
    let hub_id = hub_id_of(&request.origin)?;

    let object = request
        .object
        .ok_or_else(|| AppError::validation("object is required"))?;
    let from_object_type = object
        .object_type
        .filter(|object_type| !object_type.is_empty())
        .ok_or_else(|| AppError::validation("object.objectType is required"))?;
    let from_object_id = object
        .object_id
        .ok_or_else(|| AppError::validation("object.objectId is required"))?;

    let fields = request.input_fields.unwrap_or_default();
    let to_object_type = fields
        .object_input
        .filter(|object_input| !object_input.is_empty())
        .ok_or_else(|| AppError::validation("objectInput is required"))?;
    let selection = fields
        .selection_input
        .filter(|selection| !selection.is_empty())
        .ok_or_else(|| AppError::validation("selectionInput is required"))?;

    let criterion = match selection.as_str() {
        SELECTION_PROPERTY => {
            let name = fields
                .options_input
                .filter(|name| !name.is_empty())
                .ok_or_else(|| AppError::validation("optionsInput is required"))?;
            let expected = fields.option_value.ok_or_else(|| {
                AppError::validation("optionValue is required when matching on a property")
            })?;
            SelectionCriterion::Property { name, expected }
        }
        SELECTION_ASSOCIATION_LABEL => {
            let raw = fields
                .options_input
                .filter(|raw| !raw.is_empty())
                .ok_or_else(|| AppError::validation("optionsInput is required"))?;
            let type_id = raw.parse().map_err(|_| {
                AppError::validation("optionsInput must be a numeric association type id")
            })?;
            SelectionCriterion::AssociationLabel { type_id }
        }
        other => {
            return Err(AppError::validation(format!(
                "unsupported selectionInput '{other}'"
            )));
        }
    };

    Ok(DisassociationRequest {
        hub_id,
        from_object_type,
        from_object_id,
        to_object_type,
        criterion,
    })
}
