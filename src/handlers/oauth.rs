//! # OAuth Handlers
//!
//! The install callback: exchanges the authorization code for a token pair,
//! resolves which hub the token belongs to, and upserts the credential so
//! later workflow callbacks can authenticate on behalf of that hub.

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::repositories::credential::NewCredential;
use crate::server::AppState;

/// Query parameters of the OAuth redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

/// Handle the OAuth install redirect from HubSpot
///
/// Exchanges the authorization code, persists the credential keyed by hub
/// id, and sends the user back to the hub's installed-apps settings page.
#[utoipa::path(
    get,
    path = "/hubspot/oauth/callback",
    params(("code" = Option<String>, Query, description = "OAuth authorization code")),
    responses(
        (status = 303, description = "Tokens stored; redirecting to HubSpot settings"),
        (status = 400, description = "Missing authorization code", body = crate::error::ErrorBody),
        (status = 500, description = "Token exchange or persistence failure", body = crate::error::ErrorBody)
    ),
    tag = "oauth"
)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AppError> {
    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::validation("missing authorization code"))?;

    let token = state.hubspot.exchange_code(&code).await?;
    let info = state.hubspot.token_info(&token.access_token).await?;

    let hub_id = info.hub_id.to_string();
    let expire_time = Utc::now() + Duration::seconds(token.expires_in);

    state
        .credentials
        .upsert(NewCredential {
            hub_id: hub_id.clone(),
            user_id: info.user_id.map(|id| id.to_string()),
            app_id: info.app_id.map(|id| id.to_string()),
            user_email: info.user,
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expire_time,
        })
        .await?;

    info!(hub_id = %hub_id, "Stored credential after OAuth install");

    Ok(Redirect::to(&format!(
        "{}/integrations-settings/{}/installed",
        state.config.app_base, hub_id
    )))
}
