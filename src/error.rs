//! # Error Handling
//!
//! Unified error handling for the service. Every failure surfaced to HTTP
//! callers is rendered as the `{success: false, message}` envelope the
//! workflow action UI expects, with upstream details attached for remote
//! API failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::hubspot::HubSpotError;

/// Service error taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed request fields; maps to 400.
    #[error("{0}")]
    Validation(String),

    /// No credential is stored for the requested hub. Normally unreachable
    /// once the app is installed, so it surfaces as 500.
    #[error("no credential stored for hub {hub_id}")]
    AccountNotFound { hub_id: String },

    /// Non-2xx response from the HubSpot API; upstream status and body are
    /// echoed to the caller for diagnostics.
    #[error("HubSpot API returned status {status}")]
    RemoteApi { status: u16, body: Option<String> },

    /// Credential store read/write failure.
    #[error("database error: {0}")]
    Persistence(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Build a validation error from any displayable message.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        AppError::Validation(message.into())
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::AccountNotFound { .. }
            | AppError::RemoteApi { .. }
            | AppError::Persistence(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Always `false` for errors
    pub success: bool,
    /// Human-readable error message
    pub message: String,
    /// Upstream error details, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let details = match &self {
            AppError::RemoteApi {
                status: upstream,
                body,
            } => Some(json!({
                "status": upstream,
                "body_snippet": body.as_deref().map(truncate_body),
            })),
            _ => None,
        };

        let body = ErrorBody {
            success: false,
            message: self.to_string(),
            details,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<HubSpotError> for AppError {
    fn from(err: HubSpotError) -> Self {
        match err {
            HubSpotError::Api { status, body } => AppError::RemoteApi {
                status,
                body: Some(body),
            },
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

/// Truncate an upstream body to a diagnostic-sized snippet, respecting
/// character boundaries.
fn truncate_body(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    if body.chars().count() > MAX_CHARS {
        let truncated: String = body.chars().take(MAX_CHARS).collect();
        format!("{}...", truncated)
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let error = AppError::validation("objectInput is required");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_string(), "objectInput is required");
    }

    #[test]
    fn account_not_found_maps_to_500() {
        let error = AppError::AccountNotFound {
            hub_id: "424242".to_string(),
        };
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error.to_string().contains("424242"));
    }

    #[test]
    fn remote_api_error_carries_details() {
        let error = AppError::RemoteApi {
            status: 403,
            body: Some(r#"{"category":"MISSING_SCOPES"}"#.to_string()),
        };

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn hubspot_api_error_maps_to_remote_api() {
        let error: AppError = HubSpotError::Api {
            status: 429,
            body: "rate limited".to_string(),
        }
        .into();

        match error {
            AppError::RemoteApi { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body.as_deref(), Some("rate limited"));
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn truncation_is_utf8_safe() {
        let body = "测试中文字符 and some latin filler. ".repeat(20);
        let snippet = truncate_body(&body);
        assert!(snippet.chars().count() <= 203);
        assert!(snippet.ends_with("..."));
    }
}
