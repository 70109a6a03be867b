//! # API Handlers
//!
//! HTTP endpoint handlers: the OAuth install callback, the workflow action
//! callbacks, and the action definition registration endpoints.

use axum::response::Json;

use crate::models::ServiceInfo;

pub mod actions;
pub mod oauth;
pub mod types;
pub mod workflow;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Plain-text liveness marker
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is alive", body = String)
    ),
    tag = "root"
)]
pub async fn health() -> &'static str {
    "ok"
}
