//! # Server Configuration
//!
//! Router construction and server startup: wires the credential store, the
//! HubSpot client, and the token/disassociation services into shared state
//! and exposes the HTTP surface.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::disassociation::DisassociationService;
use crate::handlers;
use crate::hubspot::HubSpotClient;
use crate::repositories::CredentialRepository;
use crate::token_refresh::TokenRefreshService;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub credentials: CredentialRepository,
    pub hubspot: HubSpotClient,
    pub tokens: Arc<TokenRefreshService>,
    pub disassociation: Arc<DisassociationService>,
}

impl AppState {
    /// Build the full service graph on top of a database connection.
    pub fn new(config: Arc<AppConfig>, db: DatabaseConnection) -> Self {
        let credentials = CredentialRepository::new(Arc::new(db.clone()));
        let hubspot = HubSpotClient::new(&config);
        let tokens = Arc::new(TokenRefreshService::new(
            credentials.clone(),
            hubspot.clone(),
        ));
        let disassociation = Arc::new(DisassociationService::new(tokens.clone(), hubspot.clone()));

        Self {
            config,
            db,
            credentials,
            hubspot,
            tokens,
            disassociation,
        }
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/hubspot/oauth/callback", get(handlers::oauth::oauth_callback))
        .route("/hubspot/fetchObjects", post(handlers::workflow::fetch_objects))
        .route("/hubspot/fetchProps", post(handlers::workflow::fetch_properties))
        .route("/hubspot/fetchOptions", post(handlers::workflow::fetch_options))
        .route(
            "/hubspot/fethcAssociationLabels",
            post(handlers::workflow::fetch_association_labels),
        )
        .route("/hubspot/disassociate", post(handlers::workflow::disassociate))
        .route(
            "/hubspot/createCustomWorkflowAction",
            post(handlers::actions::create_custom_workflow_action),
        )
        .route(
            "/hubspot/updateCustomWorkflowAction",
            patch(handlers::actions::update_custom_workflow_action),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let state = AppState::new(Arc::new(config), db);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::oauth::oauth_callback,
        crate::handlers::workflow::fetch_objects,
        crate::handlers::workflow::fetch_properties,
        crate::handlers::workflow::fetch_options,
        crate::handlers::workflow::fetch_association_labels,
        crate::handlers::workflow::disassociate,
        crate::handlers::actions::create_custom_workflow_action,
        crate::handlers::actions::update_custom_workflow_action,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ErrorBody,
            crate::hubspot::OptionItem,
            crate::handlers::types::Origin,
            crate::handlers::types::PortalId,
            crate::handlers::types::FieldValue,
            crate::handlers::types::WrappedFieldValue,
            crate::handlers::types::FetchObjectsRequest,
            crate::handlers::types::FetchPropertiesRequest,
            crate::handlers::types::PropertiesInputFields,
            crate::handlers::types::FetchOptionsRequest,
            crate::handlers::types::OptionsFields,
            crate::handlers::types::DisassociateRequest,
            crate::handlers::types::WorkflowObject,
            crate::handlers::types::DisassociateInputFields,
            crate::handlers::types::UpdateActionRequest,
            crate::handlers::types::OptionsResponse,
            crate::handlers::types::PropertyOptionsResponse,
            crate::handlers::types::ActionResponse,
        )
    ),
    info(
        title = "HubSpot Workflow Actions API",
        description = "OAuth credential lifecycle and disassociate workflow action callbacks",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
