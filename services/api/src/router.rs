//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application: the
//! chat and analysis endpoints plus the OpenAPI documentation.

use crate::{
    handlers,
    models::{AnalyzePayload, AnalyzeResponse, ChatPayload, ChatResponse, ErrorResponse},
    state::AppState,
};

use axum::{Router, routing::post};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::chat, handlers::analyze),
    components(
        schemas(ChatPayload, ChatResponse, AnalyzePayload, AnalyzeResponse, ErrorResponse)
    ),
    tags(
        (name = "Interview API", description = "Language-practice interview sessions and proficiency reports")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/chat", post(handlers::chat))
        .route("/analyze", post(handlers::analyze))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_lists_endpoints() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/chat"));
        assert!(doc.paths.paths.contains_key("/analyze"));

        let schemas = doc.components.expect("components").schemas;
        assert!(schemas.contains_key("ChatPayload"));
        assert!(schemas.contains_key("ErrorResponse"));
    }
}
