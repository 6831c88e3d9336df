//! HTTP router construction.
//!
//! Assembles routes, CORS, and OpenAPI docs into a single `Router`.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::state::AppState;
use crate::{api, doc};

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/imports/{import_id}/commit", post(api::commit_import))
        .route("/imports/{import_id}", get(api::get_import))
        .route(
            "/clients/{client_id}/imports/{import_type}/schema",
            get(api::get_active_schema),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(Scalar::with_url("/docs", doc::ApiDoc::openapi()))
}
