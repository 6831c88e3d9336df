//! OpenAPI documentation aggregator.
//!
//! Collects all `#[utoipa::path]`-annotated handlers and `ToSchema`-derived
//! types into one OpenAPI spec, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "fieldgate API",
        version = "0.1.0",
        description = "Import commit & schema resolution backend: validates client field mappings against versioned schemas, commits them durably, and hands jobs to the worker queue.",
    ),
    tags(
        (name = "Health", description = "Server and broker health"),
        (name = "Imports", description = "Mapping commit and job lookup"),
        (name = "Schemas", description = "Active schema lookup per client and import type"),
    ),
    paths(
        crate::api::health,
        crate::api::commit_import,
        crate::api::get_import,
        crate::api::get_active_schema,
    )
)]
pub struct ApiDoc;
