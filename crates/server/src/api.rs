//! HTTP handlers for the import commit pipeline.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use fieldgate_commit::{CommitError, ImportJob, JobStatus};
use fieldgate_schema::{Mapping, SchemaError, SchemaResolver, Violation};

use crate::auth::AuthPrincipal;
use crate::state::AppState;

pub type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

// ── Response types ────────────────────────────────────────────────

/// Structured error body: kind is stable for programmatic handling, the
/// optional fields carry the validation detail and the committed flag for
/// enqueue failures.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<Violation>>,
    /// Present on enqueue failures: true means the job record is durable
    /// and delivery is pending, not that nothing was committed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committed: Option<bool>,
}

impl ErrorResponse {
    fn new(kind: &'static str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            kind,
            violations: None,
            committed: None,
        }
    }

    pub(crate) fn unauthenticated() -> Self {
        Self::new(
            "unauthenticated",
            format!("missing or empty {} header", crate::auth::PRINCIPAL_HEADER),
        )
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommitRequest {
    #[schema(value_type = Object)]
    pub mapping: Mapping,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommitResponse {
    pub ok: bool,
    pub import_id: String,
    pub status: JobStatus,
    pub schema_version: i32,
    /// True when an earlier commit already persisted this importId.
    pub deduplicated: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActiveSchemaResponse {
    #[serde(rename = "schemaJson")]
    #[schema(value_type = Vec<Object>)]
    pub schema_json: Vec<fieldgate_schema::FieldDef>,
    pub version: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub queue_connected: bool,
}

// ── Error mapping ─────────────────────────────────────────────────

/// Map a pipeline error to its HTTP representation, preserving the kind.
pub fn commit_error_response(err: CommitError) -> (StatusCode, Json<ErrorResponse>) {
    let message = err.to_string();
    match err {
        CommitError::UnknownImport(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("unknown_import", message)),
        ),
        CommitError::Schema(SchemaError::SchemaNotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("schema_not_found", message)),
        ),
        CommitError::Schema(SchemaError::InvalidIdentifier(_)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("invalid_identifier", message)),
        ),
        CommitError::Schema(SchemaError::Database(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("store_failure", message)),
        ),
        CommitError::Validation(violations) => {
            let mut body = ErrorResponse::new("validation_error", message);
            body.violations = Some(violations);
            (StatusCode::UNPROCESSABLE_ENTITY, Json(body))
        }
        // The service absorbs duplicates; surfacing one means the existing
        // record could not be read back.
        CommitError::DuplicateImportId(_) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("duplicate_import_id", message)),
        ),
        CommitError::Enqueue { .. } => {
            let mut body = ErrorResponse::new("enqueue_failure", message);
            body.committed = Some(true);
            (StatusCode::BAD_GATEWAY, Json(body))
        }
        CommitError::Store(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("store_failure", message)),
        ),
    }
}

// ── Handlers ──────────────────────────────────────────────────────

/// Commit a field mapping for a registered import.
#[utoipa::path(
    post,
    path = "/imports/{import_id}/commit",
    tag = "Imports",
    params(("import_id" = String, Path, description = "Caller-supplied import identifier")),
    request_body = CommitRequest,
    responses(
        (status = 200, description = "Mapping committed and enqueued", body = CommitResponse),
        (status = 400, description = "Invalid identifier", body = ErrorResponse),
        (status = 401, description = "Missing principal header", body = ErrorResponse),
        (status = 404, description = "Unknown import or no active schema", body = ErrorResponse),
        (status = 422, description = "Mapping rejected with violation list", body = ErrorResponse),
        (status = 502, description = "Committed but enqueue failed (delivery pending)", body = ErrorResponse),
    )
)]
pub async fn commit_import(
    State(state): State<Arc<AppState>>,
    Path(import_id): Path<String>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(req): Json<CommitRequest>,
) -> ApiResult<Json<CommitResponse>> {
    let outcome = state
        .service
        .commit(&import_id, req.mapping, &principal)
        .await
        .map_err(commit_error_response)?;

    Ok(Json(CommitResponse {
        ok: true,
        import_id: outcome.job.import_id,
        status: outcome.job.status,
        schema_version: outcome.job.schema_version,
        deduplicated: outcome.deduplicated,
    }))
}

/// Fetch a committed import job.
#[utoipa::path(
    get,
    path = "/imports/{import_id}",
    tag = "Imports",
    params(("import_id" = String, Path, description = "Import identifier")),
    responses(
        (status = 200, description = "Committed job record", body = ImportJob),
        (status = 404, description = "No committed job for this importId", body = ErrorResponse),
    )
)]
pub async fn get_import(
    State(state): State<Arc<AppState>>,
    Path(import_id): Path<String>,
) -> ApiResult<Json<ImportJob>> {
    let job = state
        .service
        .get_job(&import_id)
        .await
        .map_err(commit_error_response)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    "unknown_import",
                    format!("no committed job for import '{}'", import_id),
                )),
            )
        })?;

    Ok(Json(job))
}

/// Return the active schema for a (client, import type) pair.
#[utoipa::path(
    get,
    path = "/clients/{client_id}/imports/{import_type}/schema",
    tag = "Schemas",
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("import_type" = String, Path, description = "Import type"),
    ),
    responses(
        (status = 200, description = "Active schema version", body = ActiveSchemaResponse),
        (status = 404, description = "No active schema", body = ErrorResponse),
    )
)]
pub async fn get_active_schema(
    State(state): State<Arc<AppState>>,
    Path((client_id, import_type)): Path<(String, String)>,
) -> ApiResult<Json<ActiveSchemaResponse>> {
    let schema = SchemaResolver::resolve(&state.pool, &client_id, &import_type)
        .await
        .map_err(|e| commit_error_response(CommitError::Schema(e)))?;

    Ok(Json(ActiveSchemaResponse {
        schema_json: schema.field_definitions,
        version: schema.version,
    }))
}

/// Server health including broker reachability.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Server health", body = HealthResponse))
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let queue_connected = state
        .publisher
        .health_check()
        .await
        .map(|h| h.connected)
        .unwrap_or(false);

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        queue_connected,
    })
}
