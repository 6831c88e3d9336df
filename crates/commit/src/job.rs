//! Import job model and status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use fieldgate_schema::Mapping;

/// Lifecycle status of a committed import job.
///
/// The only legal transitions are `committed → enqueued`,
/// `committed → enqueue_failed` and `enqueue_failed → enqueued` (retry
/// sweep). `enqueued` is terminal from this core's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
pub enum JobStatus {
    Committed,
    Enqueued,
    EnqueueFailed,
}

impl JobStatus {
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Committed, Enqueued) | (Committed, EnqueueFailed) | (EnqueueFailed, Enqueued)
        )
    }
}

/// A durably committed import job.
///
/// Immutable after creation except for status transitions: the mapping and
/// the schema version it was validated against are pinned together forever.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct ImportJob {
    pub import_id: String,
    pub client_id: String,
    pub import_type: String,
    #[sqlx(json)]
    #[schema(value_type = Object)]
    pub mapping: Mapping,
    pub schema_version: i32,
    pub committed_by: String,
    pub status: JobStatus,
    pub committed_at: DateTime<Utc>,
}

/// Input to `CommitStore::persist` (the store assigns status and timestamp).
#[derive(Debug, Clone)]
pub struct NewImportJob {
    pub import_id: String,
    pub client_id: String,
    pub import_type: String,
    pub mapping: Mapping,
    pub schema_version: i32,
    pub committed_by: String,
}
