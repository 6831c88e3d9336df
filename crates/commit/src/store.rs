//! CRUD operations for the `import_jobs` PostgreSQL table.
//!
//! [`CommitStore`] is a stateless unit struct with async methods that take a
//! `&PgPool`. The importId primary key is the sole concurrency-control
//! primitive: a unique violation on insert means another call already
//! committed this import.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::error;

use fieldgate_schema::{SchemaResolver, SchemaVersion};

use crate::error::CommitError;
use crate::job::{ImportJob, NewImportJob};
use crate::registry::{ImportRegistration, ImportRegistry};

const JOB_COLUMNS: &str =
    "import_id, client_id, import_type, mapping, schema_version, committed_by, status, committed_at";

/// Persistence boundary of the commit pipeline.
///
/// `CommitService` only talks to storage through this trait, so the
/// orchestration can be exercised against an in-memory implementation.
/// [`PgJobStore`] is the production implementation.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Resolve an importId to its registered (client, import type) pair.
    async fn resolve_registration(
        &self,
        import_id: &str,
    ) -> Result<ImportRegistration, CommitError>;

    /// Return the active schema version for a (client, import type) pair.
    async fn active_schema(
        &self,
        client_id: &str,
        import_type: &str,
    ) -> Result<SchemaVersion, CommitError>;

    /// Durably persist a validated mapping as a new job.
    async fn persist(&self, new: NewImportJob) -> Result<ImportJob, CommitError>;

    /// Fetch a job by importId.
    async fn get(&self, import_id: &str) -> Result<Option<ImportJob>, CommitError>;

    /// Advance a job to `enqueued` after a broker ack.
    async fn mark_enqueued(&self, import_id: &str) -> Result<bool, CommitError>;

    /// Mark a freshly committed job as `enqueue_failed` after a broker error.
    async fn mark_enqueue_failed(&self, import_id: &str) -> Result<bool, CommitError>;

    /// Jobs awaiting the enqueue retry sweep, oldest first.
    async fn find_enqueue_failed(&self, limit: i64) -> Result<Vec<ImportJob>, CommitError>;
}

/// PostgreSQL-backed [`JobStore`] delegating to the SQL helpers below.
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn resolve_registration(
        &self,
        import_id: &str,
    ) -> Result<ImportRegistration, CommitError> {
        ImportRegistry::resolve(&self.pool, import_id).await
    }

    async fn active_schema(
        &self,
        client_id: &str,
        import_type: &str,
    ) -> Result<SchemaVersion, CommitError> {
        Ok(SchemaResolver::resolve(&self.pool, client_id, import_type).await?)
    }

    async fn persist(&self, new: NewImportJob) -> Result<ImportJob, CommitError> {
        CommitStore::persist(&self.pool, new).await
    }

    async fn get(&self, import_id: &str) -> Result<Option<ImportJob>, CommitError> {
        CommitStore::get(&self.pool, import_id).await
    }

    async fn mark_enqueued(&self, import_id: &str) -> Result<bool, CommitError> {
        CommitStore::mark_enqueued(&self.pool, import_id).await
    }

    async fn mark_enqueue_failed(&self, import_id: &str) -> Result<bool, CommitError> {
        CommitStore::mark_enqueue_failed(&self.pool, import_id).await
    }

    async fn find_enqueue_failed(&self, limit: i64) -> Result<Vec<ImportJob>, CommitError> {
        CommitStore::find_enqueue_failed(&self.pool, limit).await
    }
}

/// Stateless store for `import_jobs`.
pub struct CommitStore;

impl CommitStore {
    /// Durably persist a validated mapping as a new job.
    ///
    /// Single INSERT, so either the whole record lands or nothing does.
    /// Assigns `status = committed` and `committed_at = now()`. An existing
    /// importId fails with `DuplicateImportId`; callers treat that as
    /// "already committed" and continue with the stored record.
    pub async fn persist(pool: &PgPool, new: NewImportJob) -> Result<ImportJob, CommitError> {
        let result = sqlx::query_as::<_, ImportJob>(&format!(
            "INSERT INTO import_jobs
                (import_id, client_id, import_type, mapping, schema_version, committed_by, status)
             VALUES ($1, $2, $3, $4, $5, $6, 'committed')
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(&new.import_id)
        .bind(&new.client_id)
        .bind(&new.import_type)
        .bind(Json(&new.mapping))
        .bind(new.schema_version)
        .bind(&new.committed_by)
        .fetch_one(pool)
        .await;

        match result {
            Ok(job) => Ok(job),
            Err(e) => Err(map_unique_violation(e, &new.import_id)),
        }
    }

    /// Fetch a job by importId.
    pub async fn get(pool: &PgPool, import_id: &str) -> Result<Option<ImportJob>, CommitError> {
        let row = sqlx::query_as::<_, ImportJob>(&format!(
            "SELECT {JOB_COLUMNS} FROM import_jobs WHERE import_id = $1"
        ))
        .bind(import_id)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    /// Advance a job to `enqueued` after a broker ack.
    ///
    /// Guarded so only `committed` and `enqueue_failed` rows move; returns
    /// whether the transition applied (false means the job was already
    /// enqueued by a concurrent call, which is benign).
    pub async fn mark_enqueued(pool: &PgPool, import_id: &str) -> Result<bool, CommitError> {
        let result = sqlx::query(
            "UPDATE import_jobs SET status = 'enqueued'
             WHERE import_id = $1 AND status IN ('committed', 'enqueue_failed')",
        )
        .bind(import_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a freshly committed job as `enqueue_failed` after a broker error.
    pub async fn mark_enqueue_failed(pool: &PgPool, import_id: &str) -> Result<bool, CommitError> {
        let result = sqlx::query(
            "UPDATE import_jobs SET status = 'enqueue_failed'
             WHERE import_id = $1 AND status = 'committed'",
        )
        .bind(import_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Jobs awaiting the enqueue retry sweep, oldest first.
    pub async fn find_enqueue_failed(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<ImportJob>, CommitError> {
        let rows = sqlx::query_as::<_, ImportJob>(&format!(
            "SELECT {JOB_COLUMNS} FROM import_jobs
             WHERE status = 'enqueue_failed'
             ORDER BY committed_at
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}

/// Map a PostgreSQL unique violation (23505) to `DuplicateImportId`.
fn map_unique_violation(e: sqlx::Error, import_id: &str) -> CommitError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some("23505") {
            return CommitError::DuplicateImportId(import_id.to_string());
        }
    }
    error!("import job store database error: {}", e);
    CommitError::Store(e)
}
