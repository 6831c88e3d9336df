//! Commit orchestration: resolve → validate → persist → enqueue.
//!
//! One logical operation per inbound commit call. The three external calls
//! (schema read, store write, broker publish) run sequentially; persist
//! always completes before the enqueue is attempted, so a crash in between
//! leaves a resumable committed/enqueue_failed record rather than an orphan
//! queue message.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};

use fieldgate_core::Principal;
use fieldgate_queue::JobPublisher;
use fieldgate_schema::{validate, Mapping, ValidationResult};

use crate::error::CommitError;
use crate::job::{ImportJob, JobStatus, NewImportJob};
use crate::store::{JobStore, PgJobStore};

/// Result of a successful commit call.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub job: ImportJob,
    /// True when an earlier call already persisted this importId and the
    /// duplicate was absorbed.
    pub deduplicated: bool,
}

/// Orchestrates the import commit pipeline.
///
/// Stateless beyond the shared store and publisher; safe for unlimited
/// concurrent callers.
pub struct CommitService {
    store: Arc<dyn JobStore>,
    publisher: Arc<dyn JobPublisher>,
}

impl CommitService {
    pub fn new(store: Arc<dyn JobStore>, publisher: Arc<dyn JobPublisher>) -> Self {
        Self { store, publisher }
    }

    /// Build a service over the PostgreSQL store.
    pub fn postgres(pool: PgPool, publisher: Arc<dyn JobPublisher>) -> Self {
        Self::new(Arc::new(PgJobStore::new(pool)), publisher)
    }

    /// Commit a client-supplied mapping for a registered import.
    ///
    /// The schema version is pinned at validation time: an activation racing
    /// this call does not change what the job commits against.
    pub async fn commit(
        &self,
        import_id: &str,
        mapping: Mapping,
        principal: &Principal,
    ) -> Result<CommitOutcome, CommitError> {
        let registration = self.store.resolve_registration(import_id).await?;

        let schema = self
            .store
            .active_schema(&registration.client_id, &registration.import_type)
            .await?;

        match validate(&mapping, &schema) {
            ValidationResult::Valid => {}
            ValidationResult::Invalid(violations) => {
                info!(
                    import_id,
                    schema_version = schema.version,
                    violations = violations.len(),
                    "Mapping rejected"
                );
                return Err(CommitError::Validation(violations));
            }
        }

        let (mut job, deduplicated) = match self
            .store
            .persist(NewImportJob {
                import_id: import_id.to_string(),
                client_id: registration.client_id,
                import_type: registration.import_type,
                mapping,
                schema_version: schema.version,
                committed_by: principal.as_str().to_string(),
            })
            .await
        {
            Ok(job) => {
                info!(
                    import_id,
                    schema_version = job.schema_version,
                    committed_by = %principal,
                    "Import job committed"
                );
                (job, false)
            }
            Err(CommitError::DuplicateImportId(_)) => {
                // Idempotent retry: reuse the record the earlier call stored.
                let existing = self
                    .store
                    .get(import_id)
                    .await?
                    .ok_or(CommitError::Store(sqlx::Error::RowNotFound))?;
                info!(
                    import_id,
                    status = ?existing.status,
                    "Duplicate commit absorbed, using existing record"
                );
                (existing, true)
            }
            Err(e) => return Err(e),
        };

        if !job.status.can_transition_to(JobStatus::Enqueued) {
            // A previous call already delivered the notification.
            return Ok(CommitOutcome { job, deduplicated });
        }

        match self.publisher.publish(import_id).await {
            Ok(()) => {
                self.store.mark_enqueued(import_id).await?;
                job.status = JobStatus::Enqueued;
                info!(import_id, "Import job enqueued");
                Ok(CommitOutcome { job, deduplicated })
            }
            Err(e) => {
                // Commit stays durable; the retry sweep picks the job up later.
                if let Err(mark_err) = self.store.mark_enqueue_failed(import_id).await {
                    warn!(import_id, "Failed to mark job enqueue_failed: {}", mark_err);
                }
                warn!(import_id, "Enqueue failed: {}, job left for retry sweep", e);
                Err(CommitError::Enqueue {
                    import_id: import_id.to_string(),
                    source: e,
                })
            }
        }
    }

    /// Fetch a committed job record.
    pub async fn get_job(&self, import_id: &str) -> Result<Option<ImportJob>, CommitError> {
        self.store.get(import_id).await
    }

    /// Re-publish up to `limit` enqueue_failed jobs, advancing acked ones to
    /// `enqueued`. Returns how many were delivered.
    pub async fn retry_enqueue_failed(&self, limit: i64) -> Result<usize, CommitError> {
        let jobs = self.store.find_enqueue_failed(limit).await?;
        if jobs.is_empty() {
            return Ok(0);
        }

        let mut delivered = 0usize;
        for job in &jobs {
            match self.publisher.publish(&job.import_id).await {
                Ok(()) => {
                    self.store.mark_enqueued(&job.import_id).await?;
                    delivered += 1;
                }
                Err(e) => {
                    warn!(import_id = %job.import_id, "Retry enqueue failed: {}", e);
                }
            }
        }

        info!(
            attempted = jobs.len(),
            delivered, "Enqueue retry sweep finished"
        );
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;

    use fieldgate_queue::{QueueError, QueueHealth};
    use fieldgate_schema::{FieldDef, FieldType, SchemaError, SchemaVersion};

    use crate::registry::ImportRegistration;

    struct MemStore {
        registrations: HashMap<String, ImportRegistration>,
        schemas: HashMap<(String, String), SchemaVersion>,
        jobs: Mutex<HashMap<String, ImportJob>>,
    }

    impl MemStore {
        fn with_campaigns() -> Self {
            let mut registrations = HashMap::new();
            registrations.insert(
                "imp-1".to_string(),
                ImportRegistration {
                    import_id: "imp-1".into(),
                    client_id: "acme".into(),
                    import_type: "campaigns".into(),
                    created_at: Utc::now(),
                },
            );
            let mut schemas = HashMap::new();
            schemas.insert(
                ("acme".to_string(), "campaigns".to_string()),
                SchemaVersion {
                    client_id: "acme".into(),
                    import_type: "campaigns".into(),
                    version: 3,
                    field_definitions: vec![
                        FieldDef {
                            name: "name".into(),
                            field_type: FieldType::Text,
                            required: true,
                        },
                        FieldDef {
                            name: "budget".into(),
                            field_type: FieldType::Number,
                            required: true,
                        },
                    ],
                    is_active: true,
                },
            );
            Self {
                registrations,
                schemas,
                jobs: Mutex::new(HashMap::new()),
            }
        }

        fn job(&self, import_id: &str) -> Option<ImportJob> {
            self.jobs.lock().unwrap().get(import_id).cloned()
        }
    }

    #[async_trait]
    impl JobStore for MemStore {
        async fn resolve_registration(
            &self,
            import_id: &str,
        ) -> Result<ImportRegistration, CommitError> {
            self.registrations
                .get(import_id)
                .cloned()
                .ok_or_else(|| CommitError::UnknownImport(import_id.to_string()))
        }

        async fn active_schema(
            &self,
            client_id: &str,
            import_type: &str,
        ) -> Result<SchemaVersion, CommitError> {
            self.schemas
                .get(&(client_id.to_string(), import_type.to_string()))
                .cloned()
                .ok_or_else(|| {
                    CommitError::Schema(SchemaError::SchemaNotFound {
                        client_id: client_id.to_string(),
                        import_type: import_type.to_string(),
                    })
                })
        }

        async fn persist(&self, new: NewImportJob) -> Result<ImportJob, CommitError> {
            let mut jobs = self.jobs.lock().unwrap();
            if jobs.contains_key(&new.import_id) {
                return Err(CommitError::DuplicateImportId(new.import_id));
            }
            let job = ImportJob {
                import_id: new.import_id.clone(),
                client_id: new.client_id,
                import_type: new.import_type,
                mapping: new.mapping,
                schema_version: new.schema_version,
                committed_by: new.committed_by,
                status: JobStatus::Committed,
                committed_at: Utc::now(),
            };
            jobs.insert(new.import_id.clone(), job.clone());
            Ok(job)
        }

        async fn get(&self, import_id: &str) -> Result<Option<ImportJob>, CommitError> {
            Ok(self.job(import_id))
        }

        async fn mark_enqueued(&self, import_id: &str) -> Result<bool, CommitError> {
            let mut jobs = self.jobs.lock().unwrap();
            match jobs.get_mut(import_id) {
                Some(job) if job.status.can_transition_to(JobStatus::Enqueued) => {
                    job.status = JobStatus::Enqueued;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn mark_enqueue_failed(&self, import_id: &str) -> Result<bool, CommitError> {
            let mut jobs = self.jobs.lock().unwrap();
            match jobs.get_mut(import_id) {
                Some(job) if job.status.can_transition_to(JobStatus::EnqueueFailed) => {
                    job.status = JobStatus::EnqueueFailed;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn find_enqueue_failed(&self, limit: i64) -> Result<Vec<ImportJob>, CommitError> {
            let jobs = self.jobs.lock().unwrap();
            let mut failed: Vec<ImportJob> = jobs
                .values()
                .filter(|j| j.status == JobStatus::EnqueueFailed)
                .cloned()
                .collect();
            failed.sort_by_key(|j| j.committed_at);
            failed.truncate(limit as usize);
            Ok(failed)
        }
    }

    /// Publisher that can be flipped into a failure mode mid-test.
    #[derive(Default)]
    struct FlakyPublisher {
        fail: AtomicBool,
        published: Mutex<Vec<String>>,
    }

    impl FlakyPublisher {
        fn published(&self) -> Vec<String> {
            self.published.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobPublisher for FlakyPublisher {
        async fn publish(&self, import_id: &str) -> Result<(), QueueError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(QueueError::Timeout(5000));
            }
            self.published.lock().unwrap().push(import_id.to_string());
            Ok(())
        }

        async fn health_check(&self) -> Result<QueueHealth, QueueError> {
            Ok(QueueHealth {
                connected: true,
                approximate_message_count: None,
                provider: "mem".to_string(),
            })
        }
    }

    fn harness() -> (Arc<MemStore>, Arc<FlakyPublisher>, CommitService) {
        let store = Arc::new(MemStore::with_campaigns());
        let publisher = Arc::new(FlakyPublisher::default());
        let service = CommitService::new(store.clone(), publisher.clone());
        (store, publisher, service)
    }

    fn mapping() -> Mapping {
        serde_json::from_value(json!({"name": "col_a", "budget": "col_b"})).unwrap()
    }

    fn principal() -> Principal {
        Principal::new("user-42").unwrap()
    }

    #[tokio::test]
    async fn test_commit_persists_then_enqueues() {
        let (store, publisher, service) = harness();

        let outcome = service.commit("imp-1", mapping(), &principal()).await.unwrap();

        assert!(!outcome.deduplicated);
        assert_eq!(outcome.job.status, JobStatus::Enqueued);
        assert_eq!(outcome.job.schema_version, 3);
        assert_eq!(publisher.published(), vec!["imp-1"]);
        assert_eq!(store.job("imp-1").unwrap().status, JobStatus::Enqueued);
    }

    #[tokio::test]
    async fn test_duplicate_commit_absorbed_without_republish() {
        let (store, publisher, service) = harness();

        service.commit("imp-1", mapping(), &principal()).await.unwrap();
        let second = service.commit("imp-1", mapping(), &principal()).await.unwrap();

        assert!(second.deduplicated);
        assert_eq!(second.job.status, JobStatus::Enqueued);
        // One record, one delivery.
        assert_eq!(store.jobs.lock().unwrap().len(), 1);
        assert_eq!(publisher.published(), vec!["imp-1"]);
    }

    #[tokio::test]
    async fn test_failed_publish_leaves_durable_enqueue_failed_row() {
        let (store, publisher, service) = harness();
        publisher.fail.store(true, Ordering::SeqCst);

        let err = service.commit("imp-1", mapping(), &principal()).await.unwrap_err();

        assert!(matches!(err, CommitError::Enqueue { .. }));
        // The record survives the broker failure.
        assert_eq!(store.job("imp-1").unwrap().status, JobStatus::EnqueueFailed);
    }

    #[tokio::test]
    async fn test_duplicate_after_enqueue_failure_republishes() {
        let (store, publisher, service) = harness();

        publisher.fail.store(true, Ordering::SeqCst);
        service.commit("imp-1", mapping(), &principal()).await.unwrap_err();

        publisher.fail.store(false, Ordering::SeqCst);
        let outcome = service.commit("imp-1", mapping(), &principal()).await.unwrap();

        assert!(outcome.deduplicated);
        assert_eq!(outcome.job.status, JobStatus::Enqueued);
        assert_eq!(publisher.published(), vec!["imp-1"]);
        assert_eq!(store.job("imp-1").unwrap().status, JobStatus::Enqueued);
    }

    #[tokio::test]
    async fn test_retry_sweep_redelivers_failed_jobs() {
        let (store, publisher, service) = harness();

        publisher.fail.store(true, Ordering::SeqCst);
        service.commit("imp-1", mapping(), &principal()).await.unwrap_err();

        publisher.fail.store(false, Ordering::SeqCst);
        let delivered = service.retry_enqueue_failed(10).await.unwrap();

        assert_eq!(delivered, 1);
        assert_eq!(store.job("imp-1").unwrap().status, JobStatus::Enqueued);
        assert_eq!(service.retry_enqueue_failed(10).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_mapping_persists_nothing() {
        let (store, _publisher, service) = harness();

        let m: Mapping = serde_json::from_value(json!({"name": "col_a"})).unwrap();
        let err = service.commit("imp-1", m, &principal()).await.unwrap_err();

        assert!(matches!(err, CommitError::Validation(_)));
        assert!(store.job("imp-1").is_none());
    }

    #[tokio::test]
    async fn test_unknown_import_rejected() {
        let (_store, _publisher, service) = harness();

        let err = service.commit("imp-ghost", mapping(), &principal()).await.unwrap_err();
        assert!(matches!(err, CommitError::UnknownImport(_)));
    }
}
