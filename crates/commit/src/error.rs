//! Commit pipeline error taxonomy.

use thiserror::Error;

use fieldgate_queue::QueueError;
use fieldgate_schema::{SchemaError, Violation};

#[derive(Debug, Error)]
pub enum CommitError {
    /// No registration row resolves this importId to a (client, import type).
    #[error("unknown import: {0}")]
    UnknownImport(String),

    /// Schema lookup failed (`SchemaNotFound` propagated verbatim).
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Mapping rejected; carries the full ordered violation list so the
    /// caller can correct everything in one round trip.
    #[error("mapping validation failed with {} violation(s)", .0.len())]
    Validation(Vec<Violation>),

    /// Unique-key conflict on importId. Absorbed by the service as an
    /// idempotent retry; only surfaced if the existing record cannot be read.
    #[error("import '{0}' is already committed")]
    DuplicateImportId(String),

    /// Broker did not acknowledge the enqueue. The job record is already
    /// durable and marked enqueue_failed for the retry sweep.
    #[error("enqueue failed for committed import '{import_id}': {source}")]
    Enqueue {
        import_id: String,
        #[source]
        source: QueueError,
    },

    /// Transient store failure. Persist is atomic, so the whole commit call
    /// is safe to retry.
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldgate_schema::{Violation, ViolationKind};

    #[test]
    fn test_validation_error_reports_count() {
        let err = CommitError::Validation(vec![
            Violation { field: "budget".into(), kind: ViolationKind::Missing },
            Violation { field: "region".into(), kind: ViolationKind::Unknown },
        ]);
        assert!(err.to_string().contains("2 violation(s)"));
    }

    #[test]
    fn test_schema_not_found_propagates_verbatim() {
        let schema_err = SchemaError::SchemaNotFound {
            client_id: "acme".into(),
            import_type: "campaigns".into(),
        };
        let expected = schema_err.to_string();
        let err: CommitError = schema_err.into();
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_enqueue_error_names_the_import() {
        let err = CommitError::Enqueue {
            import_id: "imp-1".into(),
            source: QueueError::Timeout(5000),
        };
        let msg = err.to_string();
        assert!(msg.contains("imp-1"));
        assert!(msg.contains("committed"));
    }
}
