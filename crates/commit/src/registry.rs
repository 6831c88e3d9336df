//! Read-only importId resolution.
//!
//! The upstream collaborator that announces an import writes one row into
//! `import_registrations`; this core only ever reads it to learn which
//! (client, import type) pair an importId belongs to.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::CommitError;

/// Registration of an announced import.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ImportRegistration {
    pub import_id: String,
    pub client_id: String,
    pub import_type: String,
    pub created_at: DateTime<Utc>,
}

/// Stateless lookup over `import_registrations`.
pub struct ImportRegistry;

impl ImportRegistry {
    /// Resolve an importId to its registered (client, import type) pair.
    ///
    /// Fails with `UnknownImport` when the upstream never announced it.
    pub async fn resolve(pool: &PgPool, import_id: &str) -> Result<ImportRegistration, CommitError> {
        let row = sqlx::query_as::<_, ImportRegistration>(
            "SELECT import_id, client_id, import_type, created_at
             FROM import_registrations
             WHERE import_id = $1",
        )
        .bind(import_id)
        .fetch_optional(pool)
        .await?;

        row.ok_or_else(|| CommitError::UnknownImport(import_id.to_string()))
    }
}
