//! Active schema version lookup.
//!
//! Read-only against `schema_versions`. Resolution is deliberately not
//! joined with the later persist: a schema activated between resolve and
//! commit does not retroactively apply; the job pins the version it
//! validated against.

use sqlx::PgPool;
use tracing::debug;

use crate::error::SchemaError;
use crate::model::SchemaVersion;

/// Stateless resolver for the active schema of a (client, import type) pair.
pub struct SchemaResolver;

impl SchemaResolver {
    /// Return the active schema version with the highest version number.
    ///
    /// Fails with `SchemaNotFound` when no active row exists for the pair.
    pub async fn resolve(
        pool: &PgPool,
        client_id: &str,
        import_type: &str,
    ) -> Result<SchemaVersion, SchemaError> {
        if client_id.trim().is_empty() {
            return Err(SchemaError::InvalidIdentifier("client_id"));
        }
        if import_type.trim().is_empty() {
            return Err(SchemaError::InvalidIdentifier("import_type"));
        }

        let row = sqlx::query_as::<_, SchemaVersion>(
            "SELECT client_id, import_type, version, field_definitions, is_active
             FROM schema_versions
             WHERE client_id = $1 AND import_type = $2 AND is_active
             ORDER BY version DESC
             LIMIT 1",
        )
        .bind(client_id)
        .bind(import_type)
        .fetch_optional(pool)
        .await?;

        match row {
            Some(schema) => {
                debug!(
                    client_id = %client_id,
                    import_type = %import_type,
                    version = schema.version,
                    "Resolved active schema"
                );
                Ok(schema)
            }
            None => Err(SchemaError::SchemaNotFound {
                client_id: client_id.to_string(),
                import_type: import_type.to_string(),
            }),
        }
    }
}
