//! Schema lookup error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("{0} must be a non-empty identifier")]
    InvalidIdentifier(&'static str),

    #[error("no active schema for client '{client_id}', import type '{import_type}'")]
    SchemaNotFound {
        client_id: String,
        import_type: String,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
