//! Database error types

use thiserror::Error;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A stored value could not be mapped onto a domain type
    #[error("Row mapping error: {0}")]
    RowMapping(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Generic SQL error
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    /// Creates a row mapping error
    pub fn row_mapping(message: impl Into<String>) -> Self {
        DatabaseError::RowMapping(message.into())
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_) | DatabaseError::ForeignKeyViolation(_)
        )
    }

    /// Maps a raw SQLx error onto the specific variant for its PostgreSQL
    /// error code
    pub fn from_sqlx(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry(db_err.message().to_string()),
                    Some("23503") => {
                        DatabaseError::ForeignKeyViolation(db_err.message().to_string())
                    }
                    _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<DatabaseError> for core_kernel::PortError {
    fn from(error: DatabaseError) -> Self {
        use core_kernel::PortError;
        match error {
            DatabaseError::NotFound(message) => PortError::NotFound {
                entity_type: "record".to_string(),
                id: message,
            },
            DatabaseError::DuplicateEntry(message) => PortError::Conflict(message),
            DatabaseError::ConnectionFailed(message) => PortError::Connection(message),
            DatabaseError::PoolExhausted => {
                PortError::Connection("connection pool exhausted".to_string())
            }
            DatabaseError::RowMapping(message) => PortError::Serialization(message),
            other => PortError::Internal {
                message: other.to_string(),
                source: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_helper() {
        let error = DatabaseError::not_found("Claim", "CLM-42");
        assert!(error.is_not_found());
        assert!(error.to_string().contains("CLM-42"));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error = DatabaseError::from_sqlx(sqlx::Error::RowNotFound);
        assert!(error.is_not_found());
    }
}
