use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use lmseed_core::{Severity, SqlValue};

/// Errors raised by a target store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot connect to the target store: {0}")]
    Connection(String),
    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),
    #[error("row has {found} values for {expected} columns")]
    Shape { expected: usize, found: usize },
    #[error("{table}: {message}")]
    Write { table: String, message: String },
    #[error("statement failed: {0}")]
    Statement(String),
}

impl StoreError {
    pub fn severity(&self) -> Severity {
        match self {
            StoreError::Connection(_) => Severity::Fatal,
            StoreError::InvalidIdentifier(_) | StoreError::Shape { .. } => Severity::Phase,
            StoreError::Write { .. } | StoreError::Statement(_) => Severity::Record,
        }
    }

    pub(crate) fn write(table: &str, err: impl std::fmt::Display) -> Self {
        StoreError::Write {
            table: table.to_string(),
            message: err.to_string(),
        }
    }
}

/// The write interface the loader, the materializer and the script
/// executor share.
///
/// A store owns at most one session; it is opened lazily by the first
/// operation that needs it and released by [`TargetStore::close`].
#[async_trait]
pub trait TargetStore: Send {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Opens the session and checks that the store answers.
    async fn connect(&mut self) -> Result<(), StoreError>;

    /// Inserts `rows` into `table` as one statement; either every row is
    /// written or none is.
    async fn insert_rows(
        &mut self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<SqlValue>],
    ) -> Result<u64, StoreError>;

    async fn row_exists(&mut self, table: &str, key_column: &str, id: Uuid) -> Result<bool, StoreError>;

    /// Overwrites `columns` of the row whose key is `id`; returns the
    /// number of rows touched.
    async fn update_row(
        &mut self,
        table: &str,
        key_column: &str,
        id: Uuid,
        columns: &[&str],
        values: &[SqlValue],
    ) -> Result<u64, StoreError>;

    /// Runs a multi-statement script inside a single transaction.
    async fn execute_script(&mut self, sql: &str) -> Result<(), StoreError>;

    /// Runs one statement outside any transaction.
    async fn execute_statement(&mut self, sql: &str) -> Result<(), StoreError>;

    /// Turns foreign-key enforcement off or back on for this session.
    async fn set_referential_integrity(&mut self, enabled: bool) -> Result<(), StoreError>;

    /// Empties `table` and everything that references it.
    async fn truncate(&mut self, table: &str) -> Result<(), StoreError>;

    async fn close(&mut self) -> Result<(), StoreError>;
}

/// Quotes a possibly schema-qualified table or column name.
///
/// Only ASCII alphanumerics and `_` are accepted in each part.
pub fn quote_identifier(name: &str) -> Result<String, StoreError> {
    let parts: Vec<&str> = name.split('.').collect();
    let valid = |part: &&str| {
        !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    if parts.len() > 2 || !parts.iter().all(valid) {
        return Err(StoreError::InvalidIdentifier(name.to_string()));
    }
    Ok(parts
        .iter()
        .map(|part| format!("\"{part}\""))
        .collect::<Vec<_>>()
        .join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_schema_and_table() {
        assert_eq!(quote_identifier("auth.users").expect("valid"), "\"auth\".\"users\"");
        assert_eq!(quote_identifier("course_enrollments").expect("valid"), "\"course_enrollments\"");
    }

    #[test]
    fn rejects_injection_attempts() {
        for name in ["users; drop table x", "a.b.c", "", "auth.", "na\"me"] {
            assert!(quote_identifier(name).is_err(), "{name}");
        }
    }

    #[test]
    fn connection_errors_are_fatal() {
        assert_eq!(StoreError::Connection("refused".into()).severity(), Severity::Fatal);
        assert_eq!(StoreError::write("reviews", "check violated").severity(), Severity::Record);
    }
}
