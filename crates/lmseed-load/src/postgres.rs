//! PostgreSQL target store over a single lazily opened `PgConnection`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::error::BoxDynError;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgArgumentBuffer, PgConnectOptions, PgConnection, PgTypeInfo, Postgres};
use sqlx::types::Json;
use sqlx::{Connection, Executor, QueryBuilder, Type};
use tracing::{debug, info, warn};
use uuid::Uuid;

use lmseed_core::{Severity, SqlValue};

use crate::store::{StoreError, TargetStore, quote_identifier};

/// Time allowed for the initial handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Store backed by one PostgreSQL session, opened on first use.
pub struct PgStore {
    options: PgConnectOptions,
    connection: Option<PgConnection>,
}

impl PgStore {
    pub fn new(options: PgConnectOptions) -> Self {
        Self {
            options,
            connection: None,
        }
    }

    pub fn from_url(url: &str) -> Result<Self, StoreError> {
        let options = url
            .parse::<PgConnectOptions>()
            .map_err(|err| StoreError::Connection(err.to_string()))?;
        Ok(Self::new(options))
    }

    async fn session(&mut self) -> Result<&mut PgConnection, StoreError> {
        if self.connection.is_none() {
            let connect = PgConnection::connect_with(&self.options);
            let connection = tokio::time::timeout(CONNECT_TIMEOUT, connect)
                .await
                .map_err(|_| StoreError::Connection(format!("timed out after {CONNECT_TIMEOUT:?}")))?
                .map_err(|err| StoreError::Connection(err.to_string()))?;
            debug!(host = self.options.get_host(), "postgres session opened");
            self.connection = Some(connection);
        }
        self.connection
            .as_mut()
            .ok_or_else(|| StoreError::Connection("session unavailable".to_string()))
    }

    /// Forgets the session once it has failed fatally.
    fn settle<T>(&mut self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if let Err(err) = &result {
            if err.severity() == Severity::Fatal && self.connection.take().is_some() {
                warn!(error = %err, "postgres session lost");
            }
        }
        result
    }
}

/// Failures of the session itself, as opposed to the statement it carried.
fn is_session_lost(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

/// Maps a lost session to [`StoreError::Connection`] and anything else
/// through `otherwise`.
fn classify(err: sqlx::Error, otherwise: impl FnOnce(String) -> StoreError) -> StoreError {
    if is_session_lost(&err) {
        StoreError::Connection(err.to_string())
    } else {
        otherwise(err.to_string())
    }
}

async fn run_in_transaction(connection: &mut PgConnection, sql: &str) -> Result<(), StoreError> {
    let statement = |err: sqlx::Error| classify(err, StoreError::Statement);
    let mut transaction = connection.begin().await.map_err(statement)?;
    Executor::execute(&mut *transaction, sqlx::raw_sql(sql)).await.map_err(statement)?;
    transaction.commit().await.map_err(statement)
}

#[async_trait]
impl TargetStore for PgStore {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn connect(&mut self) -> Result<(), StoreError> {
        let connection = self.session().await?;
        let version = sqlx::query_scalar::<_, String>("select version()")
            .fetch_one(&mut *connection)
            .await
            .map_err(|err| StoreError::Connection(err.to_string()));
        let version = self.settle(version)?;
        info!(%version, "connected to postgres");
        Ok(())
    }

    async fn insert_rows(
        &mut self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<SqlValue>],
    ) -> Result<u64, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        if let Some(row) = rows.iter().find(|row| row.len() != columns.len()) {
            return Err(StoreError::Shape {
                expected: columns.len(),
                found: row.len(),
            });
        }
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "insert into {} ({}) ",
            quote_identifier(table)?,
            quote_columns(columns)?
        ));
        builder.push_values(rows, |mut separated, row| {
            for value in row {
                separated.push_bind(PgValue(value));
            }
        });

        let connection = self.session().await?;
        let result = builder
            .build()
            .execute(&mut *connection)
            .await
            .map(|done| done.rows_affected())
            .map_err(|err| classify(err, |message| StoreError::write(table, message)));
        self.settle(result)
    }

    async fn row_exists(&mut self, table: &str, key_column: &str, id: Uuid) -> Result<bool, StoreError> {
        let sql = format!(
            "select exists(select 1 from {} where {} = $1)",
            quote_identifier(table)?,
            quote_identifier(key_column)?
        );
        let connection = self.session().await?;
        let result = sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_one(&mut *connection)
            .await
            .map_err(|err| classify(err, |message| StoreError::write(table, message)));
        self.settle(result)
    }

    async fn update_row(
        &mut self,
        table: &str,
        key_column: &str,
        id: Uuid,
        columns: &[&str],
        values: &[SqlValue],
    ) -> Result<u64, StoreError> {
        if columns.len() != values.len() {
            return Err(StoreError::Shape {
                expected: columns.len(),
                found: values.len(),
            });
        }
        if columns.is_empty() {
            return Ok(0);
        }
        let mut builder = QueryBuilder::<Postgres>::new(format!("update {} set ", quote_identifier(table)?));
        let mut assignments = builder.separated(", ");
        for (column, value) in columns.iter().zip(values) {
            assignments.push(format!("{} = ", quote_identifier(column)?));
            assignments.push_bind_unseparated(PgValue(value));
        }
        builder.push(format!(" where {} = ", quote_identifier(key_column)?));
        builder.push_bind(id);

        let connection = self.session().await?;
        let result = builder
            .build()
            .execute(&mut *connection)
            .await
            .map(|done| done.rows_affected())
            .map_err(|err| classify(err, |message| StoreError::write(table, message)));
        self.settle(result)
    }

    async fn execute_script(&mut self, sql: &str) -> Result<(), StoreError> {
        let connection = self.session().await?;
        let result = run_in_transaction(connection, sql).await;
        self.settle(result)
    }

    async fn execute_statement(&mut self, sql: &str) -> Result<(), StoreError> {
        let connection = self.session().await?;
        let result = Executor::execute(&mut *connection, sqlx::raw_sql(sql))
            .await
            .map(|_| ())
            .map_err(|err| classify(err, StoreError::Statement));
        self.settle(result)
    }

    async fn set_referential_integrity(&mut self, enabled: bool) -> Result<(), StoreError> {
        let role = if enabled { "default" } else { "replica" };
        self.execute_statement(&format!("set session_replication_role = {role}"))
            .await
    }

    async fn truncate(&mut self, table: &str) -> Result<(), StoreError> {
        let sql = format!("truncate table {} cascade", quote_identifier(table)?);
        self.execute_statement(&sql).await.map_err(|err| match err {
            StoreError::Statement(message) => StoreError::write(table, message),
            other => other,
        })
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        if let Some(connection) = self.connection.take() {
            connection
                .close()
                .await
                .map_err(|err| StoreError::Connection(err.to_string()))?;
            debug!("postgres session closed");
        }
        Ok(())
    }
}

fn quote_columns(columns: &[&str]) -> Result<String, StoreError> {
    let quoted = columns
        .iter()
        .map(|column| quote_identifier(column))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(quoted.join(", "))
}

/// Binds a [`SqlValue`] with the PostgreSQL type of its variant, so NULLs
/// stay typed.
///
/// Text goes out with an unspecified type and takes the type of its target
/// column, which lets labels land in enum columns as well as in text ones.
struct PgValue<'a>(&'a SqlValue);

const UNSPECIFIED: Oid = Oid(0);

fn encode_by_ref<'q, T>(value: &T, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError>
where
    T: Encode<'q, Postgres>,
{
    value.encode_by_ref(buf)
}

impl<'q> Encode<'q, Postgres> for PgValue<'_> {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        match self.0 {
            SqlValue::Bool(value) => encode_by_ref(value, buf),
            SqlValue::Int(value) => encode_by_ref(value, buf),
            SqlValue::BigInt(value) => encode_by_ref(value, buf),
            SqlValue::Float(value) => encode_by_ref(value, buf),
            SqlValue::Text(value) => encode_by_ref(value, buf),
            SqlValue::Uuid(value) => encode_by_ref(value, buf),
            SqlValue::Timestamp(value) => encode_by_ref(value, buf),
            SqlValue::Date(value) => encode_by_ref(value, buf),
            SqlValue::Json(value) => encode_by_ref(&value.as_ref().map(Json), buf),
            SqlValue::TextArray(value) => encode_by_ref(value, buf),
            SqlValue::UuidArray(value) => encode_by_ref(value, buf),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self.0 {
            SqlValue::Bool(_) => <bool as Type<Postgres>>::type_info(),
            SqlValue::Int(_) => <i32 as Type<Postgres>>::type_info(),
            SqlValue::BigInt(_) => <i64 as Type<Postgres>>::type_info(),
            SqlValue::Float(_) => <f64 as Type<Postgres>>::type_info(),
            SqlValue::Text(_) => PgTypeInfo::with_oid(UNSPECIFIED),
            SqlValue::Uuid(_) => <Uuid as Type<Postgres>>::type_info(),
            SqlValue::Timestamp(_) => <chrono::DateTime<chrono::Utc> as Type<Postgres>>::type_info(),
            SqlValue::Date(_) => <chrono::NaiveDate as Type<Postgres>>::type_info(),
            SqlValue::Json(_) => <Json<Value> as Type<Postgres>>::type_info(),
            SqlValue::TextArray(_) => <Vec<String> as Type<Postgres>>::type_info(),
            SqlValue::UuidArray(_) => <Vec<Uuid> as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for PgValue<'_> {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn lost_sessions_are_fatal() {
        let lost = [
            sqlx::Error::Io(io::Error::from(io::ErrorKind::ConnectionReset)),
            sqlx::Error::Protocol("unexpected message".to_string()),
            sqlx::Error::PoolClosed,
            sqlx::Error::WorkerCrashed,
        ];
        for err in lost {
            let mapped = classify(err, StoreError::Statement);
            assert!(matches!(mapped, StoreError::Connection(_)), "{mapped}");
            assert_eq!(mapped.severity(), Severity::Fatal);
        }
    }

    #[test]
    fn statement_failures_stay_record_local() {
        let mapped = classify(sqlx::Error::RowNotFound, |message| StoreError::write("reviews", message));
        assert!(matches!(mapped, StoreError::Write { .. }));
        assert_eq!(mapped.severity(), Severity::Record);
    }

    #[test]
    fn failed_session_is_forgotten() {
        let mut store = PgStore::from_url("postgres://seeder@localhost/lms").expect("valid url");
        let result: Result<(), StoreError> = Err(StoreError::Connection("reset".to_string()));
        assert!(store.settle(result).is_err());
        assert!(store.connection.is_none());
    }

    #[test]
    fn text_takes_the_column_type() {
        let label = SqlValue::Text(Some("approved".to_string()));
        let info = PgValue(&label).produces().expect("declared type");
        assert_eq!(info.oid(), Some(UNSPECIFIED));

        let id = SqlValue::Uuid(None);
        assert_eq!(PgValue(&id).produces(), Some(<Uuid as Type<Postgres>>::type_info()));
    }
}
