//! SQLite driver: catalog inspection, plan probing, SELECT execution.
//!
//! # Security Guarantees
//! - Connection strings are sanitized in error messages
//! - A connection is opened per operation and dropped when the call
//!   returns; nothing is pooled or kept across calls
//!
//! # Features
//! - Schema introspection over `sqlite_master` plus `PRAGMA table_info`
//! - `EXPLAIN` plan probing that surfaces the engine's own error detail
//! - Dynamic row decoding into JSON values; BLOBs are base64-encoded
//!
//! Note that an in-memory database (`sqlite::memory:`) gets a fresh, empty
//! database on every operation because connections are per-call. Use a
//! file-backed database for anything that must persist between stages.

use async_trait::async_trait;
use base64::Engine;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Column, Connection, Row, TypeInfo};

use super::DatabaseDriver;
use crate::error::{QueryPilotError, Result};
use crate::models::{DatabaseType, ResultSet, SchemaSnapshot};

/// SQLite driver over short-lived, per-operation connections.
pub struct SqliteDriver {
    database_url: String,
}

impl SqliteDriver {
    /// Creates a driver for a `sqlite:` URL or a bare database file path.
    ///
    /// # Errors
    /// Returns [`QueryPilotError::Configuration`] if the string is empty.
    pub fn new(database_url: &str) -> Result<Self> {
        if database_url.trim().is_empty() {
            return Err(QueryPilotError::configuration(
                "SQLite connection string is empty",
            ));
        }
        // sqlx expects the sqlite: scheme; bare file paths get one.
        let database_url = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{database_url}")
        };
        Ok(Self { database_url })
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        SqliteConnection::connect(&self.database_url)
            .await
            .map_err(QueryPilotError::connection_failed)
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    async fn test_connection(&self) -> Result<()> {
        let mut conn = self.connect().await?;
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&mut conn)
            .await
            .map_err(QueryPilotError::connection_failed)?;
        Ok(())
    }

    async fn inspect_schema(&self) -> Result<SchemaSnapshot> {
        let mut conn = self.connect().await?;

        let tables_query = r"
            SELECT name FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
        ";

        let table_rows = sqlx::query(tables_query)
            .fetch_all(&mut conn)
            .await
            .map_err(|e| QueryPilotError::inspection_failed("failed to read sqlite_master", e))?;

        let mut snapshot = SchemaSnapshot::new();
        for table_row in table_rows {
            let table: String = table_row
                .try_get("name")
                .map_err(|e| QueryPilotError::inspection_failed("missing table name", e))?;

            // PRAGMA arguments cannot be bound, so the identifier is quoted
            // by hand with embedded quotes doubled.
            let pragma = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));
            let column_rows = sqlx::query(&pragma).fetch_all(&mut conn).await.map_err(|e| {
                QueryPilotError::inspection_failed(
                    format!("failed to read columns of table {table}"),
                    e,
                )
            })?;

            for column_row in column_rows {
                let column: String = column_row
                    .try_get("name")
                    .map_err(|e| QueryPilotError::inspection_failed("missing column name", e))?;
                let data_type: String = column_row
                    .try_get("type")
                    .map_err(|e| QueryPilotError::inspection_failed("missing column type", e))?;
                snapshot.add_column(table.clone(), column, data_type);
            }
        }

        Ok(snapshot)
    }

    async fn explain(&self, sql: &str) -> Result<()> {
        let mut conn = self.connect().await?;
        let probe = format!("EXPLAIN {sql}");
        sqlx::query(&probe)
            .fetch_all(&mut conn)
            .await
            .map_err(|e| QueryPilotError::plan_rejected(e.to_string()))?;
        Ok(())
    }

    async fn run_select(&self, sql: &str) -> Result<ResultSet> {
        let mut conn = self.connect().await?;

        let rows = sqlx::query(sql)
            .fetch_all(&mut conn)
            .await
            .map_err(|e| QueryPilotError::execution_failed("statement failed", e))?;

        let columns: Vec<String> = rows.first().map_or_else(Vec::new, |row| {
            row.columns().iter().map(|c| c.name().to_string()).collect()
        });

        let mut results = ResultSet::new(columns);
        for row in &rows {
            let mut values = Vec::with_capacity(row.columns().len());
            for index in 0..row.columns().len() {
                values.push(decode_value(row, index));
            }
            results.push_row(values);
        }

        Ok(results)
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }
}

/// Decodes one column of a row into a JSON value.
///
/// SQLite typing is dynamic, so decoding goes by the value's storage class
/// rather than the column declaration. BLOBs become base64 strings so the
/// result set stays valid JSON.
fn decode_value(row: &SqliteRow, index: usize) -> serde_json::Value {
    use serde_json::Value;

    let type_name = row.columns()[index].type_info().name();
    match type_name {
        "NULL" => Value::Null,
        "INTEGER" | "BOOLEAN" => {
            opt(row.try_get::<Option<i64>, _>(index)).map_or(Value::Null, Value::from)
        }
        "REAL" => opt(row.try_get::<Option<f64>, _>(index)).map_or(Value::Null, Value::from),
        "BLOB" => opt(row.try_get::<Option<Vec<u8>>, _>(index)).map_or(Value::Null, |bytes| {
            Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }),
        _ => opt(row.try_get::<Option<String>, _>(index)).map_or(Value::Null, Value::String),
    }
}

fn opt<T>(decoded: std::result::Result<Option<T>, sqlx::Error>) -> Option<T> {
    decoded.ok().flatten()
}
