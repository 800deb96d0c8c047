//! Short-lived MySQL connections and dynamic row decoding.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::ValueEnum;
use serde_json::{Map, Value};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, ConnectOptions, Row, TypeInfo};
use tracing::debug;

use crate::config::DatabaseSettings;
use crate::error::{Error, Result};

/// Connect timeout for a single invocation.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Which of the two configured schemas a statement targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DbTarget {
    /// The Semaphore server's own schema
    Semaphore,
    /// The ansible_logging schema
    Logging,
}

impl DbTarget {
    /// Resolves the configured database name for this target.
    pub fn database<'a>(&self, settings: &'a DatabaseSettings) -> &'a str {
        match self {
            DbTarget::Semaphore => &settings.semaphore_db,
            DbTarget::Logging => &settings.logging_db,
        }
    }
}

/// A bind parameter for a parameterized statement.
///
/// Values are never interpolated into SQL text; only structural choices
/// (an optional WHERE clause) are templated.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// Integer parameter
    Int(i64),
    /// String parameter
    Str(String),
}

/// Classifies a statement as read-only.
///
/// Case-insensitive and tolerant of leading whitespace; everything that does
/// not start with SELECT/SHOW/DESCRIBE/EXPLAIN counts as a write.
pub fn is_read_statement(sql: &str) -> bool {
    let upper = sql.trim_start().to_uppercase();
    ["SELECT", "SHOW", "DESCRIBE", "EXPLAIN"]
        .iter()
        .any(|kw| upper.starts_with(kw))
}

/// Opens a connection to the given schema.
pub async fn connect(settings: &DatabaseSettings, target: DbTarget) -> Result<MySqlConnection> {
    let database = target.database(settings);
    let options = MySqlConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .password(&settings.password)
        .database(database);

    debug!(host = %settings.host, port = settings.port, database, "connecting");
    let endpoint = format!("{database}@{}:{}", settings.host, settings.port);
    match tokio::time::timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS), options.connect()).await
    {
        Ok(Ok(conn)) => Ok(conn),
        Ok(Err(err)) => Err(Error::connection_failed(endpoint, err.to_string())),
        Err(_) => Err(Error::Timeout {
            seconds: CONNECT_TIMEOUT_SECS,
        }),
    }
}

/// Runs a read statement and returns its rows as JSON objects.
pub async fn fetch(
    conn: &mut MySqlConnection,
    sql: &str,
    params: &[SqlParam],
) -> Result<Vec<Value>> {
    let mut query = sqlx::query(sql);
    for param in params {
        query = match param {
            SqlParam::Int(i) => query.bind(*i),
            SqlParam::Str(s) => query.bind(s.clone()),
        };
    }
    let rows = query.fetch_all(&mut *conn).await.map_err(map_sqlx_error)?;
    Ok(rows.iter().map(row_to_value).collect())
}

/// Runs a write statement and returns the affected-row count.
pub async fn execute(conn: &mut MySqlConnection, sql: &str, params: &[SqlParam]) -> Result<u64> {
    let mut query = sqlx::query(sql);
    for param in params {
        query = match param {
            SqlParam::Int(i) => query.bind(*i),
            SqlParam::Str(s) => query.bind(s.clone()),
        };
    }
    let result = query.execute(&mut *conn).await.map_err(map_sqlx_error)?;
    Ok(result.rows_affected())
}

/// Server-rejected statements are query errors; everything else is a
/// connection-level database error.
fn map_sqlx_error(err: sqlx::Error) -> Error {
    match err {
        sqlx::Error::Database(db_err) => Error::Query {
            detail: Some(db_err.to_string()),
        },
        other => Error::Database {
            detail: Some(other.to_string()),
        },
    }
}

/// Decodes a row into a JSON object, keyed by column name in column order.
fn row_to_value(row: &MySqlRow) -> Value {
    let mut map = Map::new();
    for column in row.columns() {
        let name = column.name();
        let value = match column.type_info().name() {
            "INT" | "BIGINT" | "SMALLINT" | "TINYINT" | "MEDIUMINT" => row
                .try_get::<i64, _>(name)
                .map(Value::from)
                .unwrap_or(Value::Null),
            "INT UNSIGNED" | "BIGINT UNSIGNED" | "SMALLINT UNSIGNED" | "TINYINT UNSIGNED"
            | "MEDIUMINT UNSIGNED" => row
                .try_get::<u64, _>(name)
                .map(Value::from)
                .unwrap_or(Value::Null),
            "FLOAT" | "DOUBLE" => row
                .try_get::<f64, _>(name)
                .map(Value::from)
                .unwrap_or(Value::Null),
            "DECIMAL" => row
                .try_get::<f64, _>(name)
                .map(Value::from)
                .or_else(|_| row.try_get::<String, _>(name).map(Value::from))
                .unwrap_or(Value::Null),
            "BOOLEAN" | "BOOL" => row
                .try_get::<bool, _>(name)
                .map(Value::from)
                .unwrap_or(Value::Null),
            "DATETIME" | "TIMESTAMP" => row
                .try_get::<NaiveDateTime, _>(name)
                .map(|v| Value::from(v.format("%Y-%m-%d %H:%M:%S").to_string()))
                .unwrap_or(Value::Null),
            "DATE" => row
                .try_get::<NaiveDate, _>(name)
                .map(|v| Value::from(v.to_string()))
                .unwrap_or(Value::Null),
            "TIME" => row
                .try_get::<NaiveTime, _>(name)
                .map(|v| Value::from(v.to_string()))
                .unwrap_or(Value::Null),
            "JSON" => row
                .try_get::<Value, _>(name)
                .unwrap_or(Value::Null),
            _ => row
                .try_get::<String, _>(name)
                .map(Value::from)
                .unwrap_or(Value::Null),
        };
        map.insert(name.to_string(), value);
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_is_read_regardless_of_case_and_whitespace() {
        assert!(is_read_statement("SELECT 1"));
        assert!(is_read_statement("select * from backups"));
        assert!(is_read_statement("  \n\tSeLeCt 1"));
        assert!(is_read_statement("SHOW TABLES"));
        assert!(is_read_statement("describe backups"));
        assert!(is_read_statement("EXPLAIN SELECT 1"));
    }

    #[test]
    fn mutating_statements_are_writes() {
        assert!(!is_read_statement("INSERT INTO t VALUES (1)"));
        assert!(!is_read_statement("  update t set a = 1"));
        assert!(!is_read_statement("DELETE FROM t"));
        assert!(!is_read_statement("TRUNCATE t"));
        assert!(!is_read_statement(""));
    }

    #[test]
    fn target_resolves_configured_names() {
        let settings = DatabaseSettings {
            host: "h".to_string(),
            port: 3306,
            user: "u".to_string(),
            password: "p".to_string(),
            semaphore_db: "sem".to_string(),
            logging_db: "log".to_string(),
        };
        assert_eq!(DbTarget::Semaphore.database(&settings), "sem");
        assert_eq!(DbTarget::Logging.database(&settings), "log");
    }
}
