//! Append-only audit trail of function invocations.

use chrono::{DateTime, Utc};
use nasol_core::FunctionLog;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FunctionLogRow {
    pub id: i64,
    pub function_name: String,
    pub status: String,
    pub execution_time: i64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Appends one log row and returns its generated `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_function_log(pool: &PgPool, log: &FunctionLog) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO function_logs (function_name, status, execution_time, error_message) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id",
    )
    .bind(&log.function_name)
    .bind(log.status.as_str())
    .bind(log.execution_time)
    .bind(&log.error_message)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Lists the most recent log rows, optionally narrowed to one function.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_function_logs(
    pool: &PgPool,
    function_name: Option<&str>,
    limit: i64,
) -> Result<Vec<FunctionLogRow>, DbError> {
    let rows = sqlx::query_as::<_, FunctionLogRow>(
        "SELECT id, function_name, status, execution_time, error_message, created_at \
         FROM function_logs \
         WHERE ($1::TEXT IS NULL OR function_name = $1) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(function_name)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
