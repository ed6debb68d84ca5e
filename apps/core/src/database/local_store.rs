//! Key/value slots for small client-side state.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;

use crate::error::AppResult;

pub async fn get_value(pool: &SqlitePool, key: &str) -> AppResult<Option<String>> {
    let value = sqlx::query_scalar::<_, String>("SELECT value FROM local_store WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value)
}

/// Insert or overwrite a slot.
pub async fn put_value(pool: &SqlitePool, key: &str, value: &str) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO local_store (key, value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(Utc::now().timestamp())
    .execute(pool)
    .await?;
    Ok(())
}

/// Remove a slot. Removing a missing key is not an error.
pub async fn remove_value(pool: &SqlitePool, key: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM local_store WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await?;
    Ok(())
}
