use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::{found, Table};
use crate::error::AppResult;
use crate::models::{Medication, MedicationInput};

pub async fn create_medication(pool: &SqlitePool, input: MedicationInput) -> AppResult<Medication> {
    input.check()?;
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().timestamp();

    let medication = sqlx::query_as::<_, Medication>(
        r#"
        INSERT INTO medications (id, name, dosage, frequency, start_date, end_date, instructions, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, name, dosage, frequency, start_date, end_date, instructions, is_active, created_at, updated_at
        "#,
    )
    .bind(&id)
    .bind(&input.name)
    .bind(&input.dosage)
    .bind(&input.frequency)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(&input.instructions)
    .bind(input.is_active)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    info!(medication_id = %medication.id, "Medication created");
    Ok(medication)
}

pub async fn get_medication(pool: &SqlitePool, id: &str) -> AppResult<Medication> {
    let row = sqlx::query_as::<_, Medication>(
        r#"
        SELECT id, name, dosage, frequency, start_date, end_date, instructions, is_active, created_at, updated_at
        FROM medications
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    found(row, Table::Medications, id)
}

/// Active medications first, then by name.
pub async fn list_medications(pool: &SqlitePool) -> AppResult<Vec<Medication>> {
    let medications = sqlx::query_as::<_, Medication>(
        r#"
        SELECT id, name, dosage, frequency, start_date, end_date, instructions, is_active, created_at, updated_at
        FROM medications
        ORDER BY is_active DESC, name COLLATE NOCASE ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(medications)
}

pub async fn update_medication(
    pool: &SqlitePool,
    id: &str,
    input: MedicationInput,
) -> AppResult<Medication> {
    input.check()?;
    let now = Utc::now().timestamp();

    let row = sqlx::query_as::<_, Medication>(
        r#"
        UPDATE medications
        SET name = ?, dosage = ?, frequency = ?, start_date = ?, end_date = ?, instructions = ?, is_active = ?, updated_at = ?
        WHERE id = ?
        RETURNING id, name, dosage, frequency, start_date, end_date, instructions, is_active, created_at, updated_at
        "#,
    )
    .bind(&input.name)
    .bind(&input.dosage)
    .bind(&input.frequency)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(&input.instructions)
    .bind(input.is_active)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let medication = found(row, Table::Medications, id)?;
    info!(medication_id = %medication.id, "Medication updated");
    Ok(medication)
}
