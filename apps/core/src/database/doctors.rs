use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{found, Table};
use crate::error::AppResult;
use crate::models::{Doctor, DoctorInput};

pub async fn create_doctor(pool: &SqlitePool, input: DoctorInput) -> AppResult<Doctor> {
    input.validate()?;
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().timestamp();

    let doctor = sqlx::query_as::<_, Doctor>(
        r#"
        INSERT INTO doctors (id, name, specialty, hospital, phone, email, address, notes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, name, specialty, hospital, phone, email, address, notes, created_at, updated_at
        "#,
    )
    .bind(&id)
    .bind(&input.name)
    .bind(&input.specialty)
    .bind(&input.hospital)
    .bind(&input.phone)
    .bind(&input.email)
    .bind(&input.address)
    .bind(&input.notes)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    info!(doctor_id = %doctor.id, "Doctor created");
    Ok(doctor)
}

pub async fn get_doctor(pool: &SqlitePool, id: &str) -> AppResult<Doctor> {
    let row = sqlx::query_as::<_, Doctor>(
        r#"
        SELECT id, name, specialty, hospital, phone, email, address, notes, created_at, updated_at
        FROM doctors
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    found(row, Table::Doctors, id)
}

/// All doctors, alphabetically.
pub async fn list_doctors(pool: &SqlitePool) -> AppResult<Vec<Doctor>> {
    let doctors = sqlx::query_as::<_, Doctor>(
        r#"
        SELECT id, name, specialty, hospital, phone, email, address, notes, created_at, updated_at
        FROM doctors
        ORDER BY name COLLATE NOCASE ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(doctors)
}

pub async fn update_doctor(pool: &SqlitePool, id: &str, input: DoctorInput) -> AppResult<Doctor> {
    input.validate()?;
    let now = Utc::now().timestamp();

    let row = sqlx::query_as::<_, Doctor>(
        r#"
        UPDATE doctors
        SET name = ?, specialty = ?, hospital = ?, phone = ?, email = ?, address = ?, notes = ?, updated_at = ?
        WHERE id = ?
        RETURNING id, name, specialty, hospital, phone, email, address, notes, created_at, updated_at
        "#,
    )
    .bind(&input.name)
    .bind(&input.specialty)
    .bind(&input.hospital)
    .bind(&input.phone)
    .bind(&input.email)
    .bind(&input.address)
    .bind(&input.notes)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let doctor = found(row, Table::Doctors, id)?;
    info!(doctor_id = %doctor.id, "Doctor updated");
    Ok(doctor)
}
