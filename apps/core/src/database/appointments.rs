use chrono::{NaiveDateTime, Utc};
use sqlx::sqlite::SqlitePool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{found, Table};
use crate::error::AppResult;
use crate::models::{Appointment, AppointmentInput, AppointmentStatus};

pub async fn create_appointment(
    pool: &SqlitePool,
    input: AppointmentInput,
) -> AppResult<Appointment> {
    input.validate()?;
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().timestamp();

    let appointment = sqlx::query_as::<_, Appointment>(
        r#"
        INSERT INTO appointments (id, doctor_id, title, scheduled_at, location, status, notes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, doctor_id, title, scheduled_at, location, status, notes, created_at, updated_at
        "#,
    )
    .bind(&id)
    .bind(&input.doctor_id)
    .bind(&input.title)
    .bind(input.scheduled_at)
    .bind(&input.location)
    .bind(input.status)
    .bind(&input.notes)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    info!(appointment_id = %appointment.id, "Appointment created");
    Ok(appointment)
}

pub async fn get_appointment(pool: &SqlitePool, id: &str) -> AppResult<Appointment> {
    let row = sqlx::query_as::<_, Appointment>(
        r#"
        SELECT id, doctor_id, title, scheduled_at, location, status, notes, created_at, updated_at
        FROM appointments
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    found(row, Table::Appointments, id)
}

/// Chronological order.
pub async fn list_appointments(pool: &SqlitePool) -> AppResult<Vec<Appointment>> {
    let appointments = sqlx::query_as::<_, Appointment>(
        r#"
        SELECT id, doctor_id, title, scheduled_at, location, status, notes, created_at, updated_at
        FROM appointments
        ORDER BY scheduled_at ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(appointments)
}

/// Scheduled appointments at or after `now`, soonest first.
pub async fn upcoming_appointments(
    pool: &SqlitePool,
    now: NaiveDateTime,
) -> AppResult<Vec<Appointment>> {
    let appointments = sqlx::query_as::<_, Appointment>(
        r#"
        SELECT id, doctor_id, title, scheduled_at, location, status, notes, created_at, updated_at
        FROM appointments
        WHERE status = ? AND scheduled_at >= ?
        ORDER BY scheduled_at ASC
        "#,
    )
    .bind(AppointmentStatus::Scheduled)
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(appointments)
}

pub async fn update_appointment(
    pool: &SqlitePool,
    id: &str,
    input: AppointmentInput,
) -> AppResult<Appointment> {
    input.validate()?;
    let now = Utc::now().timestamp();

    let row = sqlx::query_as::<_, Appointment>(
        r#"
        UPDATE appointments
        SET doctor_id = ?, title = ?, scheduled_at = ?, location = ?, status = ?, notes = ?, updated_at = ?
        WHERE id = ?
        RETURNING id, doctor_id, title, scheduled_at, location, status, notes, created_at, updated_at
        "#,
    )
    .bind(&input.doctor_id)
    .bind(&input.title)
    .bind(input.scheduled_at)
    .bind(&input.location)
    .bind(input.status)
    .bind(&input.notes)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let appointment = found(row, Table::Appointments, id)?;
    info!(appointment_id = %appointment.id, "Appointment updated");
    Ok(appointment)
}

pub async fn set_appointment_status(
    pool: &SqlitePool,
    id: &str,
    status: AppointmentStatus,
) -> AppResult<Appointment> {
    let now = Utc::now().timestamp();

    let row = sqlx::query_as::<_, Appointment>(
        r#"
        UPDATE appointments
        SET status = ?, updated_at = ?
        WHERE id = ?
        RETURNING id, doctor_id, title, scheduled_at, location, status, notes, created_at, updated_at
        "#,
    )
    .bind(status)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let appointment = found(row, Table::Appointments, id)?;
    info!(appointment_id = %appointment.id, status = status.label(), "Appointment status changed");
    Ok(appointment)
}
