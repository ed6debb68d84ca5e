use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::{delete_row, found, get_medication, Table};
use crate::error::{AppError, AppResult};
use crate::models::{
    Prescription, PrescriptionInput, PrescriptionMedication, PrescriptionMedicationInput,
};
use crate::storage::ObjectStore;

pub async fn create_prescription(
    pool: &SqlitePool,
    input: PrescriptionInput,
) -> AppResult<Prescription> {
    input.validate()?;
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().timestamp();

    let prescription = sqlx::query_as::<_, Prescription>(
        r#"
        INSERT INTO prescriptions (id, doctor_id, issued_on, diagnosis, notes, file_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, doctor_id, issued_on, diagnosis, notes, file_url, created_at, updated_at
        "#,
    )
    .bind(&id)
    .bind(&input.doctor_id)
    .bind(input.issued_on)
    .bind(&input.diagnosis)
    .bind(&input.notes)
    .bind(&input.file_url)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    info!(prescription_id = %prescription.id, "Prescription created");
    Ok(prescription)
}

pub async fn get_prescription(pool: &SqlitePool, id: &str) -> AppResult<Prescription> {
    let row = sqlx::query_as::<_, Prescription>(
        r#"
        SELECT id, doctor_id, issued_on, diagnosis, notes, file_url, created_at, updated_at
        FROM prescriptions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    found(row, Table::Prescriptions, id)
}

/// Most recently issued first.
pub async fn list_prescriptions(pool: &SqlitePool) -> AppResult<Vec<Prescription>> {
    let prescriptions = sqlx::query_as::<_, Prescription>(
        r#"
        SELECT id, doctor_id, issued_on, diagnosis, notes, file_url, created_at, updated_at
        FROM prescriptions
        ORDER BY issued_on DESC, created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(prescriptions)
}

pub async fn update_prescription(
    pool: &SqlitePool,
    id: &str,
    input: PrescriptionInput,
) -> AppResult<Prescription> {
    input.validate()?;
    let now = Utc::now().timestamp();

    let row = sqlx::query_as::<_, Prescription>(
        r#"
        UPDATE prescriptions
        SET doctor_id = ?, issued_on = ?, diagnosis = ?, notes = ?, file_url = ?, updated_at = ?
        WHERE id = ?
        RETURNING id, doctor_id, issued_on, diagnosis, notes, file_url, created_at, updated_at
        "#,
    )
    .bind(&input.doctor_id)
    .bind(input.issued_on)
    .bind(&input.diagnosis)
    .bind(&input.notes)
    .bind(&input.file_url)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let prescription = found(row, Table::Prescriptions, id)?;
    info!(prescription_id = %prescription.id, "Prescription updated");
    Ok(prescription)
}

/// Delete a prescription, its medication links and its uploaded scan.
///
/// The row is removed first; a scan that cannot be deleted afterwards is
/// only logged.
#[instrument(skip(pool, store))]
pub async fn delete_prescription(
    pool: &SqlitePool,
    store: &ObjectStore,
    id: &str,
) -> AppResult<()> {
    let prescription = get_prescription(pool, id).await?;
    delete_row(pool, Table::Prescriptions, id).await?;

    if let Some(url) = prescription.file_url.as_deref() {
        if let Err(e) = store.delete(url).await {
            warn!(error = %e, "Failed to delete prescription file");
        }
    }
    Ok(())
}

// --- Prescription medications ---

/// Link a medication to a prescription. Each pair may be linked once.
pub async fn attach_medication(
    pool: &SqlitePool,
    prescription_id: &str,
    input: PrescriptionMedicationInput,
) -> AppResult<PrescriptionMedication> {
    input.validate()?;
    get_prescription(pool, prescription_id).await?;
    get_medication(pool, &input.medication_id).await?;

    let id = Uuid::new_v4().to_string();
    let now = Utc::now().timestamp();

    let result = sqlx::query_as::<_, PrescriptionMedication>(
        r#"
        INSERT INTO prescription_medications (id, prescription_id, medication_id, dosage, frequency, duration, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, prescription_id, medication_id, dosage, frequency, duration, created_at, updated_at
        "#,
    )
    .bind(&id)
    .bind(prescription_id)
    .bind(&input.medication_id)
    .bind(&input.dosage)
    .bind(&input.frequency)
    .bind(&input.duration)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await;

    match result {
        Ok(link) => {
            info!(prescription_id, medication_id = %link.medication_id, "Medication attached");
            Ok(link)
        }
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(AppError::Validation(
            format!(
                "medication {} is already on prescription {}",
                input.medication_id, prescription_id
            ),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Medication links of one prescription, oldest first.
pub async fn prescription_medications(
    pool: &SqlitePool,
    prescription_id: &str,
) -> AppResult<Vec<PrescriptionMedication>> {
    let links = sqlx::query_as::<_, PrescriptionMedication>(
        r#"
        SELECT id, prescription_id, medication_id, dosage, frequency, duration, created_at, updated_at
        FROM prescription_medications
        WHERE prescription_id = ?
        ORDER BY created_at ASC, rowid ASC
        "#,
    )
    .bind(prescription_id)
    .fetch_all(pool)
    .await?;

    Ok(links)
}

pub async fn detach_medication(
    pool: &SqlitePool,
    prescription_id: &str,
    medication_id: &str,
) -> AppResult<()> {
    let result = sqlx::query(
        "DELETE FROM prescription_medications WHERE prescription_id = ? AND medication_id = ?",
    )
    .bind(prescription_id)
    .bind(medication_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(
            Table::PrescriptionMedications.entity(),
            format!("{prescription_id}/{medication_id}"),
        ));
    }
    info!(prescription_id, medication_id, "Medication detached");
    Ok(())
}
