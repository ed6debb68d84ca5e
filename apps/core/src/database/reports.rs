use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::{delete_row, found, Table};
use crate::error::AppResult;
use crate::models::{Report, ReportInput};
use crate::storage::ObjectStore;

pub async fn create_report(pool: &SqlitePool, input: ReportInput) -> AppResult<Report> {
    input.validate()?;
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().timestamp();

    let report = sqlx::query_as::<_, Report>(
        r#"
        INSERT INTO reports (id, title, report_type, report_date, doctor_id, lab_name, findings, file_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, title, report_type, report_date, doctor_id, lab_name, findings, file_url, created_at, updated_at
        "#,
    )
    .bind(&id)
    .bind(&input.title)
    .bind(&input.report_type)
    .bind(input.report_date)
    .bind(&input.doctor_id)
    .bind(&input.lab_name)
    .bind(&input.findings)
    .bind(&input.file_url)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    info!(report_id = %report.id, "Report created");
    Ok(report)
}

pub async fn get_report(pool: &SqlitePool, id: &str) -> AppResult<Report> {
    let row = sqlx::query_as::<_, Report>(
        r#"
        SELECT id, title, report_type, report_date, doctor_id, lab_name, findings, file_url, created_at, updated_at
        FROM reports
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    found(row, Table::Reports, id)
}

/// Newest report date first.
pub async fn list_reports(pool: &SqlitePool) -> AppResult<Vec<Report>> {
    let reports = sqlx::query_as::<_, Report>(
        r#"
        SELECT id, title, report_type, report_date, doctor_id, lab_name, findings, file_url, created_at, updated_at
        FROM reports
        ORDER BY report_date DESC, created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(reports)
}

pub async fn update_report(pool: &SqlitePool, id: &str, input: ReportInput) -> AppResult<Report> {
    input.validate()?;
    let now = Utc::now().timestamp();

    let row = sqlx::query_as::<_, Report>(
        r#"
        UPDATE reports
        SET title = ?, report_type = ?, report_date = ?, doctor_id = ?, lab_name = ?, findings = ?, file_url = ?, updated_at = ?
        WHERE id = ?
        RETURNING id, title, report_type, report_date, doctor_id, lab_name, findings, file_url, created_at, updated_at
        "#,
    )
    .bind(&input.title)
    .bind(&input.report_type)
    .bind(input.report_date)
    .bind(&input.doctor_id)
    .bind(&input.lab_name)
    .bind(&input.findings)
    .bind(&input.file_url)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let report = found(row, Table::Reports, id)?;
    info!(report_id = %report.id, "Report updated");
    Ok(report)
}

/// Delete a report and its uploaded file.
#[instrument(skip(pool, store))]
pub async fn delete_report(pool: &SqlitePool, store: &ObjectStore, id: &str) -> AppResult<()> {
    let report = get_report(pool, id).await?;
    delete_row(pool, Table::Reports, id).await?;

    if let Some(url) = report.file_url.as_deref() {
        if let Err(e) = store.delete(url).await {
            warn!(error = %e, "Failed to delete report file");
        }
    }
    Ok(())
}
