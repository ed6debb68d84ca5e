//! SQLite persistence for health records and local key/value slots.
//!
//! One submodule per table. Every query goes through `sqlx::query_as` with
//! runtime-checked SQL; the schema lives in `apps/core/migrations`.

pub mod appointments;
pub mod doctors;
pub mod health_metrics;
pub mod local_store;
pub mod medications;
pub mod prescriptions;
pub mod reports;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{info, instrument};

use crate::error::{AppError, AppResult};

pub use appointments::*;
pub use doctors::*;
pub use health_metrics::*;
pub use medications::*;
pub use prescriptions::*;
pub use reports::*;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open (or create) the database file and apply pending migrations.
#[instrument(skip_all, fields(path = %db_path.display()))]
pub async fn init_db(db_path: &Path) -> AppResult<SqlitePool> {
    info!("Initializing database");

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    info!("Database initialized and migrations applied");
    Ok(pool)
}

/// Private in-memory database, used by tests and dry runs.
///
/// A single connection that never expires, so the schema outlives the
/// first query.
pub async fn init_memory_db() -> AppResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> AppResult<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| AppError::Database(sqlx::Error::from(e)))
}

/// Record tables that support deletion by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Doctors,
    Medications,
    Prescriptions,
    PrescriptionMedications,
    Reports,
    Appointments,
    HealthMetrics,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Doctors => "doctors",
            Table::Medications => "medications",
            Table::Prescriptions => "prescriptions",
            Table::PrescriptionMedications => "prescription_medications",
            Table::Reports => "reports",
            Table::Appointments => "appointments",
            Table::HealthMetrics => "health_metrics",
        }
    }

    /// Rows of these tables may own an uploaded file in object storage.
    pub fn has_files(&self) -> bool {
        matches!(self, Table::Prescriptions | Table::Reports)
    }

    /// Singular name used in `NotFound` errors.
    pub fn entity(&self) -> &'static str {
        match self {
            Table::Doctors => "doctor",
            Table::Medications => "medication",
            Table::Prescriptions => "prescription",
            Table::PrescriptionMedications => "prescription medication",
            Table::Reports => "report",
            Table::Appointments => "appointment",
            Table::HealthMetrics => "health metric",
        }
    }
}

/// Delete one row by id. Dependent join rows go with it (`ON DELETE CASCADE`).
///
/// Prescriptions and reports are refused: their files live in object
/// storage, so use [`delete_prescription`] or [`delete_report`].
#[instrument(skip(pool))]
pub async fn delete_record(pool: &SqlitePool, table: Table, id: &str) -> AppResult<()> {
    if table.has_files() {
        return Err(AppError::Validation(format!(
            "{} rows own stored files and must be deleted with their file",
            table.as_str()
        )));
    }
    delete_row(pool, table, id).await
}

pub(crate) async fn delete_row(pool: &SqlitePool, table: Table, id: &str) -> AppResult<()> {
    // Table names come from the closed `Table` enum, never from input.
    let sql = format!("DELETE FROM {} WHERE id = ?", table.as_str());
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(table.entity(), id));
    }
    info!("Record deleted");
    Ok(())
}

/// Map an empty `fetch_optional` result to `NotFound`.
pub(crate) fn found<T>(row: Option<T>, table: Table, id: &str) -> AppResult<T> {
    row.ok_or_else(|| AppError::not_found(table.entity(), id))
}
