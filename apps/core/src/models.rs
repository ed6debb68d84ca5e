use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;

// --- Chat ---

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// A single entry of the assistant conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Strictly increasing within a history.
    pub id: i64,
    pub text: String,
    pub sender: Sender,
    /// Set on the canned reply to an off-topic question.
    #[serde(default)]
    pub is_off_topic_warning: bool,
}

// --- Enumerations stored as TEXT ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum MetricType {
    BloodPressure,
    HeartRate,
    Weight,
    BloodSugar,
    Temperature,
    OxygenSaturation,
    Cholesterol,
}

impl MetricType {
    pub const ALL: [MetricType; 7] = [
        MetricType::BloodPressure,
        MetricType::HeartRate,
        MetricType::Weight,
        MetricType::BloodSugar,
        MetricType::Temperature,
        MetricType::OxygenSaturation,
        MetricType::Cholesterol,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricType::BloodPressure => "Blood pressure",
            MetricType::HeartRate => "Heart rate",
            MetricType::Weight => "Weight",
            MetricType::BloodSugar => "Blood sugar",
            MetricType::Temperature => "Temperature",
            MetricType::OxygenSaturation => "Oxygen saturation",
            MetricType::Cholesterol => "Cholesterol",
        }
    }

    pub fn default_unit(&self) -> &'static str {
        match self {
            MetricType::BloodPressure => "mmHg",
            MetricType::HeartRate => "bpm",
            MetricType::Weight => "kg",
            MetricType::BloodSugar => "mg/dL",
            MetricType::Temperature => "°C",
            MetricType::OxygenSaturation => "%",
            MetricType::Cholesterol => "mg/dL",
        }
    }

    /// Only blood pressure carries a second (diastolic) value.
    pub fn has_secondary_value(&self) -> bool {
        matches!(self, MetricType::BloodPressure)
    }
}

// --- Doctors ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub hospital: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DoctorInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub specialty: String,
    pub hospital: Option<String>,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

// --- Medications ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MedicationInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub dosage: String,
    #[validate(length(min = 1, max = 100))]
    pub frequency: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl MedicationInput {
    /// Field validation plus the start/end ordering rule.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(AppError::Validation(
                    "end_date must not be before start_date".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

// --- Prescriptions ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Prescription {
    pub id: String,
    pub doctor_id: Option<String>,
    pub issued_on: NaiveDate,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    /// Public URL of the scanned prescription in the `prescriptions` bucket.
    pub file_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PrescriptionInput {
    pub doctor_id: Option<String>,
    pub issued_on: NaiveDate,
    #[validate(length(max = 500))]
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    #[validate(url)]
    pub file_url: Option<String>,
}

/// Join row between a prescription and a medication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PrescriptionMedication {
    pub id: String,
    pub prescription_id: String,
    pub medication_id: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PrescriptionMedicationInput {
    #[validate(length(min = 1))]
    pub medication_id: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
}

// --- Reports ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub id: String,
    pub title: String,
    pub report_type: String,
    pub report_date: NaiveDate,
    pub doctor_id: Option<String>,
    pub lab_name: Option<String>,
    pub findings: Option<String>,
    /// Public URL of the uploaded file in the `reports` bucket.
    pub file_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReportInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 100))]
    pub report_type: String,
    pub report_date: NaiveDate,
    pub doctor_id: Option<String>,
    pub lab_name: Option<String>,
    pub findings: Option<String>,
    #[validate(url)]
    pub file_url: Option<String>,
}

// --- Appointments ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: String,
    pub doctor_id: Option<String>,
    pub title: String,
    pub scheduled_at: NaiveDateTime,
    pub location: Option<String>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppointmentInput {
    pub doctor_id: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub scheduled_at: NaiveDateTime,
    pub location: Option<String>,
    #[serde(default = "default_status")]
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

fn default_status() -> AppointmentStatus {
    AppointmentStatus::Scheduled
}

// --- Health metrics ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct HealthMetric {
    pub id: String,
    pub metric_type: MetricType,
    pub value: f64,
    /// Diastolic value for blood pressure readings.
    pub secondary_value: Option<f64>,
    pub unit: String,
    pub recorded_at: NaiveDateTime,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HealthMetricInput {
    pub metric_type: MetricType,
    #[validate(range(min = 0.0, max = 10000.0))]
    pub value: f64,
    #[validate(range(min = 0.0, max = 10000.0))]
    pub secondary_value: Option<f64>,
    /// Defaults to the metric's usual unit when absent.
    #[validate(length(min = 1, max = 20))]
    pub unit: Option<String>,
    pub recorded_at: NaiveDateTime,
    pub notes: Option<String>,
}

impl HealthMetricInput {
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        if self.secondary_value.is_some() && !self.metric_type.has_secondary_value() {
            return Err(AppError::Validation(format!(
                "{} readings take a single value",
                self.metric_type.label()
            )));
        }
        Ok(())
    }

    pub fn resolved_unit(&self) -> String {
        self.unit
            .clone()
            .unwrap_or_else(|| self.metric_type.default_unit().to_string())
    }
}

/// One point of a metric time series, as consumed by charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MetricPoint {
    pub recorded_at: NaiveDateTime,
    pub value: f64,
    pub secondary_value: Option<f64>,
}
