//! Database Module Tests
//!
//! CRUD round trips for every record table, prescription links,
//! appointment queries and metric series.

use super::storage_tests::create_test_store;
use crate::database::{self, Table};
use crate::error::AppError;
use crate::models::{
    AppointmentInput, AppointmentStatus, DoctorInput, HealthMetricInput, MedicationInput,
    MetricType, PrescriptionInput, PrescriptionMedicationInput, ReportInput,
};
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::sqlite::SqlitePool;
use tempfile::{tempdir, TempDir};

/// Create a test database in a temporary directory.
///
/// The directory is returned so it outlives the pool.
pub(crate) async fn create_test_pool() -> (SqlitePool, TempDir) {
    let dir = tempdir().expect("Failed to create temp dir");
    let pool = database::init_db(&dir.path().join("test.sqlite"))
        .await
        .expect("Failed to create test pool");
    (pool, dir)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
}

pub(crate) fn doctor_input(name: &str) -> DoctorInput {
    DoctorInput {
        name: name.to_string(),
        specialty: "Cardiology".to_string(),
        hospital: Some("City Hospital".to_string()),
        email: Some("doctor@example.com".to_string()),
        ..Default::default()
    }
}

pub(crate) fn medication_input(name: &str) -> MedicationInput {
    MedicationInput {
        name: name.to_string(),
        dosage: "10 mg".to_string(),
        frequency: "once daily".to_string(),
        start_date: Some(date(2024, 1, 1)),
        end_date: None,
        instructions: Some("with food".to_string()),
        is_active: true,
    }
}

fn prescription_input(doctor_id: Option<String>) -> PrescriptionInput {
    PrescriptionInput {
        doctor_id,
        issued_on: date(2024, 2, 10),
        diagnosis: Some("Hypertension".to_string()),
        notes: None,
        file_url: None,
    }
}

fn appointment_input(title: &str, scheduled_at: NaiveDateTime) -> AppointmentInput {
    AppointmentInput {
        doctor_id: None,
        title: title.to_string(),
        scheduled_at,
        location: Some("Room 4".to_string()),
        status: AppointmentStatus::Scheduled,
        notes: None,
    }
}

fn metric_input(metric_type: MetricType, value: f64, recorded_at: NaiveDateTime) -> HealthMetricInput {
    HealthMetricInput {
        metric_type,
        value,
        secondary_value: None,
        unit: None,
        recorded_at,
        notes: None,
    }
}

#[cfg(test)]
mod doctor_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get_doctor() {
        let (pool, _dir) = create_test_pool().await;

        let created = database::create_doctor(&pool, doctor_input("Dr. Ada"))
            .await
            .expect("Failed to create doctor");
        assert!(!created.id.is_empty());
        assert_eq!(created.created_at, created.updated_at);

        let fetched = database::get_doctor(&pool, &created.id)
            .await
            .expect("Failed to get doctor");
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_list_doctors_alphabetically() {
        let (pool, _dir) = create_test_pool().await;
        for name in ["zoe", "Adam", "mona"] {
            database::create_doctor(&pool, doctor_input(name)).await.unwrap();
        }

        let names: Vec<_> = database::list_doctors(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Adam", "mona", "zoe"]);
    }

    #[tokio::test]
    async fn test_update_doctor() {
        let (pool, _dir) = create_test_pool().await;
        let created = database::create_doctor(&pool, doctor_input("Dr. Ada")).await.unwrap();

        let mut input = doctor_input("Dr. Ada Byron");
        input.hospital = None;
        let updated = database::update_doctor(&pool, &created.id, input).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Dr. Ada Byron");
        assert_eq!(updated.hospital, None);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_invalid_doctor_is_rejected() {
        let (pool, _dir) = create_test_pool().await;
        let mut input = doctor_input("Dr. Ada");
        input.email = Some("nope".to_string());

        let result = database::create_doctor(&pool, input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(database::list_doctors(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_doctor_is_not_found() {
        let (pool, _dir) = create_test_pool().await;

        let result = database::get_doctor(&pool, "missing").await;
        assert!(matches!(result, Err(AppError::NotFound { entity: "doctor", .. })));

        let result = database::update_doctor(&pool, "missing", doctor_input("x")).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_doctor_detaches_prescriptions() {
        let (pool, _dir) = create_test_pool().await;
        let doctor = database::create_doctor(&pool, doctor_input("Dr. Ada")).await.unwrap();
        let prescription =
            database::create_prescription(&pool, prescription_input(Some(doctor.id.clone())))
                .await
                .unwrap();

        database::delete_record(&pool, Table::Doctors, &doctor.id).await.unwrap();

        let prescription = database::get_prescription(&pool, &prescription.id).await.unwrap();
        assert_eq!(prescription.doctor_id, None);
    }
}

#[cfg(test)]
mod medication_tests {
    use super::*;

    #[tokio::test]
    async fn test_medication_round_trip() {
        let (pool, _dir) = create_test_pool().await;

        let created = database::create_medication(&pool, medication_input("Lisinopril"))
            .await
            .unwrap();
        assert_eq!(created.start_date, Some(date(2024, 1, 1)));
        assert!(created.is_active);

        let fetched = database::get_medication(&pool, &created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_active_medications_listed_first() {
        let (pool, _dir) = create_test_pool().await;
        let mut stopped = medication_input("Aspirin");
        stopped.is_active = false;
        database::create_medication(&pool, stopped).await.unwrap();
        database::create_medication(&pool, medication_input("Zinc")).await.unwrap();

        let names: Vec<_> = database::list_medications(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Zinc", "Aspirin"]);
    }

    #[tokio::test]
    async fn test_medication_end_before_start_is_rejected() {
        let (pool, _dir) = create_test_pool().await;
        let mut input = medication_input("Lisinopril");
        input.end_date = Some(date(2023, 12, 1));

        let result = database::create_medication(&pool, input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}

#[cfg(test)]
mod prescription_tests {
    use super::*;

    #[tokio::test]
    async fn test_attach_and_list_medications() {
        let (pool, _dir) = create_test_pool().await;
        let prescription = database::create_prescription(&pool, prescription_input(None))
            .await
            .unwrap();
        let first = database::create_medication(&pool, medication_input("A")).await.unwrap();
        let second = database::create_medication(&pool, medication_input("B")).await.unwrap();

        for medication in [&first, &second] {
            database::attach_medication(
                &pool,
                &prescription.id,
                PrescriptionMedicationInput {
                    medication_id: medication.id.clone(),
                    dosage: Some("1 tablet".to_string()),
                    frequency: None,
                    duration: Some("30 days".to_string()),
                },
            )
            .await
            .unwrap();
        }

        let links = database::prescription_medications(&pool, &prescription.id)
            .await
            .unwrap();
        let ids: Vec<_> = links.iter().map(|l| l.medication_id.as_str()).collect();
        assert_eq!(ids, vec![first.id.as_str(), second.id.as_str()]);
    }

    #[tokio::test]
    async fn test_attach_twice_is_rejected() {
        let (pool, _dir) = create_test_pool().await;
        let prescription = database::create_prescription(&pool, prescription_input(None))
            .await
            .unwrap();
        let medication = database::create_medication(&pool, medication_input("A")).await.unwrap();
        let input = PrescriptionMedicationInput {
            medication_id: medication.id.clone(),
            dosage: None,
            frequency: None,
            duration: None,
        };

        database::attach_medication(&pool, &prescription.id, input.clone())
            .await
            .unwrap();
        let result = database::attach_medication(&pool, &prescription.id, input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_attach_unknown_medication_is_not_found() {
        let (pool, _dir) = create_test_pool().await;
        let prescription = database::create_prescription(&pool, prescription_input(None))
            .await
            .unwrap();

        let result = database::attach_medication(
            &pool,
            &prescription.id,
            PrescriptionMedicationInput {
                medication_id: "missing".to_string(),
                dosage: None,
                frequency: None,
                duration: None,
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound { entity: "medication", .. })));
    }

    #[tokio::test]
    async fn test_detach_medication() {
        let (pool, _dir) = create_test_pool().await;
        let prescription = database::create_prescription(&pool, prescription_input(None))
            .await
            .unwrap();
        let medication = database::create_medication(&pool, medication_input("A")).await.unwrap();
        database::attach_medication(
            &pool,
            &prescription.id,
            PrescriptionMedicationInput {
                medication_id: medication.id.clone(),
                dosage: None,
                frequency: None,
                duration: None,
            },
        )
        .await
        .unwrap();

        database::detach_medication(&pool, &prescription.id, &medication.id)
            .await
            .unwrap();
        assert!(database::prescription_medications(&pool, &prescription.id)
            .await
            .unwrap()
            .is_empty());

        let again = database::detach_medication(&pool, &prescription.id, &medication.id).await;
        assert!(matches!(again, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_deleting_prescription_removes_links() {
        let (pool, _dir) = create_test_pool().await;
        let prescription = database::create_prescription(&pool, prescription_input(None))
            .await
            .unwrap();
        let medication = database::create_medication(&pool, medication_input("A")).await.unwrap();
        database::attach_medication(
            &pool,
            &prescription.id,
            PrescriptionMedicationInput {
                medication_id: medication.id.clone(),
                dosage: None,
                frequency: None,
                duration: None,
            },
        )
        .await
        .unwrap();

        let (store, _storage_dir) = create_test_store();
        database::delete_prescription(&pool, &store, &prescription.id)
            .await
            .unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM prescription_medications")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
        // The medication itself survives.
        assert!(database::get_medication(&pool, &medication.id).await.is_ok());
    }
}

#[cfg(test)]
mod report_tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_newest_first() {
        let (pool, _dir) = create_test_pool().await;
        for (title, day) in [("Old", 1), ("New", 20), ("Mid", 10)] {
            database::create_report(
                &pool,
                ReportInput {
                    title: title.to_string(),
                    report_type: "Blood test".to_string(),
                    report_date: date(2024, 3, day),
                    doctor_id: None,
                    lab_name: None,
                    findings: None,
                    file_url: None,
                },
            )
            .await
            .unwrap();
        }

        let titles: Vec<_> = database::list_reports(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["New", "Mid", "Old"]);
    }
}

#[cfg(test)]
mod appointment_tests {
    use super::*;

    #[tokio::test]
    async fn test_upcoming_appointments() {
        let (pool, _dir) = create_test_pool().await;
        database::create_appointment(&pool, appointment_input("Past", at(2024, 1, 1, 9)))
            .await
            .unwrap();
        let later = database::create_appointment(&pool, appointment_input("Later", at(2024, 9, 1, 9)))
            .await
            .unwrap();
        let soon = database::create_appointment(&pool, appointment_input("Soon", at(2024, 6, 2, 9)))
            .await
            .unwrap();
        let cancelled =
            database::create_appointment(&pool, appointment_input("Cancelled", at(2024, 7, 1, 9)))
                .await
                .unwrap();
        database::set_appointment_status(&pool, &cancelled.id, AppointmentStatus::Cancelled)
            .await
            .unwrap();

        let upcoming = database::upcoming_appointments(&pool, at(2024, 6, 1, 0))
            .await
            .unwrap();
        let ids: Vec<_> = upcoming.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec![soon.id.as_str(), later.id.as_str()]);

        assert_eq!(database::list_appointments(&pool).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_set_status() {
        let (pool, _dir) = create_test_pool().await;
        let appointment =
            database::create_appointment(&pool, appointment_input("Checkup", at(2024, 5, 5, 10)))
                .await
                .unwrap();

        let done = database::set_appointment_status(&pool, &appointment.id, AppointmentStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.status, AppointmentStatus::Completed);

        let missing =
            database::set_appointment_status(&pool, "missing", AppointmentStatus::Completed).await;
        assert!(matches!(missing, Err(AppError::NotFound { .. })));
    }
}

#[cfg(test)]
mod metric_tests {
    use super::*;
    use crate::database::summarize;

    #[tokio::test]
    async fn test_metric_defaults_unit() {
        let (pool, _dir) = create_test_pool().await;
        let metric = database::create_health_metric(
            &pool,
            metric_input(MetricType::HeartRate, 64.0, at(2024, 4, 1, 8)),
        )
        .await
        .unwrap();
        assert_eq!(metric.unit, "bpm");
        assert_eq!(metric.metric_type, MetricType::HeartRate);
    }

    #[tokio::test]
    async fn test_metric_series_and_summary() {
        let (pool, _dir) = create_test_pool().await;
        for (day, value) in [(3, 72.0), (1, 68.0), (2, 70.0)] {
            database::create_health_metric(
                &pool,
                metric_input(MetricType::HeartRate, value, at(2024, 4, day, 8)),
            )
            .await
            .unwrap();
        }
        database::create_health_metric(&pool, metric_input(MetricType::Weight, 80.0, at(2024, 4, 2, 8)))
            .await
            .unwrap();

        let series = database::metric_series(&pool, MetricType::HeartRate, None)
            .await
            .unwrap();
        let values: Vec<_> = series.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![68.0, 70.0, 72.0]);

        let recent = database::metric_series(&pool, MetricType::HeartRate, Some(at(2024, 4, 2, 0)))
            .await
            .unwrap();
        assert_eq!(recent.len(), 2);

        let summary = summarize(&series).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.latest.value, 72.0);
        assert_eq!(summary.min, 68.0);
        assert_eq!(summary.max, 72.0);
    }

    #[tokio::test]
    async fn test_metric_overview_skips_empty_types() {
        let (pool, _dir) = create_test_pool().await;
        for (metric_type, value) in [
            (MetricType::Weight, 81.0),
            (MetricType::HeartRate, 66.0),
            (MetricType::Weight, 79.0),
        ] {
            database::create_health_metric(&pool, metric_input(metric_type, value, at(2024, 4, 1, 8)))
                .await
                .unwrap();
        }

        let overview = database::metric_overview(&pool).await.unwrap();

        let types: Vec<_> = overview.iter().map(|(t, _)| *t).collect();
        assert_eq!(types, vec![MetricType::HeartRate, MetricType::Weight]);
        assert_eq!(overview[1].1.count, 2);
        assert_eq!(overview[1].1.average, 80.0);
    }

    #[tokio::test]
    async fn test_list_metrics_by_type() {
        let (pool, _dir) = create_test_pool().await;
        database::create_health_metric(&pool, metric_input(MetricType::Weight, 80.0, at(2024, 4, 2, 8)))
            .await
            .unwrap();
        let mut bp = metric_input(MetricType::BloodPressure, 120.0, at(2024, 4, 3, 8));
        bp.secondary_value = Some(80.0);
        database::create_health_metric(&pool, bp).await.unwrap();

        assert_eq!(database::list_health_metrics(&pool, None).await.unwrap().len(), 2);
        let pressures = database::list_health_metrics(&pool, Some(MetricType::BloodPressure))
            .await
            .unwrap();
        assert_eq!(pressures.len(), 1);
        assert_eq!(pressures[0].secondary_value, Some(80.0));
    }

    #[tokio::test]
    async fn test_delete_record_refuses_tables_with_files() {
        let (pool, _dir) = create_test_pool().await;
        let prescription = database::create_prescription(&pool, prescription_input(None))
            .await
            .unwrap();

        for table in [Table::Prescriptions, Table::Reports] {
            let result = database::delete_record(&pool, table, &prescription.id).await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
        assert!(database::get_prescription(&pool, &prescription.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_record_twice() {
        let (pool, _dir) = create_test_pool().await;
        let metric = database::create_health_metric(
            &pool,
            metric_input(MetricType::Temperature, 36.8, at(2024, 4, 1, 8)),
        )
        .await
        .unwrap();

        database::delete_record(&pool, Table::HealthMetrics, &metric.id).await.unwrap();
        let again = database::delete_record(&pool, Table::HealthMetrics, &metric.id).await;
        assert!(matches!(again, Err(AppError::NotFound { entity: "health metric", .. })));
    }
}
