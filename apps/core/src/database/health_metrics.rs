use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::{found, Table};
use crate::error::AppResult;
use crate::models::{HealthMetric, HealthMetricInput, MetricPoint, MetricType};

pub async fn create_health_metric(
    pool: &SqlitePool,
    input: HealthMetricInput,
) -> AppResult<HealthMetric> {
    input.check()?;
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().timestamp();

    let metric = sqlx::query_as::<_, HealthMetric>(
        r#"
        INSERT INTO health_metrics (id, metric_type, value, secondary_value, unit, recorded_at, notes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, metric_type, value, secondary_value, unit, recorded_at, notes, created_at, updated_at
        "#,
    )
    .bind(&id)
    .bind(input.metric_type)
    .bind(input.value)
    .bind(input.secondary_value)
    .bind(input.resolved_unit())
    .bind(input.recorded_at)
    .bind(&input.notes)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    info!(metric_id = %metric.id, metric_type = metric.metric_type.label(), "Health metric recorded");
    Ok(metric)
}

pub async fn get_health_metric(pool: &SqlitePool, id: &str) -> AppResult<HealthMetric> {
    let row = sqlx::query_as::<_, HealthMetric>(
        r#"
        SELECT id, metric_type, value, secondary_value, unit, recorded_at, notes, created_at, updated_at
        FROM health_metrics
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    found(row, Table::HealthMetrics, id)
}

/// Latest readings first, optionally restricted to one metric type.
pub async fn list_health_metrics(
    pool: &SqlitePool,
    metric_type: Option<MetricType>,
) -> AppResult<Vec<HealthMetric>> {
    let metrics = sqlx::query_as::<_, HealthMetric>(
        r#"
        SELECT id, metric_type, value, secondary_value, unit, recorded_at, notes, created_at, updated_at
        FROM health_metrics
        WHERE ?1 IS NULL OR metric_type = ?1
        ORDER BY recorded_at DESC
        "#,
    )
    .bind(metric_type)
    .fetch_all(pool)
    .await?;

    Ok(metrics)
}

pub async fn update_health_metric(
    pool: &SqlitePool,
    id: &str,
    input: HealthMetricInput,
) -> AppResult<HealthMetric> {
    input.check()?;
    let now = Utc::now().timestamp();

    let row = sqlx::query_as::<_, HealthMetric>(
        r#"
        UPDATE health_metrics
        SET metric_type = ?, value = ?, secondary_value = ?, unit = ?, recorded_at = ?, notes = ?, updated_at = ?
        WHERE id = ?
        RETURNING id, metric_type, value, secondary_value, unit, recorded_at, notes, created_at, updated_at
        "#,
    )
    .bind(input.metric_type)
    .bind(input.value)
    .bind(input.secondary_value)
    .bind(input.resolved_unit())
    .bind(input.recorded_at)
    .bind(&input.notes)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let metric = found(row, Table::HealthMetrics, id)?;
    info!(metric_id = %metric.id, "Health metric updated");
    Ok(metric)
}

/// Chart series for one metric type, oldest reading first.
pub async fn metric_series(
    pool: &SqlitePool,
    metric_type: MetricType,
    since: Option<NaiveDateTime>,
) -> AppResult<Vec<MetricPoint>> {
    let points = sqlx::query_as::<_, MetricPoint>(
        r#"
        SELECT recorded_at, value, secondary_value
        FROM health_metrics
        WHERE metric_type = ?1 AND (?2 IS NULL OR recorded_at >= ?2)
        ORDER BY recorded_at ASC
        "#,
    )
    .bind(metric_type)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(points)
}

/// Aggregate over the primary value of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub latest: MetricPoint,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub count: usize,
}

/// `None` for an empty series. `latest` is the point with the greatest
/// `recorded_at`, so the input need not be sorted.
pub fn summarize(points: &[MetricPoint]) -> Option<MetricSummary> {
    let latest = points.iter().max_by_key(|p| p.recorded_at)?;

    let min = points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
    let max = points
        .iter()
        .map(|p| p.value)
        .fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = points.iter().map(|p| p.value).sum();

    Some(MetricSummary {
        latest: latest.clone(),
        min,
        max,
        average: sum / points.len() as f64,
        count: points.len(),
    })
}

/// Summary of every metric type that has readings, in [`MetricType::ALL`] order.
pub async fn metric_overview(pool: &SqlitePool) -> AppResult<Vec<(MetricType, MetricSummary)>> {
    let mut overview = Vec::new();
    for metric_type in MetricType::ALL {
        let series = metric_series(pool, metric_type, None).await?;
        if let Some(summary) = summarize(&series) {
            overview.push((metric_type, summary));
        }
    }
    Ok(overview)
}
