use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{MetricSummary, NewMetric};

#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Inserts all rows or none. Returns the number written.
    async fn insert_many(&self, user_id: &Uuid, metrics: &[NewMetric]) -> Result<u64, AppError>;

    /// Count and sum per metric type since `since`, ordered by type.
    async fn summarize_since(&self, user_id: &Uuid, since: DateTime<Utc>) -> Result<Vec<MetricSummary>, AppError>;
}

pub struct AnalyticsMetricRepository {
    pool: PgPool,
}

impl AnalyticsMetricRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetricStore for AnalyticsMetricRepository {
    async fn insert_many(&self, user_id: &Uuid, metrics: &[NewMetric]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for metric in metrics {
            let result = sqlx::query(
                r#"
                INSERT INTO analytics_metrics (id, user_id, metric_type, value, platform, metadata, recorded_at)
                VALUES ($1, $2, $3, $4, $5, $6, now())
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&metric.metric_type)
            .bind(metric.value)
            .bind(&metric.platform)
            .bind(&metric.metadata)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert analytics metric: {}", e)))?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn summarize_since(
        &self,
        user_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<MetricSummary>, AppError> {
        sqlx::query_as::<_, MetricSummary>(
            r#"
            SELECT metric_type,
                   COUNT(*) AS count,
                   COALESCE(SUM(value), 0)::float8 AS total
            FROM analytics_metrics
            WHERE user_id = $1 AND recorded_at >= $2
            GROUP BY metric_type
            ORDER BY metric_type
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to summarize analytics metrics: {}", e)))
    }
}
