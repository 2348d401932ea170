use chrono::{Duration, Utc};
use log::info;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::repositories::MetricStore;
use crate::error::{AppError, AppResult};
use crate::models::{MetricSummary, NewMetric};

pub const MAX_METRIC_BATCH: usize = 100;
pub const MAX_METRIC_TYPE_LEN: usize = 100;
pub const MAX_SUMMARY_DAYS: i64 = 365;

/// Ingestion body: either a single metric or a `metrics` batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IngestMetricsRequest {
    Batch { metrics: Vec<NewMetric> },
    Single(NewMetric),
}

impl IngestMetricsRequest {
    pub fn into_metrics(self) -> Vec<NewMetric> {
        match self {
            IngestMetricsRequest::Batch { metrics } => metrics,
            IngestMetricsRequest::Single(metric) => vec![metric],
        }
    }
}

pub fn validate_metrics(metrics: &[NewMetric]) -> AppResult<()> {
    if metrics.is_empty() {
        return Err(AppError::Validation("at least one metric is required".to_string()));
    }
    if metrics.len() > MAX_METRIC_BATCH {
        return Err(AppError::Validation(format!(
            "at most {} metrics may be sent at once",
            MAX_METRIC_BATCH
        )));
    }
    for (index, metric) in metrics.iter().enumerate() {
        let metric_type = metric.metric_type.trim();
        if metric_type.is_empty() || metric_type.chars().count() > MAX_METRIC_TYPE_LEN {
            return Err(AppError::Validation(format!(
                "metrics[{}].metricType must be 1-{} characters",
                index, MAX_METRIC_TYPE_LEN
            )));
        }
        if !metric.value.is_finite() {
            return Err(AppError::Validation(format!("metrics[{}].value must be a finite number", index)));
        }
    }
    Ok(())
}

pub struct MetricsService {
    store: Arc<dyn MetricStore>,
}

impl MetricsService {
    pub fn new(store: Arc<dyn MetricStore>) -> Self {
        Self { store }
    }

    pub async fn ingest(&self, user_id: &Uuid, metrics: Vec<NewMetric>) -> AppResult<u64> {
        validate_metrics(&metrics)?;

        let metrics: Vec<NewMetric> = metrics
            .into_iter()
            .map(|mut m| {
                m.metric_type = m.metric_type.trim().to_string();
                m
            })
            .collect();

        let inserted = self.store.insert_many(user_id, &metrics).await?;
        info!("Ingested {} analytics metrics for user {}", inserted, user_id);
        Ok(inserted)
    }

    pub async fn summary(&self, user_id: &Uuid, days: Option<i64>) -> AppResult<Vec<MetricSummary>> {
        let days = days.unwrap_or(30).clamp(1, MAX_SUMMARY_DAYS);
        let since = Utc::now() - Duration::days(days);
        self.store.summarize_since(user_id, since).await
    }
}
