use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::entitlements::Feature;
use crate::error::AppError;
use crate::models::AuthenticatedUser;
use crate::services::metrics_service::IngestMetricsRequest;
use crate::services::{EntitlementService, MetricsService};

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub days: Option<i64>,
}

/// Accepts a single metric or a `{ "metrics": [...] }` batch.
pub async fn ingest_metrics(
    user: AuthenticatedUser,
    body: web::Json<IngestMetricsRequest>,
    metrics: web::Data<Arc<MetricsService>>,
) -> Result<HttpResponse, AppError> {
    let inserted = metrics
        .ingest(&user.user_id, body.into_inner().into_metrics())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "inserted": inserted })))
}

pub async fn metrics_summary(
    user: AuthenticatedUser,
    query: web::Query<SummaryQuery>,
    entitlements: web::Data<Arc<EntitlementService>>,
    metrics: web::Data<Arc<MetricsService>>,
) -> Result<HttpResponse, AppError> {
    entitlements.require_feature(&user.user_id, Feature::Analytics).await?;
    let summary = metrics.summary(&user.user_id, query.days).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "summary": summary })))
}
