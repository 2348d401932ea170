use serde::{Deserialize, Serialize};

/// A metric row before insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMetric {
    pub metric_type: String,
    pub value: f64,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MetricSummary {
    pub metric_type: String,
    pub count: i64,
    pub total: f64,
}
