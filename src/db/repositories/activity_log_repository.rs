use async_trait::async_trait;
use sqlx::types::ipnetwork::IpNetwork;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::ActivityLog;

#[derive(Debug, Clone)]
pub struct CreateActivityLogRequest {
    pub user_id: Uuid,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<IpNetwork>,
    pub user_agent: Option<String>,
}

#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn create(&self, request: CreateActivityLogRequest) -> Result<ActivityLog, AppError>;

    /// Newest first.
    async fn list_recent(&self, user_id: &Uuid, limit: i64) -> Result<Vec<ActivityLog>, AppError>;
}

#[derive(Debug)]
pub struct ActivityLogRepository {
    pool: PgPool,
}

impl ActivityLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityStore for ActivityLogRepository {
    async fn create(&self, request: CreateActivityLogRequest) -> Result<ActivityLog, AppError> {
        sqlx::query_as::<_, ActivityLog>(
            r#"
            INSERT INTO activity_logs (
                id, user_id, action, entity_type, entity_id, metadata, ip_address, user_agent, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
            RETURNING id, user_id, action, entity_type, entity_id, metadata, ip_address, user_agent, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(request.action)
        .bind(request.entity_type)
        .bind(request.entity_id)
        .bind(request.metadata)
        .bind(request.ip_address)
        .bind(request.user_agent)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create activity log: {}", e)))
    }

    async fn list_recent(&self, user_id: &Uuid, limit: i64) -> Result<Vec<ActivityLog>, AppError> {
        sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT id, user_id, action, entity_type, entity_id, metadata, ip_address, user_agent, created_at
            FROM activity_logs
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list activity logs: {}", e)))
    }
}
