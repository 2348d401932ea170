use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::PlatformMessage;

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Newest first, optionally restricted to one connection.
    async fn list_for_user(
        &self,
        user_id: &Uuid,
        connection_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PlatformMessage>, AppError>;

    async fn count_since(&self, user_id: &Uuid, since: DateTime<Utc>) -> Result<i64, AppError>;

    async fn exists_for_user(&self, user_id: &Uuid, message_id: &Uuid) -> Result<bool, AppError>;

    /// Returns false when no message with that id belongs to the user.
    async fn update_classification(
        &self,
        user_id: &Uuid,
        message_id: &Uuid,
        category: &str,
        sentiment: &str,
    ) -> Result<bool, AppError>;
}

pub struct PlatformMessageRepository {
    db_pool: PgPool,
}

impl PlatformMessageRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MessageStore for PlatformMessageRepository {
    async fn list_for_user(
        &self,
        user_id: &Uuid,
        connection_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PlatformMessage>, AppError> {
        sqlx::query_as::<_, PlatformMessage>(
            r#"
            SELECT id, user_id, connection_id, platform, direction, sender, content,
                   category, sentiment, created_at
            FROM platform_messages
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR connection_id = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(connection_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list platform messages: {}", e)))
    }

    async fn count_since(&self, user_id: &Uuid, since: DateTime<Utc>) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM platform_messages
            WHERE user_id = $1 AND created_at >= $2
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to count platform messages: {}", e)))
    }

    async fn exists_for_user(&self, user_id: &Uuid, message_id: &Uuid) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM platform_messages WHERE id = $1 AND user_id = $2)
            "#,
        )
        .bind(message_id)
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to look up platform message: {}", e)))
    }

    async fn update_classification(
        &self,
        user_id: &Uuid,
        message_id: &Uuid,
        category: &str,
        sentiment: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE platform_messages
            SET category = $3, sentiment = $4
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(message_id)
        .bind(user_id)
        .bind(category)
        .bind(sentiment)
        .execute(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update message classification: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
