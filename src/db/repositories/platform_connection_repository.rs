use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::PlatformConnection;

#[async_trait]
pub trait ConnectionStore: Send + Sync {
    async fn list_for_user(&self, user_id: &Uuid) -> Result<Vec<PlatformConnection>, AppError>;

    /// Connections that count against the plan cap. Disconnected rows are kept
    /// for history but free up their slot.
    async fn count_active_for_user(&self, user_id: &Uuid) -> Result<i64, AppError>;

    /// Inserts a connection in the `pending` state once `check` accepts the
    /// current active count. Counting and inserting are serialized per user,
    /// so concurrent creates cannot both pass the same count.
    async fn create_checked(
        &self,
        user_id: &Uuid,
        platform: &str,
        display_name: Option<&str>,
        check: ConnectionCheck<'_>,
    ) -> Result<PlatformConnection, AppError>;
}

/// Gate run against the active connection count inside the create.
pub type ConnectionCheck<'a> = &'a (dyn Fn(u32) -> Result<(), AppError> + Send + Sync);

pub struct PlatformConnectionRepository {
    db_pool: PgPool,
}

impl PlatformConnectionRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ConnectionStore for PlatformConnectionRepository {
    async fn list_for_user(&self, user_id: &Uuid) -> Result<Vec<PlatformConnection>, AppError> {
        sqlx::query_as::<_, PlatformConnection>(
            r#"
            SELECT id, user_id, platform, display_name, status, created_at, updated_at
            FROM platform_connections
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list platform connections: {}", e)))
    }

    async fn count_active_for_user(&self, user_id: &Uuid) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM platform_connections
            WHERE user_id = $1 AND status <> 'disconnected'
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to count platform connections: {}", e)))
    }

    async fn create_checked(
        &self,
        user_id: &Uuid,
        platform: &str,
        display_name: Option<&str>,
        check: ConnectionCheck<'_>,
    ) -> Result<PlatformConnection, AppError> {
        let mut tx = self.db_pool.begin().await?;

        // Held until commit/rollback
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Failed to lock platform connections: {}", e)))?;

        let current = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM platform_connections
            WHERE user_id = $1 AND status <> 'disconnected'
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Failed to count platform connections: {}", e)))?;

        check(u32::try_from(current).unwrap_or(u32::MAX))?;

        let connection = sqlx::query_as::<_, PlatformConnection>(
            r#"
            INSERT INTO platform_connections (id, user_id, platform, display_name, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'pending', now(), now())
            RETURNING id, user_id, platform, display_name, status, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(platform)
        .bind(display_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create platform connection: {}", e)))?;

        tx.commit().await?;
        Ok(connection)
    }
}
