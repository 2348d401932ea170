use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::entitlements::{PlanTier, SubscriptionSnapshot};
use crate::error::AppError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriptionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub plan_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    pub fn snapshot(&self) -> SubscriptionSnapshot {
        SubscriptionSnapshot::new(self.status.clone(), self.plan_name.clone())
    }
}

/// Source of the "current" subscription for a user.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn current_for_user(&self, user_id: &Uuid) -> Result<Option<SubscriptionSnapshot>, AppError>;
}

pub struct SubscriptionRepository {
    db_pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Most recent active subscription row for the user, if any.
    pub async fn get_current_for_user(&self, user_id: &Uuid) -> Result<Option<SubscriptionRecord>, AppError> {
        sqlx::query_as::<_, SubscriptionRecord>(
            r#"
            SELECT id, user_id, status, plan_name, created_at, updated_at
            FROM subscriptions
            WHERE user_id = $1 AND status = 'active'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch user subscription: {}", e)))
    }

    pub async fn create_with_executor(
        &self,
        user_id: &Uuid,
        plan: PlanTier,
        status: &str,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<SubscriptionRecord, AppError> {
        sqlx::query_as::<_, SubscriptionRecord>(
            r#"
            INSERT INTO subscriptions (id, user_id, status, plan_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, now(), now())
            RETURNING id, user_id, status, plan_name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(status)
        .bind(plan.as_str())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create subscription: {}", e)))
    }
}

#[async_trait]
impl SubscriptionStore for SubscriptionRepository {
    async fn current_for_user(&self, user_id: &Uuid) -> Result<Option<SubscriptionSnapshot>, AppError> {
        Ok(self
            .get_current_for_user(user_id)
            .await?
            .map(|record| record.snapshot()))
    }
}
