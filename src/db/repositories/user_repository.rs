use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::subscription_repository::SubscriptionRepository;
use crate::entitlements::PlanTier;
use crate::error::AppError;
use crate::models::User;

/// Writes used by test-user provisioning.
#[async_trait]
pub trait TestUserStore: Send + Sync {
    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    /// Creates the user and an active subscription on `plan` atomically.
    /// A taken email is a `BadRequest`.
    async fn create_with_subscription(
        &self,
        email: &str,
        password_hash: &str,
        plan: PlanTier,
    ) -> Result<User, AppError>;
}

pub struct UserRepository {
    db_pool: PgPool,
}

impl UserRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, is_test_user, created_at
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch user by email: {}", e)))
    }

    pub async fn create_test_user_with_executor(
        &self,
        email: &str,
        password_hash: &str,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, role, is_test_user, created_at)
            VALUES ($1, $2, $3, 'authenticated', true, now())
            RETURNING id, email, password_hash, role, is_test_user, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::BadRequest(format!("A user with email {} already exists", email))
            }
            _ => AppError::Database(format!("Failed to create test user: {}", e)),
        })
    }
}

#[async_trait]
impl TestUserStore for UserRepository {
    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.get_by_email(email).await?.is_some())
    }

    async fn create_with_subscription(
        &self,
        email: &str,
        password_hash: &str,
        plan: PlanTier,
    ) -> Result<User, AppError> {
        let subscriptions = SubscriptionRepository::new(self.db_pool.clone());

        let mut tx = self.db_pool.begin().await?;
        let user = self.create_test_user_with_executor(email, password_hash, &mut tx).await?;
        subscriptions
            .create_with_executor(&user.id, plan, "active", &mut tx)
            .await?;
        tx.commit().await?;

        Ok(user)
    }
}
