use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use log::{info, warn};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::repositories::TestUserStore;
use crate::entitlements::PlanTier;
use crate::error::{AppError, AppResult};
use crate::models::AuthenticatedUser;

pub const GENERATED_PASSWORD_LEN: usize = 20;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionTestUserRequest {
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedTestUser {
    pub user_id: Uuid,
    pub email: String,
    /// Present only when the password was generated here.
    pub password: Option<String>,
    pub plan_name: PlanTier,
}

pub fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
        .map_err(|e| AppError::Internal(format!("Failed to encode password salt: {}", e)))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Hashes off the async worker threads.
pub async fn hash_password_blocking(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_ascii_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!("'{}' is not a valid email address", email)));
    }
    Ok(email)
}

/// Creates users with an attached subscription for QA environments.
pub struct ProvisioningService {
    store: Arc<dyn TestUserStore>,
    enabled: bool,
}

impl ProvisioningService {
    pub fn new(store: Arc<dyn TestUserStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    pub async fn provision(
        &self,
        caller: &AuthenticatedUser,
        request: ProvisionTestUserRequest,
    ) -> AppResult<ProvisionedTestUser> {
        authorize(self.enabled, caller)?;

        let email = normalize_email(&request.email)?;
        let (password, generated) = match request.password {
            Some(password) if password.chars().count() < MIN_PASSWORD_LEN => {
                return Err(AppError::Validation(format!(
                    "password must be at least {} characters",
                    MIN_PASSWORD_LEN
                )));
            }
            Some(password) => (password, false),
            None => (generate_password(), true),
        };
        let plan = request
            .plan
            .as_deref()
            .map(PlanTier::from_plan_name)
            .unwrap_or_default();

        if self.store.email_exists(&email).await? {
            return Err(AppError::BadRequest(format!("A user with email {} already exists", email)));
        }

        let password_hash = hash_password_blocking(password.clone()).await?;
        let user = self
            .store
            .create_with_subscription(&email, &password_hash, plan)
            .await?;

        info!(
            "Admin {} provisioned test user {} on the {} plan",
            caller.user_id, user.id, plan
        );

        Ok(ProvisionedTestUser {
            user_id: user.id,
            email: user.email,
            password: generated.then_some(password),
            plan_name: plan,
        })
    }
}

fn authorize(enabled: bool, caller: &AuthenticatedUser) -> AppResult<()> {
    if !enabled {
        warn!("Test user provisioning attempted by {} while disabled", caller.user_id);
        return Err(AppError::Forbidden("Test user provisioning is disabled".to_string()));
    }
    if !caller.is_admin() {
        warn!("Non-admin {} attempted to provision a test user", caller.user_id);
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }
    Ok(())
}
