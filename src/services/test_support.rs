//! In-memory stores for service and handler tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use uuid::Uuid;

use crate::db::repositories::{
    ActivityStore, ConnectionCheck, ConnectionStore, CreateActivityLogRequest, MessageStore, MetricStore,
    SubscriptionStore, TestUserStore,
};
use crate::entitlements::{PlanTier, SubscriptionSnapshot};
use crate::error::AppError;
use crate::models::{ActivityLog, MetricSummary, NewMetric, PlatformConnection, PlatformMessage, User};

#[derive(Default)]
pub struct InMemorySubscriptionStore {
    rows: Mutex<HashMap<Uuid, SubscriptionSnapshot>>,
    fail: bool,
}

impl InMemorySubscriptionStore {
    pub fn with_subscription(self, user_id: Uuid, status: &str, plan_name: &str) -> Self {
        self.rows
            .lock()
            .unwrap()
            .insert(user_id, SubscriptionSnapshot::new(status, plan_name));
        self
    }

    pub fn failing() -> Self {
        Self {
            rows: Mutex::default(),
            fail: true,
        }
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn current_for_user(&self, user_id: &Uuid) -> Result<Option<SubscriptionSnapshot>, AppError> {
        if self.fail {
            return Err(AppError::Database("connection reset".to_string()));
        }
        Ok(self.rows.lock().unwrap().get(user_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryMetricStore {
    rows: Mutex<Vec<(Uuid, NewMetric)>>,
}

impl InMemoryMetricStore {
    pub fn rows(&self) -> Vec<(Uuid, NewMetric)> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricStore for InMemoryMetricStore {
    async fn insert_many(&self, user_id: &Uuid, metrics: &[NewMetric]) -> Result<u64, AppError> {
        let mut rows = self.rows.lock().unwrap();
        rows.extend(metrics.iter().cloned().map(|m| (*user_id, m)));
        Ok(metrics.len() as u64)
    }

    async fn summarize_since(&self, user_id: &Uuid, _since: DateTime<Utc>) -> Result<Vec<MetricSummary>, AppError> {
        let mut totals: BTreeMap<String, (i64, f64)> = BTreeMap::new();
        for (owner, metric) in self.rows.lock().unwrap().iter() {
            if owner == user_id {
                let entry = totals.entry(metric.metric_type.clone()).or_default();
                entry.0 += 1;
                entry.1 += metric.value;
            }
        }
        Ok(totals
            .into_iter()
            .map(|(metric_type, (count, total))| MetricSummary {
                metric_type,
                count,
                total,
            })
            .collect())
    }
}

pub fn message(user_id: Uuid, connection_id: Uuid, content: &str, created_at: DateTime<Utc>) -> PlatformMessage {
    PlatformMessage {
        id: Uuid::new_v4(),
        user_id,
        connection_id,
        platform: "whatsapp".to_string(),
        direction: "inbound".to_string(),
        sender: Some("+351900000000".to_string()),
        content: content.to_string(),
        category: None,
        sentiment: None,
        created_at,
    }
}

#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: Mutex<Vec<PlatformMessage>>,
}

impl InMemoryMessageStore {
    pub fn with_message(self, user_id: Uuid, message_id: Uuid) -> Self {
        let mut row = message(user_id, Uuid::new_v4(), "hello", Utc::now());
        row.id = message_id;
        self.with_row(row)
    }

    pub fn with_row(self, row: PlatformMessage) -> Self {
        self.messages.lock().unwrap().push(row);
        self
    }

    pub fn classification(&self, message_id: &Uuid) -> Option<(String, String)> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == *message_id)
            .and_then(|m| m.category.clone().zip(m.sentiment.clone()))
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn list_for_user(
        &self,
        user_id: &Uuid,
        connection_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PlatformMessage>, AppError> {
        let mut rows: Vec<PlatformMessage> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.user_id == *user_id && connection_id.is_none_or(|c| c == m.connection_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows.into_iter().skip(offset as usize).take(limit as usize).collect())
    }

    async fn count_since(&self, user_id: &Uuid, since: DateTime<Utc>) -> Result<i64, AppError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.user_id == *user_id && m.created_at >= since)
            .count() as i64)
    }

    async fn exists_for_user(&self, user_id: &Uuid, message_id: &Uuid) -> Result<bool, AppError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.id == *message_id && m.user_id == *user_id))
    }

    async fn update_classification(
        &self,
        user_id: &Uuid,
        message_id: &Uuid,
        category: &str,
        sentiment: &str,
    ) -> Result<bool, AppError> {
        let mut messages = self.messages.lock().unwrap();
        match messages.iter_mut().find(|m| m.id == *message_id && m.user_id == *user_id) {
            Some(row) => {
                row.category = Some(category.to_string());
                row.sentiment = Some(sentiment.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryConnectionStore {
    rows: Mutex<Vec<PlatformConnection>>,
    create_lock: tokio::sync::Mutex<()>,
}

impl InMemoryConnectionStore {
    pub fn with_connection(self, user_id: Uuid, platform: &str, status: &str) -> Self {
        let now = Utc::now();
        self.rows.lock().unwrap().push(PlatformConnection {
            id: Uuid::new_v4(),
            user_id,
            platform: platform.to_string(),
            display_name: None,
            status: status.to_string(),
            created_at: now,
            updated_at: now,
        });
        self
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl ConnectionStore for InMemoryConnectionStore {
    async fn list_for_user(&self, user_id: &Uuid) -> Result<Vec<PlatformConnection>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn count_active_for_user(&self, user_id: &Uuid) -> Result<i64, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == *user_id && c.status != "disconnected")
            .count() as i64)
    }

    async fn create_checked(
        &self,
        user_id: &Uuid,
        platform: &str,
        display_name: Option<&str>,
        check: ConnectionCheck<'_>,
    ) -> Result<PlatformConnection, AppError> {
        let _guard = self.create_lock.lock().await;
        let current = self.count_active_for_user(user_id).await?;
        // Round trip to the database between count and insert
        tokio::task::yield_now().await;
        check(u32::try_from(current).unwrap_or(u32::MAX))?;

        let now = Utc::now();
        let row = PlatformConnection {
            id: Uuid::new_v4(),
            user_id: *user_id,
            platform: platform.to_string(),
            display_name: display_name.map(str::to_string),
            status: "pending".to_string(),
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }
}

#[derive(Default)]
pub struct InMemoryActivityStore {
    rows: Mutex<Vec<ActivityLog>>,
}

impl InMemoryActivityStore {
    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn rows(&self) -> Vec<ActivityLog> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivityStore for InMemoryActivityStore {
    async fn create(&self, request: CreateActivityLogRequest) -> Result<ActivityLog, AppError> {
        let row = ActivityLog {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            action: request.action,
            entity_type: request.entity_type,
            entity_id: request.entity_id,
            metadata: request.metadata,
            ip_address: request.ip_address,
            user_agent: request.user_agent,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_recent(&self, user_id: &Uuid, limit: i64) -> Result<Vec<ActivityLog>, AppError> {
        let mut rows: Vec<ActivityLog> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == *user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

#[derive(Default)]
pub struct InMemoryTestUserStore {
    users: Mutex<Vec<(User, PlanTier)>>,
}

impl InMemoryTestUserStore {
    pub fn with_user(self, email: &str) -> Self {
        self.users.lock().unwrap().push((test_user(email, "existing-hash"), PlanTier::Free));
        self
    }

    pub fn get(&self, email: &str) -> Option<(User, PlanTier)> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u.email == email)
            .cloned()
    }
}

fn test_user(email: &str, password_hash: &str) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        role: "authenticated".to_string(),
        is_test_user: true,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl TestUserStore for InMemoryTestUserStore {
    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.get(email).is_some())
    }

    async fn create_with_subscription(
        &self,
        email: &str,
        password_hash: &str,
        plan: PlanTier,
    ) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|(u, _)| u.email == email) {
            return Err(AppError::BadRequest(format!("A user with email {} already exists", email)));
        }
        let user = test_user(email, password_hash);
        users.push((user.clone(), plan));
        Ok(user)
    }
}
