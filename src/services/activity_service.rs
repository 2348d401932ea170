use log::{debug, info};
use serde::Deserialize;
use sqlx::types::ipnetwork::IpNetwork;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::repositories::{ActivityStore, CreateActivityLogRequest};
use crate::error::{AppError, AppResult};
use crate::models::ActivityLog;

pub const MAX_ACTION_LEN: usize = 100;
pub const MAX_RECENT_ACTIVITY: i64 = 200;

/// Request-level information recorded alongside each entry.
#[derive(Debug, Clone, Default)]
pub struct ActivityContext {
    pub ip_address: Option<IpNetwork>,
    pub user_agent: Option<String>,
}

impl ActivityContext {
    pub fn with_ip_addr(mut self, ip_addr: std::net::IpAddr) -> Self {
        self.ip_address = Some(IpNetwork::from(ip_addr));
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogActivityRequest {
    pub action: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Trims the action and enforces its length bounds.
pub fn normalize_action(action: &str) -> AppResult<String> {
    let action = action.trim();
    if action.is_empty() {
        return Err(AppError::Validation("action must not be empty".to_string()));
    }
    if action.chars().count() > MAX_ACTION_LEN {
        return Err(AppError::Validation(format!(
            "action must be at most {} characters",
            MAX_ACTION_LEN
        )));
    }
    Ok(action.to_string())
}

#[derive(Clone)]
pub struct ActivityService {
    store: Arc<dyn ActivityStore>,
    trust_proxy_headers: bool,
}

impl ActivityService {
    /// `trust_proxy_headers` decides whether `Forwarded`/`X-Forwarded-For`
    /// may name the client address.
    pub fn new(store: Arc<dyn ActivityStore>, trust_proxy_headers: bool) -> Self {
        Self {
            store,
            trust_proxy_headers,
        }
    }

    pub fn trusts_proxy_headers(&self) -> bool {
        self.trust_proxy_headers
    }

    pub async fn log(
        &self,
        user_id: Uuid,
        request: LogActivityRequest,
        context: ActivityContext,
    ) -> AppResult<ActivityLog> {
        let action = normalize_action(&request.action)?;

        let entry = self
            .store
            .create(CreateActivityLogRequest {
                user_id,
                action,
                entity_type: request.entity_type,
                entity_id: request.entity_id,
                metadata: request.metadata,
                ip_address: context.ip_address,
                user_agent: context.user_agent,
            })
            .await?;

        info!("Activity '{}' logged for user {}", entry.action, user_id);
        Ok(entry)
    }

    pub async fn recent(&self, user_id: &Uuid, limit: Option<i64>) -> AppResult<Vec<ActivityLog>> {
        let limit = limit.unwrap_or(50).clamp(1, MAX_RECENT_ACTIVITY);
        debug!("Listing {} recent activity entries for user {}", limit, user_id);
        self.store.list_recent(user_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::InMemoryActivityStore;

    #[test]
    fn test_normalize_action_trims() {
        assert_eq!(normalize_action("  export_pdf ").unwrap(), "export_pdf");
    }

    #[test]
    fn test_normalize_action_rejects_blank_and_long() {
        assert!(matches!(normalize_action("   "), Err(AppError::Validation(_))));
        assert!(matches!(normalize_action(&"a".repeat(MAX_ACTION_LEN + 1)), Err(AppError::Validation(_))));
        assert!(normalize_action(&"a".repeat(MAX_ACTION_LEN)).is_ok());
    }

    #[tokio::test]
    async fn test_log_stores_trimmed_action_and_context() {
        let store = Arc::new(InMemoryActivityStore::default());
        let service = ActivityService::new(store.clone(), false);
        let user_id = Uuid::new_v4();

        let entry = service
            .log(
                user_id,
                LogActivityRequest {
                    action: " connection_added ".to_string(),
                    entity_type: Some("platform_connection".to_string()),
                    entity_id: None,
                    metadata: None,
                },
                ActivityContext::default().with_user_agent("curl/8.5"),
            )
            .await
            .unwrap();

        assert_eq!(entry.action, "connection_added");
        assert_eq!(entry.user_agent.as_deref(), Some("curl/8.5"));
        assert_eq!(service.recent(&user_id, None).await.unwrap().len(), 1);
        assert!(service.recent(&Uuid::new_v4(), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_action_is_not_stored() {
        let store = Arc::new(InMemoryActivityStore::default());
        let service = ActivityService::new(store.clone(), false);
        let result = service
            .log(
                Uuid::new_v4(),
                LogActivityRequest {
                    action: String::new(),
                    entity_type: None,
                    entity_id: None,
                    metadata: None,
                },
                ActivityContext::default(),
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_context_builders() {
        let context = ActivityContext::default()
            .with_ip_addr("203.0.113.7".parse().unwrap())
            .with_user_agent("Mozilla/5.0");
        assert_eq!(context.ip_address.unwrap().ip().to_string(), "203.0.113.7");
        assert_eq!(context.user_agent.as_deref(), Some("Mozilla/5.0"));
    }
}
