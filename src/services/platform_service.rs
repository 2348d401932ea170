use chrono::{DateTime, Datelike, Utc};
use futures_util::try_join;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::repositories::{ConnectionStore, MessageStore};
use crate::entitlements::{is_known_platform, PlanLimits, PlanTier};
use crate::error::{AppError, AppResult};
use crate::models::{PlatformConnection, PlatformMessage};
use crate::services::export::MAX_EXPORT_ROWS;
use crate::services::entitlement_service::{effective_tier, ensure_can_connect, EntitlementService};

pub const DEFAULT_MESSAGE_PAGE: i64 = 50;
pub const MAX_MESSAGE_PAGE: i64 = 200;
pub const MAX_DISPLAY_NAME_LEN: usize = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConnectionRequest {
    pub platform: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageQuery {
    pub connection_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl MessageQuery {
    /// Clamped `(limit, offset)`.
    pub fn page(&self) -> (i64, i64) {
        (
            self.limit.unwrap_or(DEFAULT_MESSAGE_PAGE).clamp(1, MAX_MESSAGE_PAGE),
            self.offset.unwrap_or(0).max(0),
        )
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionsOverview {
    pub connections: Vec<PlatformConnection>,
    pub used: i64,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCounter {
    pub used: i64,
    pub limit: Option<u32>,
    pub limit_reached: bool,
}

impl UsageCounter {
    fn new(used: i64, limit: Option<u32>) -> Self {
        Self {
            used,
            limit,
            limit_reached: limit.is_some_and(|max| used >= i64::from(max)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub plan_name: PlanTier,
    pub effective_plan: PlanTier,
    pub period_start: DateTime<Utc>,
    pub connections: UsageCounter,
    pub messages: UsageCounter,
}

/// Midnight UTC on the first day of `now`'s month.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .with_day(1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|start| start.and_utc())
        .unwrap_or(now)
}

pub struct PlatformService {
    entitlements: Arc<EntitlementService>,
    connections: Arc<dyn ConnectionStore>,
    messages: Arc<dyn MessageStore>,
}

impl PlatformService {
    pub fn new(
        entitlements: Arc<EntitlementService>,
        connections: Arc<dyn ConnectionStore>,
        messages: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            entitlements,
            connections,
            messages,
        }
    }

    pub async fn list_connections(&self, user_id: &Uuid) -> AppResult<ConnectionsOverview> {
        let (entitlement, connections, used) = try_join!(
            self.entitlements.for_user(user_id),
            self.connections.list_for_user(user_id),
            self.connections.count_active_for_user(user_id),
        )?;

        Ok(ConnectionsOverview {
            connections,
            used,
            limit: PlanLimits::for_tier(effective_tier(&entitlement)).max_connections,
        })
    }

    pub async fn create_connection(
        &self,
        user_id: &Uuid,
        request: CreateConnectionRequest,
    ) -> AppResult<PlatformConnection> {
        let platform = request.platform.trim().to_ascii_lowercase();
        if !is_known_platform(&platform) {
            return Err(AppError::Validation(format!("Unknown platform '{}'", request.platform)));
        }
        let display_name = request
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        if display_name.is_some_and(|name| name.chars().count() > MAX_DISPLAY_NAME_LEN) {
            return Err(AppError::Validation(format!(
                "displayName must be at most {} characters",
                MAX_DISPLAY_NAME_LEN
            )));
        }

        let entitlement = self.entitlements.for_user(user_id).await?;
        let check = |current: u32| ensure_can_connect(&entitlement, &platform, current);

        let connection = self
            .connections
            .create_checked(user_id, &platform, display_name, &check)
            .await?;
        info!("User {} added a pending {} connection {}", user_id, platform, connection.id);
        Ok(connection)
    }

    pub async fn list_messages(&self, user_id: &Uuid, query: &MessageQuery) -> AppResult<Vec<PlatformMessage>> {
        let (limit, offset) = query.page();
        self.messages
            .list_for_user(user_id, query.connection_id, limit, offset)
            .await
    }

    /// Newest messages up to the export row cap.
    pub async fn messages_for_export(&self, user_id: &Uuid) -> AppResult<Vec<PlatformMessage>> {
        self.messages
            .list_for_user(user_id, None, MAX_EXPORT_ROWS as i64, 0)
            .await
    }

    pub async fn usage(&self, user_id: &Uuid) -> AppResult<UsageSummary> {
        let period_start = month_start(Utc::now());
        let (entitlement, connections_used, messages_used) = try_join!(
            self.entitlements.for_user(user_id),
            self.connections.count_active_for_user(user_id),
            self.messages.count_since(user_id, period_start),
        )?;

        let effective = effective_tier(&entitlement);
        let limits = PlanLimits::for_tier(effective);

        Ok(UsageSummary {
            plan_name: entitlement.plan_name,
            effective_plan: effective,
            period_start,
            connections: UsageCounter::new(connections_used, limits.max_connections),
            messages: UsageCounter::new(messages_used, limits.max_messages),
        })
    }
}
