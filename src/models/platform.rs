use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A linked messaging account (WhatsApp number, Telegram bot, ...).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConnection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: String,
    pub display_name: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMessage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub connection_id: Uuid,
    pub platform: String,
    pub direction: String,
    pub sender: Option<String>,
    pub content: String,
    pub category: Option<String>,
    pub sentiment: Option<String>,
    pub created_at: DateTime<Utc>,
}
