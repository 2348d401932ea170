use reqwest::Client;
use std::time::Duration;

use crate::error::AppError;

/// Shared outbound client for third-party APIs.
pub fn new_api_client() -> Result<Client, AppError> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .user_agent(concat!("chatdesk-server/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))
}
