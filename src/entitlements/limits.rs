use serde::Serialize;

use super::PlanTier;

/// Static per-tier caps. `None` means the tier is uncapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub max_connections: Option<u32>,
    pub max_messages: Option<u32>,
    pub allowed_platforms: &'static [&'static str],
    pub analytics: bool,
}

/// Platform identifiers the backend knows how to connect.
pub const KNOWN_PLATFORMS: &[&str] = &["whatsapp", "telegram", "instagram", "messenger", "slack"];

const FREE: PlanLimits = PlanLimits {
    max_connections: Some(1),
    max_messages: Some(100),
    allowed_platforms: &["whatsapp"],
    analytics: false,
};

const STARTER: PlanLimits = PlanLimits {
    max_connections: Some(3),
    max_messages: Some(1_000),
    allowed_platforms: &["whatsapp", "telegram"],
    analytics: false,
};

const PROFESSIONAL: PlanLimits = PlanLimits {
    max_connections: Some(10),
    max_messages: Some(10_000),
    allowed_platforms: &["whatsapp", "telegram", "instagram", "messenger"],
    analytics: true,
};

const ENTERPRISE: PlanLimits = PlanLimits {
    max_connections: None,
    max_messages: None,
    allowed_platforms: KNOWN_PLATFORMS,
    analytics: true,
};

impl PlanLimits {
    pub const fn for_tier(tier: PlanTier) -> Self {
        match tier {
            PlanTier::Free => FREE,
            PlanTier::Starter => STARTER,
            PlanTier::Professional => PROFESSIONAL,
            PlanTier::Enterprise => ENTERPRISE,
        }
    }

    pub fn allows_platform(&self, platform: &str) -> bool {
        self.allowed_platforms
            .iter()
            .any(|p| p.eq_ignore_ascii_case(platform.trim()))
    }

    /// True once `current_connections` has reached the cap.
    pub fn connection_limit_reached(&self, current_connections: u32) -> bool {
        self.max_connections
            .map(|max| current_connections >= max)
            .unwrap_or(false)
    }

    pub fn message_limit_reached(&self, current_messages: u32) -> bool {
        self.max_messages
            .map(|max| current_messages >= max)
            .unwrap_or(false)
    }
}

pub fn is_known_platform(platform: &str) -> bool {
    KNOWN_PLATFORMS
        .iter()
        .any(|p| p.eq_ignore_ascii_case(platform.trim()))
}
