use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription tiers, ordered from least to most capable.
///
/// The derived `Ord` follows declaration order, so `tier >= PlanTier::Starter`
/// reads as "at least starter".
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Starter,
    Professional,
    Enterprise,
}

impl PlanTier {
    pub const ALL: [PlanTier; 4] = [
        PlanTier::Free,
        PlanTier::Starter,
        PlanTier::Professional,
        PlanTier::Enterprise,
    ];

    /// Maps a raw `plan_name` column value to a tier.
    ///
    /// Total over all strings: anything that is not one of the four known
    /// names (including different casing or surrounding whitespace in the
    /// stored value) is treated as `Free`.
    pub fn from_plan_name(plan_name: &str) -> Self {
        match plan_name {
            "free" => PlanTier::Free,
            "starter" => PlanTier::Starter,
            "professional" => PlanTier::Professional,
            "enterprise" => PlanTier::Enterprise,
            _ => PlanTier::Free,
        }
    }

    pub const fn rank(self) -> u8 {
        match self {
            PlanTier::Free => 0,
            PlanTier::Starter => 1,
            PlanTier::Professional => 2,
            PlanTier::Enterprise => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Starter => "starter",
            PlanTier::Professional => "professional",
            PlanTier::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
