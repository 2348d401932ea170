use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{PlanLimits, PlanTier};

/// Raw subscription fields as stored. Values outside the known enumerations
/// are tolerated and resolved by [`evaluate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    pub status: String,
    pub plan_name: String,
}

impl SubscriptionSnapshot {
    pub fn new(status: impl Into<String>, plan_name: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            plan_name: plan_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Other(String),
}

impl SubscriptionStatus {
    /// Only the exact string `"active"` counts as active.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "active" => SubscriptionStatus::Active,
            "inactive" => SubscriptionStatus::Inactive,
            other => SubscriptionStatus::Other(other.to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }
}

/// Gated product features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    Analytics,
    MultiPlatform,
    AdvancedAi,
}

impl Feature {
    pub const ALL: [Feature; 3] = [Feature::Analytics, Feature::MultiPlatform, Feature::AdvancedAi];

    pub const fn as_str(self) -> &'static str {
        match self {
            Feature::Analytics => "analytics",
            Feature::MultiPlatform => "multi-platform",
            Feature::AdvancedAi => "advanced-ai",
        }
    }

    /// Lowest tier that unlocks the feature.
    pub const fn required_tier(self) -> PlanTier {
        match self {
            Feature::Analytics | Feature::MultiPlatform | Feature::AdvancedAi => PlanTier::Professional,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFeature(pub String);

impl fmt::Display for UnknownFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown feature: {}", self.0)
    }
}

impl std::error::Error for UnknownFeature {}

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analytics" => Ok(Feature::Analytics),
            "multi-platform" => Ok(Feature::MultiPlatform),
            "advanced-ai" => Ok(Feature::AdvancedAi),
            _ => Err(UnknownFeature(s.to_string())),
        }
    }
}

/// Access rights derived from a subscription. Recomputed per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub has_active_subscription: bool,
    pub plan_name: PlanTier,
    pub limits: PlanLimits,
}

impl Entitlement {
    /// Features are gated by the same rule as tiers: the subscription must be
    /// active and at least the feature's required tier.
    pub fn has_feature(&self, feature: Feature) -> bool {
        has_access(feature.required_tier(), self)
    }

    /// Unrecognised names are never granted.
    pub fn has_feature_named(&self, name: &str) -> bool {
        name.parse::<Feature>()
            .map(|feature| self.has_feature(feature))
            .unwrap_or(false)
    }

    pub fn features(&self) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|feature| self.has_feature(*feature))
            .collect()
    }
}

/// Evaluates a subscription row. An absent row is an inactive free plan.
pub fn evaluate(subscription: Option<&SubscriptionSnapshot>) -> Entitlement {
    let (has_active_subscription, plan_name) = match subscription {
        Some(sub) => (
            SubscriptionStatus::parse(&sub.status).is_active(),
            PlanTier::from_plan_name(&sub.plan_name),
        ),
        None => (false, PlanTier::Free),
    };

    Entitlement {
        has_active_subscription,
        plan_name,
        limits: PlanLimits::for_tier(plan_name),
    }
}

pub fn has_access(required_plan: PlanTier, entitlement: &Entitlement) -> bool {
    entitlement.has_active_subscription && entitlement.plan_name.rank() >= required_plan.rank()
}
