use std::sync::Arc;
use log::debug;
use uuid::Uuid;

use crate::db::repositories::SubscriptionStore;
use crate::entitlements::{evaluate, has_access, Entitlement, Feature, PlanLimits, PlanTier};
use crate::error::{AppError, AppResult, UpgradeInfo};

/// Fails with `UpgradeRequired` unless the entitlement reaches `required`.
pub fn ensure_plan(entitlement: &Entitlement, required: PlanTier, reason: &str) -> AppResult<()> {
    if has_access(required, entitlement) {
        Ok(())
    } else {
        Err(upgrade_required(entitlement.plan_name, required, reason.to_string()))
    }
}

pub fn ensure_feature(entitlement: &Entitlement, feature: Feature) -> AppResult<()> {
    ensure_plan(entitlement, feature.required_tier(), feature.as_str())
}

/// Limits that actually apply: a lapsed paid plan falls back to free.
pub fn effective_tier(entitlement: &Entitlement) -> PlanTier {
    if entitlement.has_active_subscription {
        entitlement.plan_name
    } else {
        PlanTier::Free
    }
}

fn upgrade_required(current_plan: PlanTier, required_plan: PlanTier, reason: String) -> AppError {
    AppError::UpgradeRequired(UpgradeInfo {
        current_plan,
        required_plan,
        reason,
    })
}

/// Checks a new connection on `platform` against the plan, given how many
/// connections already count against the cap.
pub fn ensure_can_connect(entitlement: &Entitlement, platform: &str, current_connections: u32) -> AppResult<()> {
    let tier = effective_tier(entitlement);
    let limits = PlanLimits::for_tier(tier);

    if !limits.allows_platform(platform) {
        let required = PlanTier::ALL
            .into_iter()
            .find(|t| PlanLimits::for_tier(*t).allows_platform(platform))
            .unwrap_or(PlanTier::Enterprise);
        return Err(upgrade_required(
            tier,
            required,
            format!("{} is not available on the {} plan", platform, tier),
        ));
    }

    if limits.connection_limit_reached(current_connections) {
        let required = PlanTier::ALL
            .into_iter()
            .find(|t| !PlanLimits::for_tier(*t).connection_limit_reached(current_connections))
            .unwrap_or(PlanTier::Enterprise);
        return Err(upgrade_required(
            tier,
            required,
            format!(
                "connection limit of {} reached",
                limits.max_connections.unwrap_or_default()
            ),
        ));
    }

    Ok(())
}

/// Resolves a user's current subscription into an [`Entitlement`].
pub struct EntitlementService {
    store: Arc<dyn SubscriptionStore>,
}

impl EntitlementService {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    /// A user without a subscription row gets the inactive free entitlement.
    pub async fn for_user(&self, user_id: &Uuid) -> AppResult<Entitlement> {
        let subscription = self.store.current_for_user(user_id).await?;
        let entitlement = evaluate(subscription.as_ref());
        debug!(
            "Evaluated entitlement for user {}: plan={} active={}",
            user_id, entitlement.plan_name, entitlement.has_active_subscription
        );
        Ok(entitlement)
    }

    pub async fn require_plan(&self, user_id: &Uuid, required: PlanTier) -> AppResult<Entitlement> {
        let entitlement = self.for_user(user_id).await?;
        ensure_plan(&entitlement, required, &format!("{} plan required", required))?;
        Ok(entitlement)
    }

    pub async fn require_feature(&self, user_id: &Uuid, feature: Feature) -> AppResult<Entitlement> {
        let entitlement = self.for_user(user_id).await?;
        ensure_feature(&entitlement, feature)?;
        Ok(entitlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitlements::SubscriptionSnapshot;
    use crate::services::test_support::InMemorySubscriptionStore;

    fn entitlement(status: &str, plan: &str) -> Entitlement {
        evaluate(Some(&SubscriptionSnapshot::new(status, plan)))
    }

    #[tokio::test]
    async fn test_missing_subscription_is_free() {
        let service = EntitlementService::new(Arc::new(InMemorySubscriptionStore::default()));
        let entitlement = service.for_user(&Uuid::new_v4()).await.unwrap();
        assert_eq!(entitlement, evaluate(None));
    }

    #[tokio::test]
    async fn test_store_failure_is_propagated() {
        let service = EntitlementService::new(Arc::new(InMemorySubscriptionStore::failing()));
        assert!(matches!(service.for_user(&Uuid::new_v4()).await, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_require_feature_reports_required_plan() {
        let user_id = Uuid::new_v4();
        let store = InMemorySubscriptionStore::default().with_subscription(user_id, "active", "starter");
        let service = EntitlementService::new(Arc::new(store));

        match service.require_feature(&user_id, Feature::AdvancedAi).await {
            Err(AppError::UpgradeRequired(info)) => {
                assert_eq!(info.current_plan, PlanTier::Starter);
                assert_eq!(info.required_plan, PlanTier::Professional);
                assert_eq!(info.reason, "advanced-ai");
            }
            other => panic!("expected upgrade error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_require_plan_passes_for_higher_tier() {
        let user_id = Uuid::new_v4();
        let store = InMemorySubscriptionStore::default().with_subscription(user_id, "active", "enterprise");
        let service = EntitlementService::new(Arc::new(store));

        let entitlement = service.require_plan(&user_id, PlanTier::Starter).await.unwrap();
        assert_eq!(entitlement.plan_name, PlanTier::Enterprise);
    }

    #[test]
    fn test_free_user_can_connect_one_whatsapp() {
        let free = evaluate(None);
        assert!(ensure_can_connect(&free, "whatsapp", 0).is_ok());
        assert!(matches!(
            ensure_can_connect(&free, "whatsapp", 1),
            Err(AppError::UpgradeRequired(ref info)) if info.required_plan == PlanTier::Starter
        ));
    }

    #[test]
    fn test_platform_outside_plan_names_first_tier_allowing_it() {
        let starter = entitlement("active", "starter");
        match ensure_can_connect(&starter, "instagram", 0) {
            Err(AppError::UpgradeRequired(info)) => assert_eq!(info.required_plan, PlanTier::Professional),
            other => panic!("expected upgrade error, got {:?}", other),
        }
        let free = evaluate(None);
        match ensure_can_connect(&free, "slack", 0) {
            Err(AppError::UpgradeRequired(info)) => assert_eq!(info.required_plan, PlanTier::Enterprise),
            other => panic!("expected upgrade error, got {:?}", other),
        }
    }

    #[test]
    fn test_lapsed_paid_plan_gets_free_limits() {
        let lapsed = entitlement("canceled", "professional");
        assert_eq!(effective_tier(&lapsed), PlanTier::Free);
        assert!(ensure_can_connect(&lapsed, "whatsapp", 0).is_ok());
        assert!(matches!(
            ensure_can_connect(&lapsed, "instagram", 0),
            Err(AppError::UpgradeRequired(ref info)) if info.current_plan == PlanTier::Free
        ));
    }

    #[test]
    fn test_enterprise_has_no_connection_cap() {
        let enterprise = entitlement("active", "enterprise");
        assert!(ensure_can_connect(&enterprise, "slack", 500).is_ok());
    }
}
