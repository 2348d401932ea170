use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::entitlements::{has_access, Entitlement, Feature, PlanLimits, PlanTier};
use crate::error::AppError;
use crate::models::AuthenticatedUser;
use crate::services::EntitlementService;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntitlementResponse {
    success: bool,
    #[serde(flatten)]
    entitlement: Entitlement,
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub plan: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccessResponse {
    success: bool,
    plan: PlanTier,
    required_plan: PlanTier,
    has_access: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanInfo {
    name: PlanTier,
    rank: u8,
    limits: PlanLimits,
    features: Vec<Feature>,
}

/// Current user's entitlement.
pub async fn get_entitlements(
    user: AuthenticatedUser,
    entitlements: web::Data<Arc<EntitlementService>>,
) -> Result<HttpResponse, AppError> {
    let entitlement = entitlements.for_user(&user.user_id).await?;
    let features = entitlement.features();

    Ok(HttpResponse::Ok().json(EntitlementResponse {
        success: true,
        entitlement,
        features,
    }))
}

/// Whether the current user may use something that needs `plan`.
pub async fn check_access(
    user: AuthenticatedUser,
    query: web::Query<AccessQuery>,
    entitlements: web::Data<Arc<EntitlementService>>,
) -> Result<HttpResponse, AppError> {
    let required_plan = query
        .plan
        .as_deref()
        .map(PlanTier::from_plan_name)
        .unwrap_or_default();
    let entitlement = entitlements.for_user(&user.user_id).await?;

    Ok(HttpResponse::Ok().json(AccessResponse {
        success: true,
        plan: entitlement.plan_name,
        required_plan,
        has_access: has_access(required_plan, &entitlement),
    }))
}

pub async fn list_plans() -> Result<HttpResponse, AppError> {
    let plans: Vec<PlanInfo> = PlanTier::ALL
        .into_iter()
        .map(|tier| PlanInfo {
            name: tier,
            rank: tier.rank(),
            limits: PlanLimits::for_tier(tier),
            features: Feature::ALL
                .into_iter()
                .filter(|f| f.required_tier() <= tier)
                .collect(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "plans": plans })))
}
