use actix_web::{web, HttpResponse};
use serde_json::json;
use std::sync::Arc;

use crate::entitlements::Feature;
use crate::error::AppError;
use crate::models::AuthenticatedUser;
use crate::services::classification_service::ClassifyRequest;
use crate::services::{ClassificationService, EntitlementService};

/// Classifies a customer message with the generative model.
pub async fn classify_message(
    user: AuthenticatedUser,
    body: web::Json<ClassifyRequest>,
    entitlements: web::Data<Arc<EntitlementService>>,
    classifier: web::Data<Arc<ClassificationService>>,
) -> Result<HttpResponse, AppError> {
    entitlements.require_feature(&user.user_id, Feature::AdvancedAi).await?;
    let result = classifier.classify(&user.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "category": result.category,
        "sentiment": result.sentiment,
    })))
}
