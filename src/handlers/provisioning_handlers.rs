use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::AuthenticatedUser;
use crate::services::provisioning_service::{ProvisionTestUserRequest, ProvisionedTestUser};
use crate::services::ProvisioningService;

#[derive(Serialize)]
struct ProvisionResponse {
    success: bool,
    #[serde(flatten)]
    user: ProvisionedTestUser,
}

/// Creates a test user with an active subscription. Admin only.
pub async fn create_test_user(
    caller: AuthenticatedUser,
    body: web::Json<ProvisionTestUserRequest>,
    provisioning: web::Data<Arc<ProvisioningService>>,
) -> Result<HttpResponse, AppError> {
    let user = provisioning.provision(&caller, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ProvisionResponse { success: true, user }))
}
