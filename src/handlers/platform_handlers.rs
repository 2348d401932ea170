use actix_web::{web, HttpResponse};
use serde_json::json;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::AuthenticatedUser;
use crate::services::platform_service::{CreateConnectionRequest, MessageQuery};
use crate::services::PlatformService;

pub async fn list_connections(
    user: AuthenticatedUser,
    platform: web::Data<Arc<PlatformService>>,
) -> Result<HttpResponse, AppError> {
    let overview = platform.list_connections(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "connections": overview.connections,
        "used": overview.used,
        "limit": overview.limit,
    })))
}

/// Starts linking a new platform account; 403 when the plan does not allow it.
pub async fn create_connection(
    user: AuthenticatedUser,
    body: web::Json<CreateConnectionRequest>,
    platform: web::Data<Arc<PlatformService>>,
) -> Result<HttpResponse, AppError> {
    let connection = platform
        .create_connection(&user.user_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "connection": connection })))
}

pub async fn list_messages(
    user: AuthenticatedUser,
    query: web::Query<MessageQuery>,
    platform: web::Data<Arc<PlatformService>>,
) -> Result<HttpResponse, AppError> {
    let messages = platform.list_messages(&user.user_id, &query).await?;
    let (limit, offset) = query.page();
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "messages": messages,
        "limit": limit,
        "offset": offset,
    })))
}

pub async fn get_usage(
    user: AuthenticatedUser,
    platform: web::Data<Arc<PlatformService>>,
) -> Result<HttpResponse, AppError> {
    let usage = platform.usage(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "usage": usage })))
}
