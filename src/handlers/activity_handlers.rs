use actix_web::{http::header, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::AuthenticatedUser;
use crate::services::activity_service::{ActivityContext, LogActivityRequest};
use crate::services::ActivityService;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

fn parse_addr(raw: &str) -> Option<IpAddr> {
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}

/// Client address. Proxy headers are only consulted when trusted; otherwise
/// the socket peer is used.
fn client_ip(req: &HttpRequest, trust_proxy_headers: bool) -> Option<IpAddr> {
    if trust_proxy_headers {
        let info = req.connection_info();
        if let Some(ip) = info.realip_remote_addr().and_then(parse_addr) {
            return Some(ip);
        }
    }
    req.peer_addr().map(|addr| addr.ip())
}

fn request_context(req: &HttpRequest, trust_proxy_headers: bool) -> ActivityContext {
    let mut context = ActivityContext::default();
    if let Some(ip) = client_ip(req, trust_proxy_headers) {
        context = context.with_ip_addr(ip);
    }
    if let Some(agent) = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
    {
        context = context.with_user_agent(agent);
    }
    context
}

pub async fn log_activity(
    req: HttpRequest,
    user: AuthenticatedUser,
    body: web::Json<LogActivityRequest>,
    activity: web::Data<Arc<ActivityService>>,
) -> Result<HttpResponse, AppError> {
    let context = request_context(&req, activity.trusts_proxy_headers());
    let entry = activity.log(user.user_id, body.into_inner(), context).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "id": entry.id })))
}

pub async fn list_activity(
    user: AuthenticatedUser,
    query: web::Query<ActivityQuery>,
    activity: web::Data<Arc<ActivityService>>,
) -> Result<HttpResponse, AppError> {
    let entries = activity.recent(&user.user_id, query.limit).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "activity": entries })))
}
