use actix_web::{dev::ServiceRequest, web, Error, HttpMessage};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use actix_web_httpauth::middleware::HttpAuthentication;
use futures_util::future::LocalBoxFuture;
use log::{debug, error};

use crate::error::AppError;
use crate::services::auth::JwtVerifier;

/// Validates the bearer token and stores the resulting `AuthenticatedUser`
/// in the request extensions.
pub async fn bearer_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let verifier = match req.app_data::<web::Data<JwtVerifier>>() {
        Some(verifier) => verifier.clone(),
        None => {
            error!("JwtVerifier not registered as app data; rejecting {}", req.path());
            let err = AppError::Configuration("Authentication is not configured".to_string());
            return Err((err.into(), req));
        }
    };

    match verifier.authenticate(credentials.token()) {
        Ok(user) => {
            debug!("Authenticated user {} for {} {}", user.user_id, req.method(), req.path());
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(e) => Err((e.into(), req)),
    }
}

type Validator = fn(ServiceRequest, BearerAuth) -> LocalBoxFuture<'static, Result<ServiceRequest, (Error, ServiceRequest)>>;

fn boxed_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> LocalBoxFuture<'static, Result<ServiceRequest, (Error, ServiceRequest)>> {
    Box::pin(bearer_validator(req, credentials))
}

/// Middleware guarding the `/api` scope.
pub fn bearer_auth() -> HttpAuthentication<BearerAuth, Validator> {
    HttpAuthentication::bearer(boxed_validator as Validator)
}
