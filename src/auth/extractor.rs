//! Actix-web extractors for bearer token authentication.

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, web};
use std::future::{Ready, ready};
use tracing::debug;

use super::{Claims, JwtSecret, Role, verify_token};
use crate::error::AppError;

fn bearer_token(req: &HttpRequest) -> Result<&str, AppError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Malformed Authorization header".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AppError::Unauthorized("Malformed Authorization header".to_string()))?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AppError::Unauthorized(
            "Expected a Bearer token".to_string(),
        ));
    }
    Ok(token.trim())
}

fn authenticate(req: &HttpRequest) -> Result<Claims, AppError> {
    let secret = req
        .app_data::<web::Data<JwtSecret>>()
        .ok_or_else(|| AppError::Unauthorized("Authentication is not configured".to_string()))?;
    let claims = verify_token(bearer_token(req)?, secret)?;
    debug!(user_id = claims.user_id, role = claims.role.as_str(), "Authenticated request");
    Ok(claims)
}

/// Any caller holding a valid token.
///
/// ```ignore
/// async fn handler(user: AuthUser) -> impl Responder { ... }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: Claims,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map(|claims| AuthUser { claims }))
    }
}

/// A caller whose token carries the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub claims: Claims,
}

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = authenticate(req).and_then(|claims| {
            if claims.role == Role::Admin {
                Ok(AdminUser { claims })
            } else {
                Err(AppError::Forbidden("Admin access required".to_string()))
            }
        });
        ready(result)
    }
}
