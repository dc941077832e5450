//! Who the bearer token belongs to.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthUser;

/// Identity carried by the caller's token.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user_id: i32,
    /// `admin` or `user`.
    pub role: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&AuthUser> for SessionResponse {
    fn from(user: &AuthUser) -> Self {
        Self {
            user_id: user.claims.user_id,
            role: user.claims.role.as_str().to_string(),
            expires_at: i64::try_from(user.claims.exp)
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Token identity", body = SessionResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn current_session(user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(SessionResponse::from(&user))
}

/// Configure session routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/auth/me").route(web::get().to(current_session)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Claims, Role};

    #[test]
    fn test_session_reports_claims() {
        let user = AuthUser {
            claims: Claims {
                user_id: 7,
                role: Role::User,
                exp: 1_700_000_000,
            },
        };
        let session = SessionResponse::from(&user);
        assert_eq!(session.user_id, 7);
        assert_eq!(session.role, "user");
        assert_eq!(session.expires_at.unwrap().timestamp(), 1_700_000_000);
    }
}
