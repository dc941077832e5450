//! JWT bearer authentication.
//!
//! Tokens are HS256-signed with the configured secret and carry the caller's
//! user id, role and expiry. Nothing here touches the database.

mod extractor;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub use extractor::{AdminUser, AuthUser};

/// Lifetime of issued tokens.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Caller role carried in the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub role: Role,
    /// Expiry, seconds since the epoch.
    pub exp: usize,
}

/// Signing secret shared through app data.
///
/// `Debug` never prints the secret.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    pub fn new(secret: SecretString) -> Self {
        Self(secret)
    }

    fn bytes(&self) -> &[u8] {
        self.0.expose_secret().as_bytes()
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED])")
    }
}

/// Mint a token valid for [`TOKEN_TTL_HOURS`].
pub fn issue_token(user_id: i32, role: Role, secret: &JwtSecret) -> AppResult<String> {
    let exp = Utc::now() + Duration::hours(TOKEN_TTL_HOURS);
    let claims = Claims {
        user_id,
        role,
        exp: exp.timestamp() as usize,
    };

    let key = EncodingKey::from_secret(secret.bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AppError::InvalidInput(format!("Failed to create token: {}", e)))
}

/// Check signature and expiry and return the claims.
pub fn verify_token(token: &str, secret: &JwtSecret) -> AppResult<Claims> {
    let key = DecodingKey::from_secret(secret.bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp"]);

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> JwtSecret {
        JwtSecret::new(SecretString::from(s.to_string()))
    }

    #[test]
    fn test_issue_and_verify() {
        let key = secret("test-secret");
        let token = issue_token(42, Role::Admin, &key).unwrap();
        let claims = verify_token(&token, &key).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp as i64 > Utc::now().timestamp());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_token(1, Role::User, &secret("one")).unwrap();
        assert!(matches!(
            verify_token(&token, &secret("two")),
            Err(AppError::Unauthorized(_))
        ));
        assert!(verify_token("not.a.jwt", &secret("one")).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let key = secret("test-secret");
        let claims = Claims {
            user_id: 1,
            role: Role::Admin,
            exp: (Utc::now() - Duration::hours(2)).timestamp() as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(verify_token(&token, &key).is_err());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse(" Admin "), Some(Role::Admin));
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        assert_eq!(format!("{:?}", secret("hunter2")), "JwtSecret([REDACTED])");
    }
}
