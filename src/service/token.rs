//! JWT issuing and verification for the cookie auth flow.
//!
//! Decode failures are classifications, never errors that can take down a
//! request: callers translate [`TokenRejection`] into "not authenticated".

use crate::error::app_error::AppError;
use crate::models::session::{Claims, TokenKind};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

/// Why a presented token was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// Signature checks out but the token is past its expiry.
    Expired,
    /// Malformed, tampered with, or of the wrong kind.
    Invalid,
}

pub fn issue_token(secret: &str, user_id: Uuid, kind: TokenKind, ttl: Duration) -> Result<String, AppError> {
    let claims = Claims {
        sub: user_id,
        kind,
        exp: (Utc::now() + ttl).timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).map_err(|e| AppError::TokenCreation {
        message: format!("Failed to sign token: {}", e),
    })
}

pub fn verify_token(secret: &str, token: &str, expected: TokenKind) -> Result<Claims, TokenRejection> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    match decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation) {
        Ok(data) if data.claims.kind == expected => Ok(data.claims),
        Ok(_) => Err(TokenRejection::Invalid),
        Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => Err(TokenRejection::Expired),
        Err(_) => Err(TokenRejection::Invalid),
    }
}

/// Decode a token without enforcing expiry and report its subject if the
/// token is past its expiry. Used to force-logout accounts whose refresh
/// token has lapsed; anything undecodable yields `None`.
pub fn expired_token_user(secret: &str, token: &str) -> Option<Uuid> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    validation.validate_exp = false;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation).ok()?;
    (data.claims.exp < Utc::now().timestamp()).then_some(data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn round_trip_access_token() {
        let user_id = Uuid::new_v4();
        let token = issue_token(SECRET, user_id, TokenKind::Access, Duration::minutes(10)).unwrap();
        let claims = verify_token(SECRET, &token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn refresh_token_is_not_accepted_as_access() {
        let token = issue_token(SECRET, Uuid::new_v4(), TokenKind::Refresh, Duration::days(7)).unwrap();
        assert_eq!(verify_token(SECRET, &token, TokenKind::Access), Err(TokenRejection::Invalid));
    }

    #[test]
    fn expired_token_is_classified_not_crashed() {
        let token = issue_token(SECRET, Uuid::new_v4(), TokenKind::Access, Duration::minutes(-5)).unwrap();
        assert_eq!(verify_token(SECRET, &token, TokenKind::Access), Err(TokenRejection::Expired));
    }

    #[test]
    fn garbage_token_is_invalid() {
        assert_eq!(verify_token(SECRET, "not-a-jwt", TokenKind::Access), Err(TokenRejection::Invalid));
        assert_eq!(verify_token(SECRET, "", TokenKind::Refresh), Err(TokenRejection::Invalid));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let token = issue_token("other-secret", Uuid::new_v4(), TokenKind::Access, Duration::minutes(10)).unwrap();
        assert_eq!(verify_token(SECRET, &token, TokenKind::Access), Err(TokenRejection::Invalid));
    }

    #[test]
    fn expired_refresh_reveals_its_user_for_forced_logout() {
        let user_id = Uuid::new_v4();
        let token = issue_token(SECRET, user_id, TokenKind::Refresh, Duration::minutes(-1)).unwrap();
        assert_eq!(expired_token_user(SECRET, &token), Some(user_id));
    }

    #[test]
    fn live_refresh_is_not_reported_expired() {
        let token = issue_token(SECRET, Uuid::new_v4(), TokenKind::Refresh, Duration::days(7)).unwrap();
        assert_eq!(expired_token_user(SECRET, &token), None);
    }

    #[test]
    fn undecodable_refresh_is_ignored_by_the_sweep() {
        assert_eq!(expired_token_user(SECRET, "garbage"), None);
    }
}
