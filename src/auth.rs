use crate::config::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::session::TokenKind;
use crate::service::session::SessionGuard;
use crate::service::token;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
pub const SESSION_COOKIE: &str = "session_key";

#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub email: String,
    pub profile_pk: Uuid,
    pub profile_id: String,
    pub full_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl CurrentUser {
    pub fn is_staff_or_superuser(&self) -> bool {
        self.is_staff || self.is_superuser
    }
}

/// Token from an `Authorization` header, accepting both common schemes.
pub(crate) fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("JWT "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// If the request carries a refresh cookie that is past its expiry, log the
/// account out server-side. Best-effort: the request that noticed the expiry
/// proceeds to fail as unauthenticated regardless.
async fn sweep_expired_refresh(req: &Request<'_>, repo: &PostgresRepository, secret: &str) {
    let Some(refresh) = req.cookies().get(REFRESH_COOKIE) else {
        return;
    };
    if let Some(user_id) = token::expired_token_user(secret, refresh.value()) {
        SessionGuard::new(repo).force_logout(&user_id).await;
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let Some(pool) = req.rocket().state::<PgPool>() else {
            return Outcome::Error((Status::InternalServerError, AppError::Unauthorized));
        };
        let Some(config) = req.rocket().state::<Config>() else {
            return Outcome::Error((Status::InternalServerError, AppError::Unauthorized));
        };
        let repo = PostgresRepository { pool: pool.clone() };
        let secret = &config.auth.secret;

        let access = req
            .cookies()
            .get(ACCESS_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .or_else(|| req.headers().get_one("Authorization").and_then(bearer_token).map(str::to_string));

        let Some(access) = access else {
            sweep_expired_refresh(req, &repo, secret).await;
            return Outcome::Error((Status::Unauthorized, AppError::Unauthorized));
        };

        // Expired and malformed tokens both read as "not authenticated";
        // neither may take the request down.
        let claims = match token::verify_token(secret, &access, TokenKind::Access) {
            Ok(claims) => claims,
            Err(_) => {
                sweep_expired_refresh(req, &repo, secret).await;
                return Outcome::Error((Status::Unauthorized, AppError::Unauthorized));
            }
        };

        let user = match repo.get_user_by_id(&claims.sub).await {
            Ok(Some(user)) if user.is_active => user,
            Ok(_) => return Outcome::Error((Status::Unauthorized, AppError::Unauthorized)),
            Err(err) => return Outcome::Error((Status::InternalServerError, err)),
        };

        let profile = match repo.get_profile_by_user_id(&user.id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => return Outcome::Error((Status::Unauthorized, AppError::Unauthorized)),
            Err(err) => return Outcome::Error((Status::InternalServerError, err)),
        };

        // Single-session check: the presented key must match the stored one.
        // A mismatch denies the request but leaves the session itself alone.
        let presented = req.cookies().get_private(SESSION_COOKIE).map(|cookie| cookie.value().to_string());
        if let Err(err) = SessionGuard::new(&repo).authorize(&user.id, presented.as_deref()).await {
            let status = Status::from(&err);
            return Outcome::Error((status, err));
        }

        let current_user = CurrentUser {
            user_id: user.id,
            email: user.email,
            profile_pk: profile.id,
            profile_id: profile.profile_id,
            full_name: profile.full_name,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        };
        req.local_cache(|| Some(current_user.clone()));

        Outcome::Success(current_user)
    }
}

/// Staff-or-superuser gate layered on top of [`CurrentUser`].
#[derive(Debug, Clone)]
pub struct StaffUser(pub CurrentUser);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for StaffUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        match req.guard::<CurrentUser>().await {
            Outcome::Success(user) if user.is_staff_or_superuser() => Outcome::Success(StaffUser(user)),
            Outcome::Success(_) => Outcome::Error((Status::Forbidden, AppError::PermissionDenied)),
            Outcome::Error(err) => Outcome::Error(err),
            Outcome::Forward(status) => Outcome::Forward(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::bearer_token;

    #[test]
    fn bearer_scheme_is_parsed() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
    }

    #[test]
    fn jwt_scheme_is_parsed() {
        assert_eq!(bearer_token("JWT abc.def.ghi"), Some("abc.def.ghi"));
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("abc.def.ghi"), None);
    }

    #[test]
    fn empty_token_is_rejected() {
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer   "), None);
    }
}
