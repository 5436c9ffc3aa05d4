use crate::auth::{ACCESS_COOKIE, CurrentUser, REFRESH_COOKIE, SESSION_COOKIE};
use crate::config::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::middleware::{ClientIp, UserAgent};
use crate::models::MessageResponse;
use crate::models::session::TokenKind;
use crate::models::user::{AuthenticatedUser, CheckAuthResponse, Device, LoginRequest, LoginResponse, ProfileResponse, RegisterRequest, UserResponse};
use crate::service::session::SessionGuard;
use crate::service::token::{self, TokenRejection};
use chrono::{Duration, Utc};
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::serde::json::Json;
use rocket::{State, routes};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;
use zxcvbn::{Score, zxcvbn};

fn token_cookie(name: &'static str, value: String, max_age_minutes: i64) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .max_age(rocket::time::Duration::minutes(max_age_minutes))
        .build()
}

fn clear_auth_cookies(cookies: &CookieJar<'_>) {
    cookies.remove(Cookie::build(ACCESS_COOKIE).path("/").build());
    cookies.remove(Cookie::build(REFRESH_COOKIE).path("/").build());
    cookies.remove_private(Cookie::build(SESSION_COOKIE).path("/").build());
}

/// Best-effort subject extraction: a valid token yields its subject, an
/// expired one still does, garbage yields nothing.
fn token_subject(secret: &str, token: &str, kind: TokenKind) -> Option<Uuid> {
    match token::verify_token(secret, token, kind) {
        Ok(claims) => Some(claims.sub),
        Err(TokenRejection::Expired) => token::expired_token_user(secret, token),
        Err(TokenRejection::Invalid) => None,
    }
}

#[rocket::post("/register", data = "<payload>")]
pub async fn register(pool: &State<PgPool>, payload: Json<RegisterRequest>) -> Result<(Status, Json<MessageResponse>), AppError> {
    payload.validate()?;

    let strength = zxcvbn(&payload.password, &[payload.email.as_str()]);
    if strength.score() < Score::Three {
        return Err(AppError::WeakPassword);
    }

    let repo = PostgresRepository::new(pool.inner().clone());
    if repo.get_user_by_email(&payload.email).await?.is_some() {
        return Err(AppError::UserAlreadyExists(payload.email.clone()));
    }

    repo.create_user(&payload.email, &payload.full_name, &payload.password).await?;

    Ok((Status::Created, Json(MessageResponse::new("User created successfully"))))
}

#[rocket::post("/login", data = "<payload>")]
pub async fn login(
    pool: &State<PgPool>,
    config: &State<Config>,
    cookies: &CookieJar<'_>,
    client_ip: ClientIp,
    user_agent: UserAgent,
    payload: Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());

    let Some(user) = repo.get_user_by_email(&payload.email).await? else {
        PostgresRepository::dummy_verify(&payload.password);
        return Err(AppError::InvalidCredentials);
    };
    repo.verify_password(&user, &payload.password).await?;
    if !user.is_active {
        return Err(AppError::InvalidCredentials);
    }

    let device = Device {
        ip: client_ip.0.unwrap_or_else(|| "unknown".to_string()),
        user_agent: user_agent.0.unwrap_or_else(|| "Unknown Device".to_string()),
        last_login: Utc::now(),
    };
    // Rejects with SessionInUse while another session holds the account.
    let session_key = SessionGuard::new(&repo).login(&user.id, device).await?;

    let auth = &config.auth;
    let access = token::issue_token(&auth.secret, user.id, TokenKind::Access, Duration::minutes(auth.access_token_minutes))?;
    let refresh = token::issue_token(&auth.secret, user.id, TokenKind::Refresh, Duration::days(auth.refresh_token_days))?;

    cookies.add(token_cookie(ACCESS_COOKIE, access, auth.access_token_minutes));
    cookies.add(token_cookie(REFRESH_COOKIE, refresh, auth.refresh_token_days * 24 * 60));
    cookies.add_private(
        Cookie::build((SESSION_COOKIE, session_key))
            .http_only(true)
            .secure(true)
            .same_site(SameSite::None)
            .path("/")
            .build(),
    );

    Ok(Json(LoginResponse {
        message: "Logged in successfully".to_string(),
        user: UserResponse::from(&user),
    }))
}

#[rocket::post("/refresh")]
pub async fn refresh(pool: &State<PgPool>, config: &State<Config>, cookies: &CookieJar<'_>) -> Result<Json<MessageResponse>, AppError> {
    let Some(refresh_token) = cookies.get(REFRESH_COOKIE).map(|cookie| cookie.value().to_string()) else {
        return Err(AppError::Unauthorized);
    };

    let auth = &config.auth;
    match token::verify_token(&auth.secret, &refresh_token, TokenKind::Refresh) {
        Ok(claims) => {
            let access = token::issue_token(&auth.secret, claims.sub, TokenKind::Access, Duration::minutes(auth.access_token_minutes))?;
            cookies.add(token_cookie(ACCESS_COOKIE, access, auth.access_token_minutes));
            Ok(Json(MessageResponse::new("Access token refreshed")))
        }
        Err(rejection) => {
            if rejection == TokenRejection::Expired
                && let Some(user_id) = token::expired_token_user(&auth.secret, &refresh_token)
            {
                let repo = PostgresRepository::new(pool.inner().clone());
                SessionGuard::new(&repo).force_logout(&user_id).await;
            }
            clear_auth_cookies(cookies);
            Err(AppError::BadRequest("Refresh token expired or invalid, please login again".to_string()))
        }
    }
}

/// Idempotent: logging out without a live session (or without usable
/// cookies) still succeeds and clears whatever cookies are present.
#[rocket::post("/logout")]
pub async fn logout(pool: &State<PgPool>, config: &State<Config>, cookies: &CookieJar<'_>) -> Result<Json<MessageResponse>, AppError> {
    let secret = &config.auth.secret;
    let user_id = cookies
        .get(REFRESH_COOKIE)
        .and_then(|cookie| token_subject(secret, cookie.value(), TokenKind::Refresh))
        .or_else(|| cookies.get(ACCESS_COOKIE).and_then(|cookie| token_subject(secret, cookie.value(), TokenKind::Access)));

    if let Some(user_id) = user_id {
        let repo = PostgresRepository::new(pool.inner().clone());
        SessionGuard::new(&repo).logout(&user_id).await?;
    }
    clear_auth_cookies(cookies);

    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// Session probe for the frontend. An unauthenticated probe still triggers
/// the expired-refresh sweep inside the `CurrentUser` guard.
#[rocket::get("/check")]
pub async fn check_auth(pool: &State<PgPool>, user: Option<CurrentUser>) -> Result<(Status, Json<CheckAuthResponse>), AppError> {
    let Some(user) = user else {
        return Ok((
            Status::Unauthorized,
            Json(CheckAuthResponse {
                authenticated: false,
                user: None,
            }),
        ));
    };

    let repo = PostgresRepository::new(pool.inner().clone());
    let profile = repo.get_profile_by_user_id(&user.user_id).await?.ok_or(AppError::UserNotFound)?;

    Ok((
        Status::Ok,
        Json(CheckAuthResponse {
            authenticated: true,
            user: Some(AuthenticatedUser {
                id: user.user_id,
                email: user.email,
                is_staff: user.is_staff,
                is_superuser: user.is_superuser,
                profile: ProfileResponse::from(&profile),
            }),
        }),
    ))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![register, login, refresh, logout, check_auth]
}
