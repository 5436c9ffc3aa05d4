use crate::auth::{CurrentUser, StaffUser};
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::MessageResponse;
use crate::models::pagination::{PaginatedResponse, PaginationParams};
use crate::models::user::{AdminResetPasswordRequest, AdminUserResponse, PermissionsUpdateRequest, ProfileResponse, ProfileUpdateRequest};
use crate::service::session::SessionGuard;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, routes};
use sqlx::PgPool;
use validator::Validate;

#[rocket::get("/me")]
pub async fn get_own_profile(pool: &State<PgPool>, current_user: CurrentUser) -> Result<Json<ProfileResponse>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let profile = repo.get_profile_by_user_id(&current_user.user_id).await?.ok_or(AppError::UserNotFound)?;

    Ok(Json(ProfileResponse::from(&profile)))
}

#[rocket::put("/me", data = "<payload>")]
pub async fn update_own_profile(pool: &State<PgPool>, current_user: CurrentUser, payload: Json<ProfileUpdateRequest>) -> Result<Json<ProfileResponse>, AppError> {
    payload.validate()?;

    let repo = PostgresRepository::new(pool.inner().clone());
    let profile = repo
        .update_profile(&current_user.user_id, &payload.full_name, payload.bio.as_deref())
        .await?;

    Ok(Json(ProfileResponse::from(&profile)))
}

/// Non-private accounts, for the staff dashboard.
#[rocket::get("/?<page>&<limit>")]
pub async fn list_users(
    pool: &State<PgPool>,
    _staff: StaffUser,
    page: Option<i64>,
    limit: Option<i64>,
) -> Result<Json<PaginatedResponse<AdminUserResponse>>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());

    let pagination = if page.is_some() || limit.is_some() {
        Some(PaginationParams { page, limit })
    } else {
        None
    };

    let (users, total) = repo.list_users(pagination.as_ref()).await?;
    let responses: Vec<AdminUserResponse> = users.iter().map(AdminUserResponse::from).collect();

    let paginated = if let Some(params) = pagination {
        let effective_page = params.page.unwrap_or(1);
        let effective_limit = params.effective_limit().unwrap_or(PaginationParams::DEFAULT_LIMIT);
        PaginatedResponse::new(responses, effective_page, effective_limit, total)
    } else {
        PaginatedResponse::new(responses, 1, total, total)
    };

    Ok(Json(paginated))
}

#[rocket::get("/search?<value>")]
pub async fn search_users(pool: &State<PgPool>, _staff: StaffUser, value: Option<String>) -> Result<Json<Vec<AdminUserResponse>>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());

    let value = value.unwrap_or_default();
    let users = if value.trim().is_empty() {
        repo.list_users(None).await?.0
    } else {
        repo.search_users(value.trim()).await?
    };

    Ok(Json(users.iter().map(AdminUserResponse::from).collect()))
}

#[rocket::put("/<profile_id>/permissions", data = "<payload>")]
pub async fn update_permissions(
    pool: &State<PgPool>,
    _staff: StaffUser,
    profile_id: &str,
    payload: Json<PermissionsUpdateRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    repo.update_permissions(profile_id, payload.is_staff, payload.is_superuser).await?;

    Ok(Json(MessageResponse::new("Permissions updated successfully")))
}

/// Staff password reset. Plain staff cannot reset a superuser's password.
#[rocket::post("/<profile_id>/reset-password", data = "<payload>")]
pub async fn admin_reset_password(
    pool: &State<PgPool>,
    staff: StaffUser,
    profile_id: &str,
    payload: Json<AdminResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;

    let repo = PostgresRepository::new(pool.inner().clone());
    let target = repo.get_user_by_profile_id(profile_id).await?.ok_or(AppError::UserNotFound)?;

    if staff.0.is_staff && !staff.0.is_superuser && target.is_superuser {
        return Err(AppError::PermissionDenied);
    }

    repo.admin_reset_password(&target.id, &payload.password).await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

#[rocket::delete("/<profile_id>")]
pub async fn delete_user(pool: &State<PgPool>, _staff: StaffUser, profile_id: &str) -> Result<Status, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    repo.delete_user_by_profile_id(profile_id).await?;

    Ok(Status::NoContent)
}

/// Server-side logout of another account.
#[rocket::post("/<profile_id>/logout")]
pub async fn logout_user(pool: &State<PgPool>, _staff: StaffUser, profile_id: &str) -> Result<Status, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let target = repo.get_user_by_profile_id(profile_id).await?.ok_or(AppError::UserNotFound)?;
    SessionGuard::new(&repo).logout(&target.id).await?;

    Ok(Status::NoContent)
}

#[rocket::delete("/non-admins")]
pub async fn delete_non_admin_users(pool: &State<PgPool>, _staff: StaffUser) -> Result<Json<MessageResponse>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let deleted = repo.delete_non_admin_users().await?;

    Ok(Json(MessageResponse::new(format!("{} user(s) deleted", deleted))))
}

#[rocket::post("/non-admins/deactivate")]
pub async fn deactivate_non_admin_profiles(pool: &State<PgPool>, _staff: StaffUser) -> Result<Json<MessageResponse>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let updated = repo.deactivate_non_admin_profiles().await?;

    Ok(Json(MessageResponse::new(format!("{} profile(s) deactivated", updated))))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        get_own_profile,
        update_own_profile,
        list_users,
        search_users,
        update_permissions,
        admin_reset_password,
        delete_user,
        logout_user,
        delete_non_admin_users,
        deactivate_non_admin_profiles
    ]
}
