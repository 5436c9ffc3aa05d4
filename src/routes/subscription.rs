use crate::auth::StaffUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::course::CourseOptionResponse;
use crate::models::pagination::{PaginatedResponse, PaginationParams};
use crate::models::subscription::{SubscriptionActivationRequest, SubscriptionRequest, SubscriptionResponse};
use crate::models::user::ProfileOption;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, routes};
use sqlx::PgPool;
use uuid::Uuid;

#[rocket::get("/?<page>&<limit>")]
pub async fn list_subscriptions(
    pool: &State<PgPool>,
    _staff: StaffUser,
    page: Option<i64>,
    limit: Option<i64>,
) -> Result<Json<PaginatedResponse<SubscriptionResponse>>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());

    let pagination = if page.is_some() || limit.is_some() {
        Some(PaginationParams { page, limit })
    } else {
        None
    };

    let (subscriptions, total) = repo.list_subscriptions(pagination.as_ref()).await?;
    let responses: Vec<SubscriptionResponse> = subscriptions.iter().map(SubscriptionResponse::from).collect();

    let paginated = if let Some(params) = pagination {
        let effective_page = params.page.unwrap_or(1);
        let effective_limit = params.effective_limit().unwrap_or(PaginationParams::DEFAULT_LIMIT);
        PaginatedResponse::new(responses, effective_page, effective_limit, total)
    } else {
        PaginatedResponse::new(responses, 1, total, total)
    };

    Ok(Json(paginated))
}

/// Search by subscriber name, email, or public profile id.
#[rocket::get("/search?<value>")]
pub async fn search_subscriptions(pool: &State<PgPool>, _staff: StaffUser, value: Option<String>) -> Result<Json<Vec<SubscriptionResponse>>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());

    let value = value.unwrap_or_default();
    let subscriptions = if value.trim().is_empty() {
        repo.list_subscriptions(None).await?.0
    } else {
        repo.search_subscriptions(value.trim()).await?
    };

    Ok(Json(subscriptions.iter().map(SubscriptionResponse::from).collect()))
}

#[rocket::post("/", data = "<payload>")]
pub async fn create_subscription(pool: &State<PgPool>, _staff: StaffUser, payload: Json<SubscriptionRequest>) -> Result<(Status, Json<SubscriptionResponse>), AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let subscription = repo
        .create_subscription(&payload.profile_id, &payload.course_id, payload.is_active.unwrap_or(true))
        .await?;

    Ok((Status::Created, Json(SubscriptionResponse::from(&subscription))))
}

#[rocket::put("/<id>/activation", data = "<payload>")]
pub async fn update_subscription_activation(
    pool: &State<PgPool>,
    _staff: StaffUser,
    id: &str,
    payload: Json<SubscriptionActivationRequest>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(id)?;
    let subscription = repo.set_subscription_active(&uuid, payload.is_active).await?;

    Ok(Json(SubscriptionResponse::from(&subscription)))
}

#[rocket::delete("/<id>")]
pub async fn delete_subscription(pool: &State<PgPool>, _staff: StaffUser, id: &str) -> Result<Status, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(id)?;
    repo.delete_subscription(&uuid).await?;

    Ok(Status::NoContent)
}

/// Profiles that can be attached to a new subscription.
#[rocket::get("/options/profiles")]
pub async fn subscription_profile_options(pool: &State<PgPool>, _staff: StaffUser) -> Result<Json<Vec<ProfileOption>>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let profiles = repo.subscription_profile_options().await?;

    Ok(Json(profiles))
}

/// Courses that can be attached to a new subscription.
#[rocket::get("/options/courses")]
pub async fn subscription_course_options(pool: &State<PgPool>, _staff: StaffUser) -> Result<Json<Vec<CourseOptionResponse>>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let (courses, _) = repo.list_courses(None).await?;

    Ok(Json(courses.iter().map(CourseOptionResponse::from).collect()))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        list_subscriptions,
        search_subscriptions,
        create_subscription,
        update_subscription_activation,
        delete_subscription,
        subscription_profile_options,
        subscription_course_options
    ]
}
