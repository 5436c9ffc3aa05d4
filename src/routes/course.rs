use crate::auth::{CurrentUser, StaffUser};
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::course::{Course, CourseAdminResponse, CourseOptionResponse, CourseRequest, CourseResponse};
use crate::models::pagination::{PaginatedResponse, PaginationParams};
use crate::models::subscription::SubscriptionResponse;
use crate::models::video::VideoResponse;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, routes};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

async fn learner_course_response(repo: &PostgresRepository, course: &Course, viewer: &Uuid) -> Result<CourseResponse, AppError> {
    let videos = repo.list_course_videos_with_meta(&course.id, Some(viewer), true).await?;

    Ok(CourseResponse {
        id: course.id,
        title: course.title.clone(),
        description: course.description.clone(),
        created_at: course.created_at,
        updated_at: course.updated_at,
        videos: videos.iter().map(VideoResponse::from).collect(),
    })
}

async fn admin_course_response(repo: &PostgresRepository, course: &Course) -> Result<CourseAdminResponse, AppError> {
    let videos = repo.list_course_videos_with_meta(&course.id, None, false).await?;
    let subscribers = repo.course_subscriptions(&course.id).await?;

    Ok(CourseAdminResponse {
        id: course.id,
        title: course.title.clone(),
        description: course.description.clone(),
        is_active: course.is_active,
        created_at: course.created_at,
        updated_at: course.updated_at,
        videos: videos.iter().map(VideoResponse::from).collect(),
        subscribers: subscribers.iter().map(SubscriptionResponse::from).collect(),
    })
}

/// Active courses the caller actively subscribes to, with their active
/// videos in priority order.
#[rocket::get("/")]
pub async fn list_subscribed_courses(pool: &State<PgPool>, current_user: CurrentUser) -> Result<Json<Vec<CourseResponse>>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let courses = repo.list_subscribed_courses(&current_user.profile_pk).await?;

    let mut responses = Vec::with_capacity(courses.len());
    for course in &courses {
        responses.push(learner_course_response(&repo, course, &current_user.profile_pk).await?);
    }

    Ok(Json(responses))
}

#[rocket::get("/options")]
pub async fn list_course_options(pool: &State<PgPool>, current_user: CurrentUser) -> Result<Json<Vec<CourseOptionResponse>>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let courses = repo.list_subscribed_courses(&current_user.profile_pk).await?;

    Ok(Json(courses.iter().map(CourseOptionResponse::from).collect()))
}

#[rocket::get("/admin?<page>&<limit>")]
pub async fn list_courses_admin(
    pool: &State<PgPool>,
    _staff: StaffUser,
    page: Option<i64>,
    limit: Option<i64>,
) -> Result<Json<PaginatedResponse<CourseAdminResponse>>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());

    let pagination = if page.is_some() || limit.is_some() {
        Some(PaginationParams { page, limit })
    } else {
        None
    };

    let (courses, total) = repo.list_courses(pagination.as_ref()).await?;
    let mut responses = Vec::with_capacity(courses.len());
    for course in &courses {
        responses.push(admin_course_response(&repo, course).await?);
    }

    let paginated = if let Some(params) = pagination {
        let effective_page = params.page.unwrap_or(1);
        let effective_limit = params.effective_limit().unwrap_or(PaginationParams::DEFAULT_LIMIT);
        PaginatedResponse::new(responses, effective_page, effective_limit, total)
    } else {
        PaginatedResponse::new(responses, 1, total, total)
    };

    Ok(Json(paginated))
}

#[rocket::get("/admin/search?<value>")]
pub async fn search_courses_admin(pool: &State<PgPool>, _staff: StaffUser, value: Option<String>) -> Result<Json<Vec<CourseAdminResponse>>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());

    let value = value.unwrap_or_default();
    let courses = if value.trim().is_empty() {
        repo.list_courses(None).await?.0
    } else {
        repo.search_courses(value.trim()).await?
    };

    let mut responses = Vec::with_capacity(courses.len());
    for course in &courses {
        responses.push(admin_course_response(&repo, course).await?);
    }

    Ok(Json(responses))
}

#[rocket::post("/admin", data = "<payload>")]
pub async fn create_course(pool: &State<PgPool>, _staff: StaffUser, payload: Json<CourseRequest>) -> Result<(Status, Json<CourseAdminResponse>), AppError> {
    payload.validate()?;

    let repo = PostgresRepository::new(pool.inner().clone());
    let course = repo.create_course(&payload).await?;
    let response = admin_course_response(&repo, &course).await?;

    Ok((Status::Created, Json(response)))
}

#[rocket::get("/admin/<id>")]
pub async fn get_course_admin(pool: &State<PgPool>, _staff: StaffUser, id: &str) -> Result<Json<CourseAdminResponse>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(id)?;
    let Some(course) = repo.get_course_by_id(&uuid).await? else {
        return Err(AppError::NotFound("Course not found".to_string()));
    };

    Ok(Json(admin_course_response(&repo, &course).await?))
}

#[rocket::put("/admin/<id>", data = "<payload>")]
pub async fn update_course(pool: &State<PgPool>, _staff: StaffUser, id: &str, payload: Json<CourseRequest>) -> Result<Json<CourseAdminResponse>, AppError> {
    payload.validate()?;

    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(id)?;
    let course = repo.update_course(&uuid, &payload).await?;

    Ok(Json(admin_course_response(&repo, &course).await?))
}

#[rocket::delete("/admin/<id>")]
pub async fn delete_course(pool: &State<PgPool>, _staff: StaffUser, id: &str) -> Result<Status, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(id)?;
    repo.delete_course(&uuid).await?;

    Ok(Status::NoContent)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        list_subscribed_courses,
        list_course_options,
        list_courses_admin,
        search_courses_admin,
        create_course,
        get_course_admin,
        update_course,
        delete_course
    ]
}
